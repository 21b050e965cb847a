//! HTTP handlers for the bounce service

mod bounces;
mod problems;
mod types;
mod webhooks;

pub use types::{AckResponse, AppState, BouncesResponse, ListBouncesQuery};

use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;

/// Configure bounce routes
pub fn configure_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(bounces::routes())
        .merge(webhooks::routes())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        bounces::list_bounces,
        bounces::get_bounce,
        bounces::list_campaign_bounces,
        bounces::delete_bounces,
        bounces::delete_bounce,
        webhooks::native_webhook,
        webhooks::service_webhook,
    ),
    components(
        schemas(
            crate::types::Bounce,
            crate::types::BounceInput,
            crate::types::BounceListing,
            crate::types::BounceResults,
            types::BouncesResponse,
            types::AckResponse,
            types::ListBouncesQuery,
        )
    ),
    tags(
        (name = "Bounces", description = "Bounce listing and deletion"),
        (name = "Bounce Webhooks", description = "Bounce ingestion from native postbacks, SES and SendGrid")
    )
)]
pub struct BouncesApiDoc;
