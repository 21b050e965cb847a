//! Bounce webhook handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use mailroom_core::problemdetails::Problem;
use tracing::{debug, warn};

use super::problems::{to_problem, Action};
use super::types::{AckResponse, AppState};
use crate::services::IngestOutcome;
use crate::types::BounceInput;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhooks/bounce", post(native_webhook))
        .route("/webhooks/bounce/{service}", post(service_webhook))
}

async fn ingest(state: &AppState, service: &str, body: Bytes) -> Result<impl IntoResponse, Problem> {
    let outcome = state
        .bounce_service
        .ingest(service, &body)
        .await
        .map_err(|e| {
            if e.is_client_error() {
                warn!("Rejected bounce webhook for {:?}: {}", service, e);
            }
            to_problem(e, &state.i18n, Action::Creating)
        })?;

    match outcome {
        IngestOutcome::Stored(count) => debug!("Stored {} bounces", count),
        IngestOutcome::SubscriptionConfirmed => debug!("SNS subscription confirmed"),
    }

    Ok(Json(AckResponse::ok()))
}

/// Native bounce postback
#[utoipa::path(
    tag = "Bounce Webhooks",
    post,
    path = "/webhooks/bounce",
    request_body = BounceInput,
    responses(
        (status = 200, description = "Bounce accepted", body = AckResponse),
        (status = 400, description = "Malformed payload, missing identity, or invalid email/UUID"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn native_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, Problem> {
    ingest(&state, "", body).await
}

/// Provider bounce webhook (`ses` or `sendgrid`)
#[utoipa::path(
    tag = "Bounce Webhooks",
    post,
    path = "/webhooks/bounce/{service}",
    params(("service" = String, Path, description = "Provider: `ses` or `sendgrid`")),
    request_body(content = Object, description = "Provider payload: an SNS envelope for SES, an event array for SendGrid"),
    responses(
        (status = 200, description = "Payload accepted", body = AckResponse),
        (status = 400, description = "Unknown service or malformed payload"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn service_webhook(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, Problem> {
    ingest(&state, &service, body).await
}
