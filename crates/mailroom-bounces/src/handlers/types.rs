//! Handler types for the bounce service

use std::sync::Arc;

use mailroom_core::I18n;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::services::BounceService;
use crate::types::BounceListing;

/// Application state for bounce handlers
pub struct AppState {
    pub bounce_service: Arc<BounceService>,
    pub i18n: Arc<I18n>,
}

/// Listing parameters. Values are parsed leniently: bad numbers fall back
/// to defaults and unknown sort keys to `created_at desc`.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBouncesQuery {
    #[schema(example = "1")]
    pub page: Option<String>,
    #[schema(example = "20")]
    pub per_page: Option<String>,
    #[schema(example = "ses")]
    pub source: Option<String>,
    /// One of `created_at`, `email`, `campaign_id`, `source`, `id`
    #[schema(example = "created_at")]
    pub order_by: Option<String>,
    /// `asc` or `desc`
    #[schema(example = "desc")]
    pub order: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BouncesResponse {
    pub data: BounceListing,
}

/// Acknowledgement returned by webhooks and deletes
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AckResponse {
    #[schema(example = true)]
    pub data: bool,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self { data: true }
    }
}
