//! Bounces plugin implementation

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::Router;
use mailroom_core::plugin::{MailroomPlugin, PluginContext, PluginError, ServiceRegistrationContext};
use mailroom_core::{I18n, ServerConfig};
use sea_orm::DatabaseConnection;
use tracing::debug;
use utoipa::openapi::OpenApi;
use utoipa::OpenApi as OpenApiTrait;

use crate::confirm::{ReqwestSnsConfirmer, SnsConfirmer};
use crate::handlers::{configure_routes, AppState, BouncesApiDoc};
use crate::recorder::{BounceRecorder, LoggingRecorder};
use crate::services::BounceService;
use crate::store::SeaOrmBounceStore;

/// Bounce webhooks, listing and deletion.
///
/// Requires a `DatabaseConnection`. `I18n`, `ServerConfig`, a
/// `dyn BounceRecorder` and a `dyn SnsConfirmer` are picked up when
/// registered by an earlier plugin.
#[derive(Default)]
pub struct BouncesPlugin;

impl BouncesPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl MailroomPlugin for BouncesPlugin {
    fn name(&self) -> &'static str {
        "bounces"
    }

    fn register_services<'a>(
        &'a self,
        context: &'a ServiceRegistrationContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send + 'a>> {
        Box::pin(async move {
            let db = context.require_service::<DatabaseConnection>()?;
            let i18n = context
                .get_service::<I18n>()
                .unwrap_or_else(|| Arc::new(I18n::default()));
            let pagination = context
                .get_service::<ServerConfig>()
                .map(|config| config.pagination)
                .unwrap_or_default();

            let recorder: Arc<dyn BounceRecorder> = context
                .get_service::<dyn BounceRecorder>()
                .unwrap_or_else(|| Arc::new(LoggingRecorder));
            let confirmer: Arc<dyn SnsConfirmer> = match context.get_service::<dyn SnsConfirmer>() {
                Some(confirmer) => confirmer,
                None => Arc::new(ReqwestSnsConfirmer::new().map_err(|e| {
                    PluginError::PluginRegistrationFailed {
                        plugin_name: self.name().to_string(),
                        error: format!("failed to build SNS HTTP client: {}", e),
                    }
                })?),
            };

            let store = Arc::new(SeaOrmBounceStore::new(db));
            let bounce_service = Arc::new(BounceService::new(
                store, recorder, confirmer, pagination,
            ));

            context.register_service(bounce_service.clone());
            context.register_service(Arc::new(AppState {
                bounce_service,
                i18n,
            }));

            debug!("Bounces plugin services registered successfully");
            Ok(())
        })
    }

    fn configure_routes(&self, context: &PluginContext) -> Result<Option<Router>, PluginError> {
        let state = context.require_service::<AppState>()?;
        Ok(Some(configure_routes().with_state(state)))
    }

    fn openapi_schema(&self) -> Option<OpenApi> {
        Some(<BouncesApiDoc as OpenApiTrait>::openapi())
    }
}
