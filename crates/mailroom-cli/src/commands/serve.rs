use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::Args;
use mailroom_bounces::BouncesPlugin;
use mailroom_core::plugin::PluginManager;
use mailroom_core::{I18n, ServerConfig};
use mailroom_database::DbConnection;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use utoipa_swagger_ui::SwaggerUi;

#[derive(Args)]
pub struct ServeCommand {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1:9000", env = "MAILROOM_ADDRESS")]
    pub address: String,

    /// Database connection URL
    #[arg(long, env = "MAILROOM_DATABASE_URL")]
    pub database_url: String,

    /// JSON language file overriding the built-in English messages
    #[arg(long, env = "MAILROOM_I18N_FILE")]
    pub i18n_file: Option<PathBuf>,
}

impl ServeCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run())
    }

    async fn run(self) -> anyhow::Result<()> {
        let config = Arc::new(ServerConfig::new(
            self.address.clone(),
            self.database_url.clone(),
        ));
        let i18n = Arc::new(load_i18n(self.i18n_file.as_deref())?);

        debug!("Initializing database connection...");
        let db = mailroom_database::establish_connection(&config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

        let app = build_application(db, config.clone(), i18n).await?;

        let listener = TcpListener::bind(&config.address).await?;
        info!("Mailroom API listening on {}", config.address);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Mailroom API server exited");
        Ok(())
    }
}

fn load_i18n(path: Option<&std::path::Path>) -> anyhow::Result<I18n> {
    let Some(path) = path else {
        return Ok(I18n::english());
    };

    let json = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read language file {}: {}", path.display(), e))?;
    let i18n = I18n::from_json(&json)
        .map_err(|e| anyhow::anyhow!("Invalid language file {}: {}", path.display(), e))?;
    info!("Loaded language file {}", path.display());
    Ok(i18n)
}

/// Register core services, initialize plugins and assemble the router
pub async fn build_application(
    db: Arc<DbConnection>,
    config: Arc<ServerConfig>,
    i18n: Arc<I18n>,
) -> anyhow::Result<Router> {
    let mut plugin_manager = PluginManager::new();

    let service_context = plugin_manager.service_context();
    service_context.register_service(db);
    service_context.register_service(config);
    service_context.register_service(i18n);

    debug!("Registering BouncesPlugin");
    plugin_manager.register_plugin(Box::new(BouncesPlugin::new()));

    plugin_manager
        .initialize_plugins()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize plugins: {}", e))?;

    let api_doc = plugin_manager.get_unified_openapi();
    let app = plugin_manager
        .build_application()
        .map_err(|e| anyhow::anyhow!("Failed to build application: {}", e))?
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc))
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
