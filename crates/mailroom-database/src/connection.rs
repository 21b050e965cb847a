//! Database connection management

use mailroom_core::{ServerConfig, ServiceError, ServiceResult};
use mailroom_migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub type DbConnection = DatabaseConnection;

/// Pool options derived from the `MAILROOM_POSTGRES_*` settings
pub fn connect_options(config: &ServerConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(config.get_postgres_max_connections())
        .min_connections(config.get_postgres_min_connections())
        .connect_timeout(Duration::from_secs(config.get_postgres_connect_timeout_secs()))
        .acquire_timeout(Duration::from_secs(config.get_postgres_acquire_timeout_secs()))
        .idle_timeout(Duration::from_secs(config.get_postgres_idle_timeout_secs()))
        .sqlx_logging(false);
    opt
}

pub async fn establish_connection(config: &ServerConfig) -> ServiceResult<Arc<DbConnection>> {
    let db = Database::connect(connect_options(config))
        .await
        .map_err(|e| ServiceError::Database(e.to_string()))?;

    Migrator::up(&db, None)
        .await
        .map_err(|e| ServiceError::Migration(e.to_string()))?;

    info!(
        "Database ready (max_connections={})",
        config.get_postgres_max_connections()
    );

    Ok(Arc::new(db))
}
