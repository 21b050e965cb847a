//! Test utilities for database integration tests
//!
//! A single PostgreSQL container is started on first use and shared by every
//! test in the run. Each `TestDatabase` gets its own connection and starts
//! from empty tables.

use crate::DbConnection;
use mailroom_migrations::Migrator;
use sea_orm::*;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use std::time::Duration;
use testcontainers::{runners::AsyncRunner, ContainerAsync, GenericImage, ImageExt};
use tokio::sync::{Mutex, OnceCell};

static TEST_CONTAINER: OnceCell<Arc<SharedContainer>> = OnceCell::const_new();

/// Serializes first-time migration across concurrently starting tests
static MIGRATION_LOCK: OnceCell<Arc<Mutex<()>>> = OnceCell::const_new();

struct SharedContainer {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    database_url: String,
}

impl SharedContainer {
    async fn new() -> anyhow::Result<Self> {
        let db_name = "test_db";
        let username = "test_user";
        let password = "test_password";

        let container = GenericImage::new("postgres", "17-alpine")
            .with_env_var("POSTGRES_DB", db_name)
            .with_env_var("POSTGRES_USER", username)
            .with_env_var("POSTGRES_PASSWORD", password)
            .with_env_var("POSTGRES_HOST_AUTH_METHOD", "trust")
            .start()
            .await?;

        let port = container.get_host_port_ipv4(5432).await?;
        let database_url = format!(
            "postgresql://{}:{}@localhost:{}/{}",
            username, password, port, db_name
        );

        tokio::time::sleep(Duration::from_secs(3)).await;

        Ok(Self {
            container,
            database_url,
        })
    }
}

/// Test database backed by the shared PostgreSQL container
pub struct TestDatabase {
    pub db: Arc<DbConnection>,
    pub database_url: String,
}

impl TestDatabase {
    /// Connect to the shared container (or `MAILROOM_TEST_DATABASE_URL`
    /// when set) and truncate all tables
    pub async fn new() -> anyhow::Result<Self> {
        let database_url = match std::env::var("MAILROOM_TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                let shared = TEST_CONTAINER
                    .get_or_try_init(|| async { SharedContainer::new().await.map(Arc::new) })
                    .await?;
                shared.database_url.clone()
            }
        };

        let db = Self::connect_with_retry(&database_url, 20).await?;

        let test_db = TestDatabase {
            db: Arc::new(db),
            database_url,
        };

        test_db
            .test_connection()
            .await
            .map_err(|e| anyhow::anyhow!("Initial connection test failed: {}", e))?;

        // Tables may not exist yet
        test_db.cleanup_all_tables().await.ok();

        Ok(test_db)
    }

    /// Create a test database with the Mailroom schema applied
    pub async fn with_migrations() -> anyhow::Result<Self> {
        let test_db = Self::new().await?;

        let lock = MIGRATION_LOCK
            .get_or_init(|| async { Arc::new(Mutex::new(())) })
            .await;
        let _guard = lock.lock().await;

        Migrator::up(&*test_db.db, None)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

        test_db.cleanup_all_tables().await?;

        Ok(test_db)
    }

    async fn connect_with_retry(
        database_url: &str,
        max_retries: u32,
    ) -> anyhow::Result<DbConnection> {
        let mut opt = ConnectOptions::new(database_url.to_owned());
        opt.max_connections(5)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let mut retries = max_retries;
        loop {
            match Database::connect(opt.clone()).await {
                Ok(db) => return Ok(db),
                Err(e) if retries > 0 => {
                    tracing::debug!(
                        "Failed to connect to database (retries left: {}): {}",
                        retries,
                        e
                    );
                    retries -= 1;
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                Err(e) => {
                    return Err(anyhow::anyhow!(
                        "Failed to connect to database after {} retries: {}",
                        max_retries,
                        e
                    ))
                }
            }
        }
    }

    /// Execute raw SQL
    pub async fn execute_sql(&self, sql: &str) -> anyhow::Result<ExecResult> {
        let statement = Statement::from_string(DatabaseBackend::Postgres, sql.to_owned());
        Ok(self.db.execute(statement).await?)
    }

    /// Query raw SQL and return results
    pub async fn query_sql(&self, sql: &str) -> anyhow::Result<Vec<QueryResult>> {
        let statement = Statement::from_string(DatabaseBackend::Postgres, sql.to_owned());
        Ok(self.db.query_all(statement).await?)
    }

    /// Truncate every table except the migration bookkeeping table
    pub async fn cleanup_all_tables(&self) -> anyhow::Result<()> {
        let tables = self
            .query_sql(
                "SELECT tablename FROM pg_tables
             WHERE schemaname = 'public'
             AND tablename NOT IN ('seaql_migrations')",
            )
            .await?;

        for table in tables {
            if let Ok(table_name) = table.try_get::<String>("", "tablename") {
                self.execute_sql(&format!(
                    "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
                    table_name
                ))
                .await?;
            }
        }

        Ok(())
    }

    pub async fn test_connection(&self) -> anyhow::Result<()> {
        let statement = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1".to_owned());
        if self.db.query_one(statement).await?.is_none() {
            return Err(anyhow::anyhow!("Connection test failed"));
        }
        Ok(())
    }

    pub fn connection_arc(&self) -> Arc<DbConnection> {
        Arc::clone(&self.db)
    }
}
