use clap::{Args, Subcommand};
use mailroom_core::ServerConfig;
use mailroom_migrations::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing::info;

#[derive(Args)]
pub struct MigrateCommand {
    /// Database connection URL
    #[arg(long, env = "MAILROOM_DATABASE_URL")]
    pub database_url: String,

    #[command(subcommand)]
    pub action: Option<MigrateAction>,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrateAction {
    /// Apply all pending migrations (default)
    Up,
    /// Roll back the most recent migration
    Down,
    /// List migrations that have not been applied
    Status,
}

impl MigrateCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.run())
    }

    async fn run(self) -> anyhow::Result<()> {
        let config = ServerConfig::new(String::new(), self.database_url.clone());
        let db = Database::connect(mailroom_database::connect_options(&config)).await?;

        match self.action.unwrap_or(MigrateAction::Up) {
            MigrateAction::Up => {
                Migrator::up(&db, None).await?;
                info!("Migrations applied");
            }
            MigrateAction::Down => {
                Migrator::down(&db, Some(1)).await?;
                info!("Rolled back one migration");
            }
            MigrateAction::Status => {
                let pending = Migrator::get_pending_migrations(&db).await?;
                if pending.is_empty() {
                    info!("Database schema is up to date");
                }
                for migration in pending {
                    info!("Pending: {}", migration.name());
                }
            }
        }

        db.close().await?;
        Ok(())
    }
}
