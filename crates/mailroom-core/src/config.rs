//! Configuration management utilities

use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 50;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    // Required fields
    pub address: String,
    pub database_url: String,

    pub api_base_url: String,

    pub pagination: PaginationSettings,

    // PostgreSQL connection pool settings (all optional with defaults)
    pub postgres_max_connections: Option<u32>,
    pub postgres_min_connections: Option<u32>,
    pub postgres_connect_timeout_secs: Option<u64>,
    pub postgres_acquire_timeout_secs: Option<u64>,
    pub postgres_idle_timeout_secs: Option<u64>,
}

impl ServerConfig {
    /// Create a new configuration, reading pool tuning from `MAILROOM_POSTGRES_*`
    pub fn new(address: String, database_url: String) -> Self {
        ServerConfig {
            address,
            database_url,
            api_base_url: "/api".to_string(),
            pagination: PaginationSettings::default(),

            postgres_max_connections: env_parse("MAILROOM_POSTGRES_MAX_CONNECTIONS"),
            postgres_min_connections: env_parse("MAILROOM_POSTGRES_MIN_CONNECTIONS"),
            postgres_connect_timeout_secs: env_parse("MAILROOM_POSTGRES_CONNECT_TIMEOUT"),
            postgres_acquire_timeout_secs: env_parse("MAILROOM_POSTGRES_ACQUIRE_TIMEOUT"),
            postgres_idle_timeout_secs: env_parse("MAILROOM_POSTGRES_IDLE_TIMEOUT"),
        }
    }

    // PostgreSQL connection pool getters with defaults
    pub fn get_postgres_max_connections(&self) -> u32 {
        self.postgres_max_connections.unwrap_or(20)
    }

    pub fn get_postgres_min_connections(&self) -> u32 {
        self.postgres_min_connections.unwrap_or(2)
    }

    pub fn get_postgres_connect_timeout_secs(&self) -> u64 {
        self.postgres_connect_timeout_secs.unwrap_or(30)
    }

    pub fn get_postgres_acquire_timeout_secs(&self) -> u64 {
        self.postgres_acquire_timeout_secs.unwrap_or(30)
    }

    pub fn get_postgres_idle_timeout_secs(&self) -> u64 {
        self.postgres_idle_timeout_secs.unwrap_or(600)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Page size bounds applied to every paginated listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationSettings {
    pub default_per_page: u64,
    pub max_per_page: u64,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: MAX_PER_PAGE,
        }
    }
}

/// Resolved pagination window for a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub offset: u64,
    pub limit: u64,
}

impl Pagination {
    /// Resolve raw `page` / `per_page` query values.
    ///
    /// Values are taken leniently: anything that does not parse as a positive
    /// integer falls back to page 1 / the default page size, and `per_page` is
    /// clamped to the configured maximum. The offset never exceeds `i64::MAX`.
    pub fn from_params(
        page: Option<&str>,
        per_page: Option<&str>,
        settings: PaginationSettings,
    ) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p as u64)
            .unwrap_or(1);

        let per_page = per_page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| (p as u64).min(settings.max_per_page))
            .unwrap_or(settings.default_per_page);

        Self {
            page,
            per_page,
            // OFFSET is a signed bigint in SQL
            offset: (page - 1).saturating_mul(per_page).min(i64::MAX as u64),
            limit: per_page,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::from_params(None, None, PaginationSettings::default())
    }
}
