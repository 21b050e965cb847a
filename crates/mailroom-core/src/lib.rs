//! Core utilities and types shared across all Mailroom crates

pub mod config;
pub mod error;
pub mod error_builder;
pub mod i18n;
pub mod plugin;
pub mod problemdetails;
pub use problemdetails::ProblemDetails;
pub mod types;

// Re-export commonly used types
pub use config::*;
pub use error::*;
pub use error_builder::*;
pub use i18n::I18n;
pub use types::*;

// Re-export external dependencies
pub use anyhow;
pub use chrono;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tracing;
