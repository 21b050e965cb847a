//! Error types for the bounce service

use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum BounceError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Unknown bounce service: {0}")]
    UnknownService(String),

    #[error("Invalid {service} payload: {reason}")]
    Shape {
        service: &'static str,
        reason: String,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid ID: {0}")]
    InvalidId(String),

    #[error("Invalid SNS subscription URL: {0}")]
    InvalidSubscribeUrl(String),

    #[error("SNS confirmation failed: {0}")]
    Confirmation(String),
}

impl BounceError {
    pub(crate) fn shape(service: &'static str, reason: impl ToString) -> Self {
        BounceError::Shape {
            service,
            reason: reason.to_string(),
        }
    }

    /// Whether the caller is at fault (400) rather than the server (500)
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            BounceError::Database(_) | BounceError::Confirmation(_)
        )
    }
}

/// Short diagnostic for a storage failure.
///
/// PostgreSQL errors are reduced to the server's message (no SQL, no
/// connection details); anything else falls back to the error's display.
pub fn db_message(err: &DbErr) -> String {
    let runtime = match err {
        DbErr::Query(e) | DbErr::Exec(e) | DbErr::Conn(e) => e,
        other => return other.to_string(),
    };

    match runtime {
        RuntimeErr::SqlxError(sea_orm::sqlx::Error::Database(e)) => e.message().to_string(),
        RuntimeErr::SqlxError(e) => e.to_string(),
        RuntimeErr::Internal(msg) => msg.clone(),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_and_server_kinds() {
        assert!(BounceError::UnknownService("mailgun".into()).is_client_error());
        assert!(BounceError::InvalidId("0".into()).is_client_error());
        assert!(BounceError::Validation(ValidationError::InvalidEmail).is_client_error());
        assert!(!BounceError::Database(DbErr::Custom("boom".into())).is_client_error());
        assert!(!BounceError::Confirmation("timeout".into()).is_client_error());
    }

    #[test]
    fn test_db_message_unwraps_internal_runtime_error() {
        let err = DbErr::Query(RuntimeErr::Internal("relation \"bounces\" does not exist".into()));
        assert_eq!(db_message(&err), "relation \"bounces\" does not exist");
    }
}
