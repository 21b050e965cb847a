//! Mapping of [`BounceError`] to problem details

use mailroom_core::error_builder::{bad_request, internal_server_error};
use mailroom_core::problemdetails::Problem;
use mailroom_core::I18n;
use tracing::error;

use crate::errors::{db_message, BounceError};
use crate::validation::ValidationError;

/// Operation a server-side failure is reported against
#[derive(Debug, Clone, Copy)]
pub enum Action {
    Fetching,
    Creating,
    Deleting,
}

impl Action {
    fn verb(&self) -> &'static str {
        match self {
            Action::Fetching => "fetching",
            Action::Creating => "creating",
            Action::Deleting => "deleting",
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            Action::Fetching => "globals.messages.errorFetching",
            Action::Creating => "globals.messages.errorCreating",
            Action::Deleting => "globals.messages.errorDeleting",
        }
    }
}

pub fn to_problem(err: BounceError, i18n: &I18n, action: Action) -> Problem {
    match &err {
        BounceError::Database(db_err) => {
            error!("Error {} bounces: {}", action.verb(), db_err);
            internal_server_error()
                .detail(i18n.ts(
                    action.message_key(),
                    &[
                        ("name", "{globals.terms.bounce}"),
                        ("error", db_message(db_err).as_str()),
                    ],
                ))
                .build()
        }
        BounceError::Confirmation(reason) => {
            error!("Error confirming SNS subscription: {}", reason);
            internal_server_error()
                .detail(i18n.ts("bounces.errorConfirming", &[("error", reason.as_str())]))
                .code("SNS_CONFIRMATION_FAILED")
                .build()
        }
        BounceError::UnknownService(_) => bad_request()
            .detail(i18n.t("bounces.unknownService"))
            .code("UNKNOWN_SERVICE")
            .build(),
        BounceError::Shape { service, reason } => bad_request()
            .detail(i18n.ts(
                "bounces.invalidPayload",
                &[("name", *service), ("error", reason.as_str())],
            ))
            .code("INVALID_PAYLOAD")
            .build(),
        BounceError::Validation(kind) => {
            let (key, code) = match kind {
                ValidationError::MissingIdentity => ("globals.messages.invalidData", "INVALID_DATA"),
                ValidationError::InvalidEmail => ("globals.messages.invalidEmail", "INVALID_EMAIL"),
                ValidationError::InvalidUuid => ("globals.messages.invalidUUID", "INVALID_UUID"),
                ValidationError::InvalidSource => ("bounces.invalidSource", "INVALID_SOURCE"),
            };
            bad_request().detail(i18n.t(key)).code(code).build()
        }
        BounceError::InvalidId(raw) => {
            let detail = if raw.is_empty() {
                i18n.t("globals.messages.invalidID")
            } else {
                i18n.ts("globals.messages.invalidIDs", &[("error", raw.as_str())])
            };
            bad_request().detail(detail).code("INVALID_ID").build()
        }
        BounceError::InvalidSubscribeUrl(reason) => {
            tracing::warn!("Rejected SNS subscription URL: {}", reason);
            bad_request()
                .detail(i18n.t("bounces.invalidSubscribeURL"))
                .code("INVALID_SUBSCRIBE_URL")
                .build()
        }
    }
}
