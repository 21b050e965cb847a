//! Provider payload normalizers
//!
//! The webhook path segment selects a [`BounceSource`]; each variant turns
//! its provider's body into zero or more [`BounceInput`]s.

mod native;
mod sendgrid;
mod ses;

use crate::errors::BounceError;
use crate::types::BounceInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BounceSource {
    Native,
    Ses,
    Sendgrid,
}

/// What a provider body turned out to contain
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Bounces(Vec<BounceInput>),
    /// SNS handshake that must be confirmed before notifications flow
    SubscriptionConfirmation { subscribe_url: String },
}

impl BounceSource {
    /// Resolve the webhook path segment. The native postback has no segment.
    pub fn from_discriminator(service: &str) -> Result<Self, BounceError> {
        match service {
            "" => Ok(BounceSource::Native),
            "ses" => Ok(BounceSource::Ses),
            "sendgrid" => Ok(BounceSource::Sendgrid),
            other => Err(BounceError::UnknownService(other.to_string())),
        }
    }

    /// Value stored in the `source` column
    pub fn as_str(&self) -> &'static str {
        match self {
            BounceSource::Native => "native",
            BounceSource::Ses => "ses",
            BounceSource::Sendgrid => "sendgrid",
        }
    }

    pub fn normalize(&self, body: &[u8]) -> Result<Normalized, BounceError> {
        match self {
            BounceSource::Native => native::normalize(body).map(|b| Normalized::Bounces(vec![b])),
            BounceSource::Ses => ses::normalize(body),
            BounceSource::Sendgrid => sendgrid::normalize(body).map(Normalized::Bounces),
        }
    }
}

impl std::fmt::Display for BounceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
