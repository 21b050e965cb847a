//! Identity checks applied to every bounce before it is stored

use chrono::Utc;
use mailroom_core::DBDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{BounceInput, NewBounce};

// WHATWG "valid email address" grammar
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex is valid")
});

// Column widths of the bounces table
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_SOURCE_LEN: usize = 50;

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid regex is valid")
});

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("either email or subscriber_uuid is required")]
    MissingIdentity,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid subscriber UUID")]
    InvalidUuid,

    #[error("source label is longer than {MAX_SOURCE_LEN} characters")]
    InvalidSource,
}

pub fn is_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_REGEX.is_match(email)
}

pub fn is_uuid(uuid: &str) -> bool {
    UUID_REGEX.is_match(uuid)
}

/// Check identity fields. The first failing rule wins.
pub fn validate(input: &BounceInput) -> Result<(), ValidationError> {
    if input.email.is_empty() && input.subscriber_uuid.is_empty() {
        return Err(ValidationError::MissingIdentity);
    }

    if !input.email.is_empty() && !is_email(&input.email) {
        return Err(ValidationError::InvalidEmail);
    }

    if !input.subscriber_uuid.is_empty() && !is_uuid(&input.subscriber_uuid) {
        return Err(ValidationError::InvalidUuid);
    }

    if input.source.chars().count() > MAX_SOURCE_LEN {
        return Err(ValidationError::InvalidSource);
    }

    Ok(())
}

/// Fill defaults on an input that already passed [`validate`].
pub fn normalize(input: BounceInput, now: DBDateTime) -> NewBounce {
    let meta = match input.meta {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(meta) => meta,
    };

    NewBounce {
        subscriber_uuid: input.subscriber_uuid,
        email: input.email.to_lowercase(),
        campaign_id: input.campaign_id,
        source: input.source,
        meta,
        created_at: input.created_at.unwrap_or(now),
    }
}

/// Validate then normalize, stamping unset timestamps with the current time
pub fn accept(input: BounceInput) -> Result<NewBounce, ValidationError> {
    validate(&input)?;
    Ok(normalize(input, Utc::now()))
}
