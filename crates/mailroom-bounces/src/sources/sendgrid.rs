//! SendGrid event webhook
//!
//! SendGrid posts a JSON array of events. Only delivery failures and spam
//! reports become bounces; opens, clicks and the rest are skipped. Events are
//! read field by field so an odd value in one field never rejects the batch.

use chrono::{TimeZone, Utc};
use serde_json::Value;

use super::BounceSource;
use crate::errors::BounceError;
use crate::types::BounceInput;

const SERVICE: &str = "sendgrid";

const BOUNCE_EVENTS: [&str; 3] = ["bounce", "dropped", "spamreport"];

pub(super) fn normalize(body: &[u8]) -> Result<Vec<BounceInput>, BounceError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| BounceError::shape(SERVICE, e))?;
    let Value::Array(events) = value else {
        return Err(BounceError::shape(SERVICE, "expected an array of events"));
    };

    Ok(events.into_iter().filter_map(event_to_bounce).collect())
}

fn event_to_bounce(event: Value) -> Option<BounceInput> {
    let kind = event.get("event").and_then(Value::as_str)?;
    if !BOUNCE_EVENTS.contains(&kind) {
        return None;
    }

    let email = str_field(&event, "email").unwrap_or_default().to_string();
    let subscriber_uuid = str_field(&event, "subscriber_uuid")
        .unwrap_or_default()
        .to_string();
    let campaign_id = event.get("campaign_id").and_then(int_field);
    let created_at = event
        .get("timestamp")
        .and_then(Value::as_i64)
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

    Some(BounceInput {
        subscriber_uuid,
        email,
        campaign_id,
        source: BounceSource::Sendgrid.as_str().to_string(),
        meta: Some(event),
        created_at,
    })
}

fn str_field<'a>(event: &'a Value, key: &str) -> Option<&'a str> {
    event.get(key).and_then(Value::as_str).map(str::trim)
}

/// Custom args arrive as strings unless the sender typed them
fn int_field(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
