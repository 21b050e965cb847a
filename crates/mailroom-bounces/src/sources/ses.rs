//! Amazon SES notifications
//!
//! SES publishes to SNS, which wraps the SES event as a JSON string in the
//! envelope's `Message`. With raw message delivery enabled the SES event is
//! posted unwrapped; both forms are accepted.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{BounceSource, Normalized};
use crate::errors::BounceError;
use crate::types::BounceInput;

const SERVICE: &str = "ses";

/// Sent-mail headers carrying our identifiers back with the notification
pub const SUBSCRIBER_HEADER: &str = "X-Mailroom-Subscriber";
pub const CAMPAIGN_HEADER: &str = "X-Mailroom-Campaign";

#[derive(Debug, Deserialize)]
struct SnsEnvelope {
    #[serde(rename = "Type", default)]
    kind: String,
    #[serde(rename = "Message")]
    message: Option<String>,
    #[serde(rename = "SubscribeURL")]
    subscribe_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SesMessage {
    #[serde(alias = "eventType")]
    notification_type: String,
    bounce: Option<SesEvent>,
    complaint: Option<SesEvent>,
    mail: SesMail,
}

/// Shared shape of the `bounce` and `complaint` objects
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SesEvent {
    #[serde(alias = "complainedRecipients")]
    bounced_recipients: Vec<SesRecipient>,
    timestamp: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SesRecipient {
    email_address: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SesMail {
    headers: Vec<SesHeader>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SesHeader {
    name: String,
    value: String,
}

impl SesMail {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.trim())
            .filter(|v| !v.is_empty())
    }
}

pub(super) fn normalize(body: &[u8]) -> Result<Normalized, BounceError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| BounceError::shape(SERVICE, e))?;

    let is_raw_event = value.get("notificationType").is_some() || value.get("eventType").is_some();
    if is_raw_event {
        return message_to_bounces(value).map(Normalized::Bounces);
    }

    let envelope: SnsEnvelope =
        serde_json::from_value(value).map_err(|e| BounceError::shape(SERVICE, e))?;

    match envelope.kind.as_str() {
        "SubscriptionConfirmation" => {
            let subscribe_url = envelope
                .subscribe_url
                .filter(|u| !u.is_empty())
                .ok_or_else(|| BounceError::shape(SERVICE, "missing SubscribeURL"))?;
            Ok(Normalized::SubscriptionConfirmation { subscribe_url })
        }
        "Notification" => {
            let message = envelope
                .message
                .ok_or_else(|| BounceError::shape(SERVICE, "missing Message"))?;
            let message: Value =
                serde_json::from_str(&message).map_err(|e| BounceError::shape(SERVICE, e))?;
            message_to_bounces(message).map(Normalized::Bounces)
        }
        // UnsubscribeConfirmation and anything else SNS may add
        _ => Ok(Normalized::Bounces(Vec::new())),
    }
}

fn message_to_bounces(raw: Value) -> Result<Vec<BounceInput>, BounceError> {
    let message: SesMessage =
        serde_json::from_value(raw.clone()).map_err(|e| BounceError::shape(SERVICE, e))?;

    let event = match message.notification_type.as_str() {
        "Bounce" => message.bounce.as_ref(),
        "Complaint" => message.complaint.as_ref(),
        _ => None,
    };
    let Some(event) = event else {
        return Ok(Vec::new());
    };

    let subscriber_uuid = message
        .mail
        .header(SUBSCRIBER_HEADER)
        .unwrap_or_default()
        .to_string();
    let campaign_id = message
        .mail
        .header(CAMPAIGN_HEADER)
        .and_then(|v| v.parse::<i32>().ok());
    let created_at = DateTime::parse_from_rfc3339(&event.timestamp)
        .ok()
        .map(|t| t.with_timezone(&Utc));

    Ok(event
        .bounced_recipients
        .iter()
        .map(|recipient| BounceInput {
            subscriber_uuid: subscriber_uuid.clone(),
            email: recipient.email_address.trim().to_string(),
            campaign_id,
            source: BounceSource::Ses.as_str().to_string(),
            meta: Some(raw.clone()),
            created_at,
        })
        .collect())
}
