//! RFC 7807 problem documents
//!
//! Handlers return [`Problem`] as their error type; it renders as an
//! `application/problem+json` body. Members beyond the standard five
//! (`error_code`, `timestamp`, ...) are carried as flattened extensions.

use std::collections::BTreeMap;

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Problem document body
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "type": "https://mailroom.dev/probs/bad-request",
    "title": "Bad Request",
    "detail": "Invalid ID",
    "instance": "/error/bad-request",
    "error_code": "INVALID_ID",
    "timestamp": "2025-10-20T08:00:00+00:00"
}))]
pub struct ProblemDetails {
    /// URI identifying the problem type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Localized explanation of this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(flatten)]
    #[schema(additional_properties = true)]
    pub extensions: BTreeMap<String, Value>,
}

impl ProblemDetails {
    fn is_empty(&self) -> bool {
        self.type_url.is_none()
            && self.title.is_none()
            && self.detail.is_none()
            && self.instance.is_none()
            && self.extensions.is_empty()
    }
}

/// An HTTP error response: a status plus its problem document
#[derive(Debug, Clone)]
pub struct Problem {
    pub status_code: StatusCode,
    pub document: ProblemDetails,
}

impl Problem {
    pub fn new(status_code: impl Into<StatusCode>) -> Self {
        Self {
            status_code: status_code.into(),
            document: ProblemDetails::default(),
        }
    }

    pub fn with_type(mut self, value: impl Into<String>) -> Self {
        self.document.type_url = Some(value.into());
        self
    }

    pub fn with_title(mut self, value: impl Into<String>) -> Self {
        self.document.title = Some(value.into());
        self
    }

    pub fn with_detail(mut self, value: impl Into<String>) -> Self {
        self.document.detail = Some(value.into());
        self
    }

    pub fn with_instance(mut self, value: impl Into<String>) -> Self {
        self.document.instance = Some(value.into());
        self
    }

    /// Add an extension member. Standard member names are reserved.
    pub fn with_extension(mut self, key: &str, value: impl Into<Value>) -> Self {
        if !matches!(key, "type" | "title" | "detail" | "instance") {
            self.document.extensions.insert(key.to_owned(), value.into());
        }
        self
    }

    pub fn detail(&self) -> Option<&str> {
        self.document.detail.as_deref()
    }

    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.document.extensions.get(key)
    }

    /// The document as it is sent on the wire
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.document).unwrap_or(Value::Null)
    }
}

impl From<StatusCode> for Problem {
    fn from(status_code: StatusCode) -> Self {
        Problem::new(status_code)
    }
}

/// Result type where the error is always a `Problem`.
pub type Result<T> = std::result::Result<T, Problem>;

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        if self.document.is_empty() {
            return self.status_code.into_response();
        }

        let mut response = (self.status_code, Json(self.document)).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}
