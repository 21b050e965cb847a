//! Bounce record shapes

use mailroom_core::DBDateTime;
use mailroom_entities::bounces;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A bounce as produced by a source normalizer, before validation.
///
/// This is also the body of a native postback, so every field is optional on
/// the wire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(default)]
pub struct BounceInput {
    #[serde(deserialize_with = "null_as_empty")]
    #[schema(example = "e5d1a7e8-0b48-4a6c-9d0e-53f8b3fbbd43")]
    pub subscriber_uuid: String,
    #[serde(deserialize_with = "null_as_empty")]
    #[schema(example = "user@example.com")]
    pub email: String,
    pub campaign_id: Option<i32>,
    #[serde(deserialize_with = "null_as_empty")]
    #[schema(example = "api")]
    pub source: String,
    #[schema(value_type = Option<Object>)]
    pub meta: Option<Value>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub created_at: Option<DBDateTime>,
}

// An explicit `null` reads the same as a missing key
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A validated bounce ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewBounce {
    pub subscriber_uuid: String,
    pub email: String,
    pub campaign_id: Option<i32>,
    pub source: String,
    pub meta: Value,
    pub created_at: DBDateTime,
}

/// A stored bounce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Bounce {
    pub id: i64,
    pub subscriber_uuid: String,
    pub email: String,
    pub campaign_id: Option<i32>,
    pub source: String,
    #[schema(value_type = Object)]
    pub meta: Value,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DBDateTime,
}

impl From<bounces::Model> for Bounce {
    fn from(model: bounces::Model) -> Self {
        Self {
            id: model.id,
            subscriber_uuid: model.subscriber_uuid,
            email: model.email,
            campaign_id: model.campaign_id,
            source: model.source,
            meta: model.meta,
            created_at: model.created_at,
        }
    }
}

/// List query row: a bounce plus the window count of all matching rows
#[derive(Debug, Clone, FromQueryResult)]
pub struct BounceRow {
    pub id: i64,
    pub subscriber_uuid: String,
    pub email: String,
    pub campaign_id: Option<i32>,
    pub source: String,
    pub meta: Value,
    pub created_at: DBDateTime,
    pub total: i64,
}

impl From<BounceRow> for Bounce {
    fn from(row: BounceRow) -> Self {
        Self {
            id: row.id,
            subscriber_uuid: row.subscriber_uuid,
            email: row.email,
            campaign_id: row.campaign_id,
            source: row.source,
            meta: row.meta,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum BounceResults {
    One(Bounce),
    Many(Vec<Bounce>),
}

/// Result of a list or single-record read.
///
/// Single reads carry no pagination metadata; a missing single record is
/// reported as an empty list with a zero total.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BounceListing {
    pub results: BounceResults,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
}

impl BounceListing {
    pub fn single(bounce: Bounce) -> Self {
        Self {
            results: BounceResults::One(bounce),
            total: None,
            per_page: None,
            page: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            results: BounceResults::Many(Vec::new()),
            total: Some(0),
            per_page: None,
            page: None,
        }
    }
}
