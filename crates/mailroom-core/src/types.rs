//! Shared type aliases

use chrono::{DateTime, Utc};

/// Database DateTime type used across all Mailroom crates
///
/// Maps to PostgreSQL `TIMESTAMPTZ` and serializes as RFC 3339 with a `Z`
/// suffix (`2025-10-12T12:15:47.609192Z`).
pub type DBDateTime = DateTime<Utc>;
