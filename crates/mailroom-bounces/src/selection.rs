//! Deletion targets and request id parsing

use crate::errors::BounceError;

/// Which bounces a delete removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BounceSelection {
    All,
    Ids(Vec<i64>),
}

/// Parse a path id; it must be a positive integer
pub fn parse_id(raw: &str) -> Result<i64, BounceError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(BounceError::InvalidId(raw.to_string())),
    }
}

/// Parse repeated `id` query values. Every value must be a positive integer.
pub fn parse_ids<S: AsRef<str>>(raw: &[S]) -> Result<Vec<i64>, BounceError> {
    raw.iter().map(|s| parse_id(s.as_ref())).collect()
}

/// Boolean query flag: `1`, `t`, `T`, `TRUE`, `true` and `True` are true,
/// anything else (including garbage) is false.
pub fn parse_flag(raw: Option<&str>) -> bool {
    matches!(raw, Some("1" | "t" | "T" | "TRUE" | "true" | "True"))
}

/// Resolve the target of a delete request.
///
/// A path id wins; otherwise, unless `all` is set, the repeated `id` query
/// values are used and must not be empty.
pub fn resolve(
    path_id: Option<&str>,
    query_ids: &[String],
    all: Option<&str>,
) -> Result<BounceSelection, BounceError> {
    if let Some(raw) = path_id {
        return Ok(BounceSelection::Ids(vec![parse_id(raw)?]));
    }

    if parse_flag(all) {
        return Ok(BounceSelection::All);
    }

    let ids = parse_ids(query_ids)?;
    if ids.is_empty() {
        return Err(BounceError::InvalidId(String::new()));
    }
    Ok(BounceSelection::Ids(ids))
}
