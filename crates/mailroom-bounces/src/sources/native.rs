use super::BounceSource;
use crate::errors::BounceError;
use crate::types::BounceInput;

/// The body is the bounce itself. A caller-supplied `source` label is kept;
/// otherwise the record is tagged `native`.
pub(super) fn normalize(body: &[u8]) -> Result<BounceInput, BounceError> {
    let mut input: BounceInput =
        serde_json::from_slice(body).map_err(|e| BounceError::shape("native", e))?;

    input.source = input.source.trim().to_string();
    if input.source.is_empty() {
        input.source = BounceSource::Native.as_str().to_string();
    }

    Ok(input)
}
