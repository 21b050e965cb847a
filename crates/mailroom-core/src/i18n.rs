//! Localized user-facing messages
//!
//! Messages are looked up by dotted key. `{param}` placeholders are replaced
//! by [`I18n::ts`]; a parameter value written as `{some.key}` is itself
//! translated first, so `("name", "{globals.terms.bounce}")` renders the
//! localized term instead of the literal key.

use std::collections::HashMap;

const ENGLISH: &[(&str, &str)] = &[
    ("globals.terms.bounce", "Bounce"),
    ("globals.terms.bounces", "Bounces"),
    ("globals.messages.invalidID", "Invalid ID"),
    ("globals.messages.invalidIDs", "One or more IDs are invalid: {error}"),
    ("globals.messages.invalidData", "Invalid data"),
    ("globals.messages.invalidEmail", "Invalid email"),
    ("globals.messages.invalidUUID", "Invalid UUID"),
    ("globals.messages.errorFetching", "Error fetching {name}: {error}"),
    ("globals.messages.errorCreating", "Error creating {name}: {error}"),
    ("globals.messages.errorDeleting", "Error deleting {name}: {error}"),
    ("bounces.unknownService", "Unknown service."),
    ("bounces.invalidSource", "Invalid source"),
    ("bounces.invalidPayload", "Invalid {name} payload: {error}"),
    ("bounces.invalidSubscribeURL", "Invalid SNS subscription URL"),
    ("bounces.errorConfirming", "Error confirming SNS subscription: {error}"),
];

#[derive(Debug, Clone)]
pub struct I18n {
    messages: HashMap<String, String>,
}

impl Default for I18n {
    fn default() -> Self {
        Self::english()
    }
}

impl I18n {
    /// The built-in English catalog
    pub fn english() -> Self {
        Self {
            messages: ENGLISH
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Load a JSON language file (`{"key": "message", ...}`) on top of the
    /// English catalog. Keys missing from the file keep their English text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let overrides: HashMap<String, String> = serde_json::from_str(json)?;
        let mut i18n = Self::english();
        i18n.messages.extend(overrides);
        Ok(i18n)
    }

    /// Translate a key. Unknown keys are returned as-is.
    pub fn t(&self, key: &str) -> String {
        self.messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Translate a key and substitute `{param}` placeholders.
    pub fn ts(&self, key: &str, params: &[(&str, &str)]) -> String {
        let mut out = self.t(key);
        for (name, value) in params {
            let value = match value.strip_prefix('{').and_then(|v| v.strip_suffix('}')) {
                Some(nested) => self.t(nested),
                None => value.to_string(),
            };
            out = out.replace(&format!("{{{}}}", name), &value);
        }
        out
    }
}
