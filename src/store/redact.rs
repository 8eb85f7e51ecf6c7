//! Structural redaction of payloads
//!
//! One walk over the three JSON shapes (object, array, scalar). A sensitive
//! key is replaced wherever it appears as an object key, at any depth and
//! inside arrays; nothing else changes.

use std::collections::BTreeSet;

use serde_json::Value;

use super::config::StoreConfig;

/// Replaces the values of sensitive keys with a fixed marker.
#[derive(Debug, Clone)]
pub struct Redactor {
    fields: BTreeSet<String>,
    marker: Value,
}

impl Redactor {
    pub fn new<I, S>(fields: I, marker: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            marker: Value::String(marker.into()),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.sensitive_fields.iter().cloned(), config.redaction_marker.clone())
    }

    /// Returns `value` with every sensitive field replaced.
    pub fn redact(&self, mut value: Value) -> Value {
        self.redact_in_place(&mut value);
        value
    }

    /// Redacts in place and returns how many values were replaced.
    pub fn redact_in_place(&self, value: &mut Value) -> usize {
        match value {
            Value::Object(map) => {
                let mut replaced = 0;
                for (key, child) in map.iter_mut() {
                    if self.fields.contains(key) {
                        *child = self.marker.clone();
                        replaced += 1;
                    } else {
                        replaced += self.redact_in_place(child);
                    }
                }
                replaced
            }
            Value::Array(items) => items.iter_mut().map(|item| self.redact_in_place(item)).sum(),
            _ => 0,
        }
    }

    /// Whether `key` is redacted.
    pub fn is_sensitive(&self, key: &str) -> bool {
        self.fields.contains(key)
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}
