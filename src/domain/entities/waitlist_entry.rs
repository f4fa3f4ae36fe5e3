use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The sole persisted entity: one waitlist signup.
///
/// Stored as JSON under a hash-named key so no PII appears in storage keys.
/// Unknown fields written by older or newer versions of the intake path are
/// preserved through `extra` so exports never lose columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub company: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl WaitlistEntry {
    /// Flattens the entry into the field map the CSV serializer consumes,
    /// wire-format (camelCase) names included.
    pub fn into_row(self) -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("fullName".to_string(), Value::String(self.full_name));
        row.insert("email".to_string(), Value::String(self.email));
        row.insert("company".to_string(), Value::String(self.company));
        row.insert("timestamp".to_string(), Value::String(self.timestamp));
        for (key, value) in self.extra {
            row.insert(key, value);
        }
        row
    }
}

/// Secondary record keyed by normalized email. Its existence is the
/// duplicate-signup check; its payload points back at the primary entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMarker {
    pub entry_key: String,
    pub timestamp: String,
}
