//! Inbound webhook payload and the fields extracted from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NO_VERB: &str = "No verb provided";
pub const NO_KIND: &str = "No kind provided";
pub const NO_NAME: &str = "No name provided";
pub const NO_NAMESPACE: &str = "No namespace provided";
pub const NO_OPERATION: &str = "No operation provided";
pub const NO_MANAGED_FIELDS: &str = "No managedFields provided";

/// Report envelope as posted by the scanning operator's webhook.
///
/// `operatorObject` is kept as raw JSON: it is echoed back in the
/// acknowledgment and uploaded verbatim as the report body. `verb` is
/// echoed as sent, whatever its JSON type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEnvelope {
    #[serde(default = "default_verb")]
    pub verb: Value,
    pub operator_object: Value,
}

fn default_verb() -> Value {
    Value::String(NO_VERB.to_string())
}

/// The fields of an envelope that drive reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSubject {
    pub verb: Value,
    /// Resource kind; doubles as the engagement name.
    pub kind: String,
    /// Resource instance name, possibly carrying generated suffixes.
    pub name: String,
    pub namespace: String,
    /// Operation of the first `managedFields` entry, or a sentinel.
    pub operation: String,
}

impl ReportEnvelope {
    /// Extract the subject. Absent fields take their sentinel; fields that
    /// are present are used as sent, even when empty.
    pub fn subject(&self) -> ReportSubject {
        let object = &self.operator_object;
        let metadata = object.get("metadata");

        let operation = match object.get("managedFields").and_then(Value::as_array) {
            Some(fields) if !fields.is_empty() => field(fields[0].get("operation"), NO_OPERATION),
            _ => NO_MANAGED_FIELDS.to_string(),
        };

        ReportSubject {
            verb: self.verb.clone(),
            kind: field(object.get("kind"), NO_KIND),
            name: field(metadata.and_then(|m| m.get("name")), NO_NAME),
            namespace: field(metadata.and_then(|m| m.get("namespace")), NO_NAMESPACE),
            operation,
        }
    }
}

fn field(value: Option<&Value>, sentinel: &str) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or(sentinel)
        .to_string()
}
