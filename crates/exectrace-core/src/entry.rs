//! Log entry types for the execution tracker.
//!
//! Each entry is a self-contained record: a sequential id, a severity kind,
//! the caller-supplied payload values, the inferred call-site, and a
//! creation timestamp. Entries are immutable once recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder payload for values that cannot be represented as JSON.
///
/// Payload conversion must never fail the recording call, so inputs that
/// `serde_json` rejects (e.g. maps with non-string keys) degrade to this
/// opaque marker instead of an error.
pub const OPAQUE_VALUE: &str = "<unserializable value>";

/// Severity of a recorded entry.
///
/// `group` headers are emitted on the diagnostic sink but are not stored,
/// so there is no `Group` variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Ordinary informational record (`Tracker::log`)
    Log,
    /// Error-level record (`Tracker::err`)
    Error,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Log => write!(f, "log"),
            EntryKind::Error => write!(f, "error"),
        }
    }
}

/// A single recorded log entry.
///
/// Entries are handed out by value from [`Tracker::logs`](crate::Tracker::logs)
/// as defensive copies: mutating a returned entry or the returned list never
/// affects tracker state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Positive sequential id, assigned from the tracker counter.
    ///
    /// Strictly increasing in creation order; gaps appear where `group`
    /// consumed an id without storing an entry.
    pub id: u64,

    /// Severity kind: `log` or `error`
    pub kind: EntryKind,

    /// Caller-supplied values, preserved in call order
    pub payload: Vec<Value>,

    /// Inferred call-site, or the `"unknown location"` sentinel
    pub location: String,

    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Create a new entry stamped with the current time.
    pub fn new(id: u64, kind: EntryKind, payload: Vec<Value>, location: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            payload,
            location: location.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Convert an arbitrary serializable value into a payload element.
///
/// This is the conversion the [`track!`](crate::track) family of macros
/// applies to each argument. It cannot fail: values `serde_json` cannot
/// represent become the [`OPAQUE_VALUE`] marker string.
pub fn payload_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|_| Value::String(OPAQUE_VALUE.to_string()))
}

/// Render a payload the way a console would.
///
/// String values print bare (no quotes), everything else as compact JSON,
/// separated by single spaces. Rendering never fails; an empty payload
/// renders as an empty string.
pub fn format_payload(payload: &[Value]) -> String {
    payload
        .iter()
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
