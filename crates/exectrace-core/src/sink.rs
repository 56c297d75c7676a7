//! Diagnostic output channel.
//!
//! Every recording operation mirrors a human-readable line onto a
//! [`DiagnosticSink`] in addition to storing the entry. The default sink
//! routes to `tracing`, so whatever subscriber the host installs decides
//! formatting and destination. Sinks must swallow their own failures:
//! recording is infallible from the caller's point of view.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::entry::{format_payload, EntryKind};

/// Prefix shared by every tracing target this workspace emits on.
///
/// [`TrackerLayer`](crate::TrackerLayer) skips events under it, so a
/// tracker wired with both the layer and the [`TracingSink`] never
/// re-records its own diagnostics.
pub const TARGET_PREFIX: &str = "exectrace::";

/// Target used for the tracker's own tracing events.
pub const TRACING_TARGET: &str = "exectrace::tracker";

/// Where the tracker's diagnostic lines go.
///
/// Implementations are called outside the tracker's state lock and may
/// therefore call back into the tracker, though entries recorded from
/// inside a sink observe their own ordering.
pub trait DiagnosticSink: Send + Sync {
    /// A log or error entry was recorded.
    fn record(&self, kind: EntryKind, id: u64, location: &str, payload: &[Value]);

    /// A group was opened. Groups consume an id but store no entry.
    fn group_open(&self, id: u64, location: &str, label: &str, payload: &[Value]);

    /// The innermost open group was closed.
    fn group_close(&self);

    /// Free-form diagnostic line, used by location reporting.
    fn note(&self, message: &str);
}

/// Default sink: leveled `tracing` events under [`TRACING_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, kind: EntryKind, id: u64, location: &str, payload: &[Value]) {
        let message = format_payload(payload);
        match kind {
            EntryKind::Log => {
                tracing::info!(target: TRACING_TARGET, id, location, "{}", message);
            }
            EntryKind::Error => {
                tracing::error!(target: TRACING_TARGET, id, location, "{}", message);
            }
        }
    }

    fn group_open(&self, id: u64, location: &str, label: &str, payload: &[Value]) {
        tracing::info!(
            target: TRACING_TARGET,
            id,
            location,
            label,
            "{}",
            format_payload(payload)
        );
    }

    fn group_close(&self) {
        tracing::info!(target: TRACING_TARGET, "group closed");
    }

    fn note(&self, message: &str) {
        tracing::info!(target: TRACING_TARGET, "{}", message);
    }
}

/// Sink that keeps formatted lines in memory.
///
/// Cloning shares the underlying buffer. Used by tests to observe sink
/// traffic and by embedders that want to show tracker output somewhere a
/// subscriber cannot reach.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines emitted so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    fn push(&self, line: String) {
        self.lines.lock().push(line);
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, kind: EntryKind, id: u64, location: &str, payload: &[Value]) {
        let mut line = format!("#{} [{}]", id, kind);
        if !payload.is_empty() {
            line.push(' ');
            line.push_str(&format_payload(payload));
        }
        line.push_str(&format!(" ({})", location));
        self.push(line);
    }

    fn group_open(&self, id: u64, location: &str, label: &str, payload: &[Value]) {
        let mut line = format!("#{} [group] {}", id, label);
        if !payload.is_empty() {
            line.push(' ');
            line.push_str(&format_payload(payload));
        }
        line.push_str(&format!(" ({})", location));
        self.push(line);
    }

    fn group_close(&self) {
        self.push("[group end]".to_string());
    }

    fn note(&self, message: &str) {
        self.push(message.to_string());
    }
}
