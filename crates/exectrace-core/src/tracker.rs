//! The tracker: ordered in-memory recording of execution events.
//!
//! A [`Tracker`] is a cheaply cloneable handle over shared state. All
//! recording operations are synchronous, infallible and safe to call from
//! any thread. Counter, entry list and group depth live under a single
//! lock so ids and insertion order stay consistent under parallel use.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::callsite::{self, BacktraceResolver, CallSiteResolver, DEFAULT_SKIP_MARKERS};
use crate::entry::{EntryKind, LogEntry};
use crate::sink::{DiagnosticSink, TracingSink};

#[derive(Debug, Default)]
struct TrackerState {
    counter: u64,
    entries: Vec<LogEntry>,
    group_depth: usize,
}

struct Inner {
    state: Mutex<TrackerState>,
    sink: Arc<dyn DiagnosticSink>,
    resolver: Arc<dyn CallSiteResolver>,
    skip_markers: Vec<String>,
}

/// Records structured log entries with sequential ids and inferred
/// call-sites.
///
/// Construct one with [`Tracker::new`] for the default wiring (backtrace
/// resolver, `tracing` sink) or through [`Tracker::builder`] to inject
/// either. Clones share state.
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<Inner>,
}

impl Tracker {
    /// Tracker with the default resolver and sink.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TrackerBuilder {
        TrackerBuilder::new()
    }

    /// Record a `log` entry. Consumes the next id, stores the entry and
    /// mirrors it on the sink at info level.
    pub fn log(&self, payload: Vec<Value>) {
        self.record(EntryKind::Log, payload);
    }

    /// Record an `error` entry. Same as [`log`](Self::log) on the error
    /// channel.
    pub fn err(&self, payload: Vec<Value>) {
        self.record(EntryKind::Error, payload);
    }

    /// Open a group: consumes the next id, raises the open-group depth and
    /// emits a group header on the sink, but stores no entry. The id gap
    /// this leaves in the stored list is deliberate.
    pub fn group(&self, label: &str, payload: Vec<Value>) {
        let location = self.infer_location();
        let id = {
            let mut state = self.inner.state.lock();
            state.counter += 1;
            state.group_depth += 1;
            state.counter
        };
        self.inner.sink.group_open(id, &location, label, &payload);
    }

    /// Close the innermost open group. With no group open this is a no-op:
    /// nothing is emitted and the depth stays at zero.
    pub fn group_end(&self) {
        let closed = {
            let mut state = self.inner.state.lock();
            if state.group_depth == 0 {
                false
            } else {
                state.group_depth -= 1;
                true
            }
        };
        if closed {
            self.inner.sink.group_close();
        }
    }

    /// Restart id numbering: the next recorded operation gets id 1. Stored
    /// entries keep the ids they were assigned, so the strictly-increasing
    /// id guarantee holds only between resets.
    pub fn reset(&self) {
        self.inner.state.lock().counter = 0;
    }

    /// Snapshot of the stored entries in insertion (id) order. The
    /// returned vector is a copy; mutating it does not touch the tracker.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.inner.state.lock().entries.clone()
    }

    /// Drop all stored entries. The id counter is untouched, so later
    /// entries continue numbering where they left off.
    pub fn clear_logs(&self) {
        self.inner.state.lock().entries.clear();
    }

    /// Emit the caller's inferred location on the sink without recording
    /// anything. Answers "what would the inference report from here"
    /// while leaving counter and list alone.
    pub fn show_location(&self) {
        let location = self.infer_location();
        self.inner.sink.note(&location);
    }

    fn record(&self, kind: EntryKind, payload: Vec<Value>) {
        // Capture frames before taking the lock.
        let location = self.infer_location();
        self.record_at(kind, payload, location);
    }

    /// Record with a pre-computed location. Used by the tracing bridge,
    /// where event metadata already carries the call-site.
    pub(crate) fn record_at(&self, kind: EntryKind, payload: Vec<Value>, location: String) {
        // Emit on the sink only after the lock is released: the sink may
        // itself record.
        let entry = {
            let mut state = self.inner.state.lock();
            state.counter += 1;
            let entry = LogEntry::new(state.counter, kind, payload, location);
            state.entries.push(entry.clone());
            entry
        };
        self.inner
            .sink
            .record(entry.kind, entry.id, &entry.location, &entry.payload);
    }

    fn infer_location(&self) -> String {
        callsite::resolve_call_site(self.inner.resolver.as_ref(), &self.inner.skip_markers)
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Tracker")
            .field("counter", &state.counter)
            .field("entries", &state.entries.len())
            .field("group_depth", &state.group_depth)
            .finish()
    }
}

/// Configures and builds a [`Tracker`].
pub struct TrackerBuilder {
    sink: Option<Arc<dyn DiagnosticSink>>,
    resolver: Option<Arc<dyn CallSiteResolver>>,
    skip_markers: Vec<String>,
}

impl TrackerBuilder {
    fn new() -> Self {
        Self {
            sink: None,
            resolver: None,
            skip_markers: DEFAULT_SKIP_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Replace the default [`TracingSink`].
    pub fn sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Replace the default [`BacktraceResolver`].
    pub fn resolver(mut self, resolver: impl CallSiteResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Add a substring that disqualifies stack frames from call-site
    /// inference, on top of the defaults. Useful when the tracker is
    /// wrapped by host-side helper functions that should not show up as
    /// locations.
    pub fn skip_marker(mut self, marker: impl Into<String>) -> Self {
        self.skip_markers.push(marker.into());
        self
    }

    pub fn build(self) -> Tracker {
        Tracker {
            inner: Arc::new(Inner {
                state: Mutex::new(TrackerState::default()),
                sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
                resolver: self.resolver.unwrap_or_else(|| Arc::new(BacktraceResolver)),
                skip_markers: self.skip_markers,
            }),
        }
    }
}
