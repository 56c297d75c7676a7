//! Execution Tracker Core Library
//!
//! In-process recording of structured log entries with sequential ids and
//! best-effort call-site inference.
//!
//! ## Overview
//!
//! A [`Tracker`] records `log`/`error` entries into an ordered in-memory
//! list. Each entry carries a sequential id, the caller-supplied payload,
//! an inferred source location and a timestamp. Console-style groups
//! consume ids without storing entries. A polling viewer (the
//! `exectrace-panel` crate) renders the list on a fixed interval.
//!
//! ## Core Principles
//!
//! - **Infallible recording**: recording never fails and never panics.
//!   Payloads that cannot be serialized degrade to a marker value,
//!   call-site inference degrades to a sentinel.
//! - **Explicit construction**: trackers are built and passed around;
//!   [`global`] is the opt-in ambient instance.
//! - **Pluggable seams**: stack capture ([`CallSiteResolver`]) and
//!   diagnostic output ([`DiagnosticSink`]) are traits.
//!
//! ## Quick Start
//!
//! ```ignore
//! use exectrace_core::{track, Tracker};
//!
//! let tracker = Tracker::new();
//! track!(tracker, "peer connected", 42);
//! tracker.group("handshake", vec![]);
//! track!(tracker, "hello sent");
//! tracker.group_end();
//!
//! for entry in tracker.logs() {
//!     println!("#{} [{}] {}", entry.id, entry.kind, entry.location);
//! }
//! ```

pub mod callsite;
pub mod entry;
pub mod error;
pub mod global;
pub mod layer;
pub mod sink;
pub mod tracker;

// Re-exports
pub use callsite::{
    BacktraceResolver, CallSite, CallSiteResolver, DEFAULT_SKIP_MARKERS, UNKNOWN_LOCATION,
};
pub use entry::{format_payload, payload_value, EntryKind, LogEntry, OPAQUE_VALUE};
pub use error::{Result, TrackError};
pub use layer::TrackerLayer;
pub use sink::{DiagnosticSink, MemorySink, TracingSink, TARGET_PREFIX, TRACING_TARGET};
pub use tracker::{Tracker, TrackerBuilder};

/// Record a `log` entry on a tracker, serializing each argument into the
/// payload.
///
/// Arguments only need to implement `serde::Serialize`; values that fail
/// to serialize degrade to [`OPAQUE_VALUE`] instead of erroring. No
/// payload arguments is legal and records an entry with an empty payload.
///
/// ```ignore
/// track!(tracker);
/// track!(tracker, "ready", 7, state);
/// ```
#[macro_export]
macro_rules! track {
    ($tracker:expr) => {
        $tracker.log(::std::vec::Vec::new())
    };
    ($tracker:expr, $($value:expr),+ $(,)?) => {
        $tracker.log(::std::vec::Vec::from([
            $($crate::payload_value(&$value)),+
        ]))
    };
}

/// Record an `error` entry on a tracker. Same shape as [`track!`].
#[macro_export]
macro_rules! track_err {
    ($tracker:expr) => {
        $tracker.err(::std::vec::Vec::new())
    };
    ($tracker:expr, $($value:expr),+ $(,)?) => {
        $tracker.err(::std::vec::Vec::from([
            $($crate::payload_value(&$value)),+
        ]))
    };
}

/// Open a group on a tracker with a label and optional payload values.
/// Close it with [`Tracker::group_end`].
#[macro_export]
macro_rules! track_group {
    ($tracker:expr, $label:expr) => {
        $tracker.group($label, ::std::vec::Vec::new())
    };
    ($tracker:expr, $label:expr, $($value:expr),+ $(,)?) => {
        $tracker.group($label, ::std::vec::Vec::from([
            $($crate::payload_value(&$value)),+
        ]))
    };
}
