//! Optional process-scoped tracker.
//!
//! Explicit construction and injection is the primary style. This module
//! is the opt-in ambient instance for hosts that want one tracker shared
//! across call sites without threading a handle through every layer.
//! Installation happens at most once per process.

use std::sync::OnceLock;

use crate::error::{Result, TrackError};
use crate::tracker::Tracker;

static TRACKER: OnceLock<Tracker> = OnceLock::new();

/// Install `tracker` as the process-scoped instance.
///
/// Call this early, before anything touches [`tracker()`]: a default
/// instance installed by a first [`tracker()`] call also counts as
/// initialized.
pub fn init(tracker: Tracker) -> Result<()> {
    TRACKER
        .set(tracker)
        .map_err(|_| TrackError::AlreadyInitialized)
}

/// The process-scoped tracker, if one has been installed.
pub fn try_tracker() -> Option<Tracker> {
    TRACKER.get().cloned()
}

/// The process-scoped tracker, installing a default-wired instance on
/// first use.
pub fn tracker() -> Tracker {
    TRACKER.get_or_init(Tracker::new).clone()
}
