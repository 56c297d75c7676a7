//! Incremental rendering of tracker snapshots.

use std::io::Write;

use chrono::{DateTime, Utc};
use exectrace_core::{format_payload, LogEntry, Tracker};

/// Tracks how far into the entry list rendering has progressed.
pub(crate) struct Renderer {
    cursor: usize,
    last_seen: Option<(u64, DateTime<Utc>)>,
    show_timestamps: bool,
}

impl Renderer {
    pub(crate) fn new(show_timestamps: bool) -> Self {
        Self {
            cursor: 0,
            last_seen: None,
            show_timestamps,
        }
    }

    /// Render every entry past the cursor and advance it. Write errors
    /// are swallowed; a broken target must not take the polling task
    /// down.
    pub(crate) fn render_new(&mut self, tracker: &Tracker, target: &mut dyn Write) {
        let entries = tracker.logs();
        self.realign(&entries);

        for entry in &entries[self.cursor..] {
            let _ = writeln!(target, "{}", self.format_entry(entry));
        }
        let _ = target.flush();

        self.cursor = entries.len();
        self.last_seen = entries.last().map(fingerprint);
    }

    // The cursor is positional so that a reset (which restarts ids) does
    // not hide entries. When the entry rendered last is no longer at the
    // remembered position, the list was cleared between polls; rewind and
    // render the survivors afresh.
    fn realign(&mut self, entries: &[LogEntry]) {
        if self.cursor == 0 {
            return;
        }
        if entries.get(self.cursor - 1).map(fingerprint) != self.last_seen {
            self.cursor = 0;
        }
    }

    fn format_entry(&self, entry: &LogEntry) -> String {
        let mut line = String::new();
        if self.show_timestamps {
            line.push_str(&entry.timestamp.format("%H:%M:%S%.3f ").to_string());
        }
        line.push_str(&format!("#{} [{}]", entry.id, entry.kind));
        if !entry.payload.is_empty() {
            line.push(' ');
            line.push_str(&format_payload(&entry.payload));
        }
        line.push_str(&format!(" ({})", entry.location));
        line
    }
}

fn fingerprint(entry: &LogEntry) -> (u64, DateTime<Utc>) {
    (entry.id, entry.timestamp)
}
