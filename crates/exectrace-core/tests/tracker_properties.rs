//! Property-based tests for tracker recording
//!
//! Uses proptest to verify the id/ordering invariants under arbitrary
//! operation sequences, including clear and reset interleavings.

use exectrace_core::{CallSiteResolver, EntryKind, MemorySink, Tracker};
use proptest::prelude::*;
use serde_json::Value;

// ============================================================================
// Strategy Generators
// ============================================================================

/// Generate a single JSON payload value
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z0-9 ]{0,12}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

/// Generate a short payload (0-3 values)
fn payload_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(value_strategy(), 0..4)
}

/// Operations that can be performed on a tracker
#[derive(Debug, Clone)]
enum TrackOp {
    Log(Vec<Value>),
    Err(Vec<Value>),
    Group(String),
    GroupEnd,
    Clear,
    Reset,
}

/// Generate any operation, including clear and reset
fn op_strategy() -> impl Strategy<Value = TrackOp> {
    prop_oneof![
        4 => payload_strategy().prop_map(TrackOp::Log),
        2 => payload_strategy().prop_map(TrackOp::Err),
        1 => "[a-z]{1,8}".prop_map(TrackOp::Group),
        1 => Just(TrackOp::GroupEnd),
        1 => Just(TrackOp::Clear),
        1 => Just(TrackOp::Reset),
    ]
}

/// Generate operations that never reset the counter
fn op_without_reset_strategy() -> impl Strategy<Value = TrackOp> {
    prop_oneof![
        4 => payload_strategy().prop_map(TrackOp::Log),
        2 => payload_strategy().prop_map(TrackOp::Err),
        1 => "[a-z]{1,8}".prop_map(TrackOp::Group),
        1 => Just(TrackOp::GroupEnd),
        1 => Just(TrackOp::Clear),
    ]
}

fn op_sequence_strategy(max_ops: usize) -> impl Strategy<Value = Vec<TrackOp>> {
    prop::collection::vec(op_strategy(), 0..max_ops)
}

fn no_reset_sequence_strategy(max_ops: usize) -> impl Strategy<Value = Vec<TrackOp>> {
    prop::collection::vec(op_without_reset_strategy(), 0..max_ops)
}

// ============================================================================
// Sequential Model
// ============================================================================

/// Resolver with a fixed stack so locations are deterministic
struct CannedResolver;

const EXPECTED_LOCATION: &str = "File: suite.rs Line: 2:2";

impl CallSiteResolver for CannedResolver {
    fn capture_frames(&self) -> Vec<String> {
        vec![
            "at capture (capture.rs:1:1)".to_string(),
            "at suite::run (src/suite.rs:2:2)".to_string(),
        ]
    }
}

fn tracked() -> (Tracker, MemorySink) {
    let sink = MemorySink::new();
    let tracker = Tracker::builder()
        .sink(sink.clone())
        .resolver(CannedResolver)
        .build();
    (tracker, sink)
}

/// Reference implementation of the counter/list/depth rules
#[derive(Default)]
struct SequentialModel {
    counter: u64,
    entries: Vec<(u64, EntryKind, Vec<Value>)>,
    depth: usize,
}

impl SequentialModel {
    fn apply(&mut self, op: &TrackOp) {
        match op {
            TrackOp::Log(payload) => {
                self.counter += 1;
                self.entries
                    .push((self.counter, EntryKind::Log, payload.clone()));
            }
            TrackOp::Err(payload) => {
                self.counter += 1;
                self.entries
                    .push((self.counter, EntryKind::Error, payload.clone()));
            }
            TrackOp::Group(_) => {
                self.counter += 1;
                self.depth += 1;
            }
            TrackOp::GroupEnd => {
                self.depth = self.depth.saturating_sub(1);
            }
            TrackOp::Clear => self.entries.clear(),
            TrackOp::Reset => self.counter = 0,
        }
    }
}

fn run_op(tracker: &Tracker, op: &TrackOp) {
    match op {
        TrackOp::Log(payload) => tracker.log(payload.clone()),
        TrackOp::Err(payload) => tracker.err(payload.clone()),
        TrackOp::Group(label) => tracker.group(label, vec![]),
        TrackOp::GroupEnd => tracker.group_end(),
        TrackOp::Clear => tracker.clear_logs(),
        TrackOp::Reset => tracker.reset(),
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Any operation sequence leaves the tracker in the state the
    /// sequential model predicts
    #[test]
    fn tracker_matches_sequential_model(ops in op_sequence_strategy(40)) {
        let (tracker, _sink) = tracked();
        let mut model = SequentialModel::default();

        for op in &ops {
            run_op(&tracker, op);
            model.apply(op);
        }

        let observed: Vec<(u64, EntryKind, Vec<Value>)> = tracker
            .logs()
            .into_iter()
            .map(|e| (e.id, e.kind, e.payload))
            .collect();
        prop_assert_eq!(observed, model.entries);

        for entry in tracker.logs() {
            prop_assert_eq!(entry.location, EXPECTED_LOCATION);
        }
    }

    /// Without reset, stored ids strictly increase regardless of groups
    /// and clears
    #[test]
    fn ids_strictly_increase_without_reset(ops in no_reset_sequence_strategy(40)) {
        let (tracker, _sink) = tracked();
        for op in &ops {
            run_op(&tracker, op);
        }

        let ids: Vec<u64> = tracker.logs().iter().map(|e| e.id).collect();
        prop_assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    /// Group closes never outnumber group opens, whatever order group_end
    /// arrives in
    #[test]
    fn group_closes_never_outnumber_opens(ops in op_sequence_strategy(40)) {
        let (tracker, sink) = tracked();
        for op in &ops {
            run_op(&tracker, op);
        }

        let lines = sink.lines();
        let opens = lines.iter().filter(|l| l.contains("[group]")).count();
        let closes = lines.iter().filter(|l| *l == "[group end]").count();
        prop_assert!(closes <= opens);
    }

    /// Clearing never rewinds numbering: the next id after a clear is one
    /// past the number of operations recorded so far
    #[test]
    fn cleared_tracker_continues_numbering(
        payloads in prop::collection::vec(payload_strategy(), 1..8)
    ) {
        let (tracker, _sink) = tracked();
        for payload in &payloads {
            tracker.log(payload.clone());
        }
        tracker.clear_logs();
        tracker.log(vec![]);

        let logs = tracker.logs();
        prop_assert_eq!(logs.len(), 1);
        prop_assert_eq!(logs[0].id, payloads.len() as u64 + 1);
    }
}
