//! Tracing bridge: records ambient `tracing` events into a [`Tracker`].
//!
//! Installing a [`TrackerLayer`] turns every event the subscriber sees
//! into a stored entry: `ERROR` events become error entries, everything
//! else becomes log entries, and the event's message and structured fields
//! become the payload. The call-site comes from the event's static
//! metadata, so no stack capture is involved on this path.

use std::fmt::Write as FmtWrite;

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::callsite::{CallSite, UNKNOWN_LOCATION};
use crate::entry::EntryKind;
use crate::sink::TARGET_PREFIX;
use crate::tracker::Tracker;

/// A tracing `Layer` that records events into a tracker.
///
/// Events this workspace emits itself (targets under [`TARGET_PREFIX`],
/// which includes the default sink's output) are skipped, so a tracker
/// wired with both the layer and the `TracingSink` does not feed back
/// into itself.
pub struct TrackerLayer {
    tracker: Tracker,
}

impl TrackerLayer {
    pub fn new(tracker: Tracker) -> Self {
        Self { tracker }
    }
}

impl<S> Layer<S> for TrackerLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();

        if metadata.target().starts_with(TARGET_PREFIX) {
            return;
        }

        let kind = if *metadata.level() == Level::ERROR {
            EntryKind::Error
        } else {
            EntryKind::Log
        };

        let mut visitor = EventVisitor::new();
        event.record(&mut visitor);
        let mut fields = visitor.fields;

        // Fold the enclosing span names into the fields, root first.
        if let Some(scope) = ctx.event_scope(event) {
            let spans: Vec<String> = scope
                .from_root()
                .map(|span| span.name().to_string())
                .collect();
            if !spans.is_empty() {
                fields.insert("span".to_string(), Value::String(spans.join(" > ")));
            }
        }

        let mut payload = Vec::new();
        if let Some(message) = visitor.message {
            payload.push(Value::String(message));
        }
        if !fields.is_empty() {
            payload.push(Value::Object(fields));
        }

        let location = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => CallSite::from_file_line(file, line).to_string(),
            _ => UNKNOWN_LOCATION.to_string(),
        };

        self.tracker.record_at(kind, payload, location);
    }

    fn on_new_span(&self, _attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        // Span lifecycle is not recorded; spans only show up as context on
        // the events inside them.
    }

    fn on_record(&self, _span: &Id, _values: &Record<'_>, _ctx: Context<'_, S>) {}

    fn on_close(&self, _id: Id, _ctx: Context<'_, S>) {}
}

/// Visitor that extracts the message and fields from a tracing event.
struct EventVisitor {
    message: Option<String>,
    fields: serde_json::Map<String, Value>,
}

impl EventVisitor {
    fn new() -> Self {
        Self {
            message: None,
            fields: serde_json::Map::new(),
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let name = field.name();
        let mut buf = String::new();
        let _ = write!(&mut buf, "{:?}", value);

        if name == "message" {
            self.message = Some(buf);
        } else {
            self.fields.insert(name.to_string(), Value::String(buf));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        let name = field.name();
        if name == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields
                .insert(name.to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.fields.insert(field.name().to_string(), Value::Number(n));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields
            .insert(field.name().to_string(), Value::String(value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use serde_json::json;
    use tracing_subscriber::prelude::*;

    fn bridged_tracker() -> (Tracker, impl tracing::Subscriber + Send + Sync + 'static) {
        let tracker = Tracker::builder().sink(MemorySink::new()).build();
        let subscriber = tracing_subscriber::registry().with(TrackerLayer::new(tracker.clone()));
        (tracker, subscriber)
    }

    #[test]
    fn test_layer_records_ambient_events() {
        let (tracker, subscriber) = bridged_tracker();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(peer = "abc", "connected");
            tracing::warn!("careful");
            tracing::error!("boom");
        });

        let logs = tracker.logs();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].kind, EntryKind::Log);
        assert_eq!(logs[0].payload[0], json!("connected"));
        assert_eq!(logs[0].payload[1], json!({"peer": "abc"}));
        assert_eq!(logs[1].kind, EntryKind::Log);
        assert_eq!(logs[2].kind, EntryKind::Error);
        assert_eq!(logs[2].payload, vec![json!("boom")]);
        // Metadata gives the file and line of the macro invocation.
        assert!(logs[0].location.starts_with("File: layer.rs Line: "));
    }

    #[test]
    fn test_layer_adds_span_context() {
        let (tracker, subscriber) = bridged_tracker();

        tracing::subscriber::with_default(subscriber, || {
            let outer = tracing::info_span!("outer");
            let _outer = outer.enter();
            let inner = tracing::info_span!("inner");
            let _inner = inner.enter();
            tracing::info!("inside");
        });

        let logs = tracker.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].payload[1], json!({"span": "outer > inner"}));
    }

    #[test]
    fn test_layer_ignores_tracker_own_output() {
        // Default sink emits tracing events; the layer must not feed them
        // back into the same tracker.
        let tracker = Tracker::new();
        let subscriber = tracing_subscriber::registry().with(TrackerLayer::new(tracker.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracker.log(vec![json!("direct")]);
        });

        let logs = tracker.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].payload, vec![json!("direct")]);
    }
}
