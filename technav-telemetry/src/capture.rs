//! A tracing layer that keeps events in memory.
//!
//! Install it for the current thread with `set_default`, run the code under
//! test, then inspect [`SharedEventLog::events`].
//!
//! ```rust,ignore
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let log = SharedEventLog::new();
//! let _guard = tracing_subscriber::registry().with(EventCaptureLayer::new(log.clone())).set_default();
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// One recorded event.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CapturedEvent {
    /// `ERROR`, `WARN`, `INFO`, `DEBUG` or `TRACE`.
    pub level: String,
    /// Module path of the emitting code.
    pub target: String,
    /// The event message, empty when none was given.
    pub message: String,
    /// Structured fields other than the message.
    pub fields: HashMap<String, serde_json::Value>,
    /// Name of the innermost span the event was emitted in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

impl CapturedEvent {
    /// The string value of `field`, if recorded.
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }
}

/// Cloneable handle to the recorded events.
#[derive(Debug, Clone, Default)]
pub struct SharedEventLog {
    events: Arc<RwLock<Vec<CapturedEvent>>>,
}

impl SharedEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far, oldest first.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.read().map(|events| events.clone()).unwrap_or_default()
    }

    /// Events whose level matches `level` (case-insensitive).
    pub fn at_level(&self, level: &str) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|e| e.level.eq_ignore_ascii_case(level)).collect()
    }

    /// First event whose message contains `needle`.
    pub fn find(&self, needle: &str) -> Option<CapturedEvent> {
        self.events().into_iter().find(|e| e.message.contains(needle))
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }

    fn push(&self, event: CapturedEvent) {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
        }
    }
}

/// Records every event it sees into a [`SharedEventLog`].
pub struct EventCaptureLayer {
    log: SharedEventLog,
}

impl EventCaptureLayer {
    pub fn new(log: SharedEventLog) -> Self {
        Self { log }
    }
}

impl<S> Layer<S> for EventCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        let mut fields = visitor.0;

        let message = match fields.remove("message") {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let metadata = event.metadata();

        self.log.push(CapturedEvent {
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message,
            fields,
            span: ctx.event_span(event).map(|span| span.name().to_string()),
        });
    }
}

#[derive(Default)]
struct JsonVisitor(HashMap<String, serde_json::Value>);

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }
}

#[cfg(test)]
mod tests {
    use tracing::{info_span, warn};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    use super::*;

    #[test]
    fn captures_message_fields_and_span() {
        let log = SharedEventLog::new();
        let _guard =
            tracing_subscriber::registry().with(EventCaptureLayer::new(log.clone())).set_default();

        let span = info_span!("search");
        {
            let _entered = span.enter();
            warn!(owner = "u1", result_count = 0u64, retryable = false, "no relevant documents");
        }
        tracing::info!("outside");

        let events = log.events();
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.level, "WARN");
        assert_eq!(first.message, "no relevant documents");
        assert_eq!(first.field_str("owner"), Some("u1"));
        assert_eq!(first.fields.get("result_count"), Some(&serde_json::json!(0)));
        assert_eq!(first.fields.get("retryable"), Some(&serde_json::json!(false)));
        assert_eq!(first.span.as_deref(), Some("search"));

        assert_eq!(events[1].span, None);
        assert_eq!(log.at_level("warn").len(), 1);
        assert!(log.find("outside").is_some());

        log.clear();
        assert!(log.events().is_empty());
    }
}
