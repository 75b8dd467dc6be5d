//! In-memory capture of log events for tests
//!
//! Only events carrying the canonical `op` field are kept; everything else
//! (debug chatter, third-party events) is dropped at the layer.

use sqlsnap_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_COMPONENT, FIELD_ERR_CODE, FIELD_EVENT,
    FIELD_OP,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One operation event as seen by the subscriber
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub op: String,
    pub event: Option<String>,
    /// Every recorded field, rendered as text
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn component(&self) -> Option<&str> {
        self.field(FIELD_COMPONENT)
    }

    pub fn err_code(&self) -> Option<&str> {
        self.field(FIELD_ERR_CODE)
    }
}

#[derive(Default)]
struct Fields(BTreeMap<String, String>);

impl Visit for Fields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

struct CaptureLayer {
    sink: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        event.record(&mut fields);
        let Some(op) = fields.0.get(FIELD_OP).cloned() else {
            return;
        };

        let captured = CapturedEvent {
            level: *event.metadata().level(),
            event: fields.0.get(FIELD_EVENT).cloned(),
            op,
            fields: fields.0,
        };
        if let Ok(mut sink) = self.sink.lock() {
            sink.push(captured);
        }
    }
}

/// Shared handle onto the captured events
#[derive(Clone, Default)]
pub struct TestCapture {
    sink: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    /// Everything captured so far, in emission order
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.sink.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events for one operation, in emission order
    pub fn events_for(&self, op: &str) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|e| e.op == op).collect()
    }

    /// The `event` values recorded for `op`, e.g. `["start", "end"]`
    pub fn lifecycle(&self, op: &str) -> Vec<String> {
        self.events_for(op)
            .into_iter()
            .filter_map(|e| e.event)
            .filter(|e| [EVENT_START, EVENT_END, EVENT_END_ERROR].contains(&e.as_str()))
            .collect()
    }

    /// # Panics
    ///
    /// When no event with this `op` and `event` was captured.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let seen = self.lifecycle(op);
        assert!(
            seen.iter().any(|e| e == event),
            "no '{}' event for op '{}' (saw {:?})",
            event,
            op,
            seen
        );
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer as the global subscriber and return its handle
///
/// Every test in a binary shares one capture, so assertions should use an
/// `op` name unique to the test or filter on a distinguishing field.
///
/// ```
/// use sqlsnap_core::logging_facility::test_capture::init_test_capture;
/// use sqlsnap_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("doc_example_op");
/// capture.assert_event_exists("doc_example_op", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let capture = TestCapture::default();
            let layer = CaptureLayer {
                sink: capture.sink.clone(),
            };
            // A sibling test binary helper may have installed one already
            let _ = tracing_subscriber::registry().with(layer).try_init();
            capture
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(op: &str, event: &str) -> CapturedEvent {
        let mut fields = BTreeMap::new();
        fields.insert(FIELD_OP.to_string(), op.to_string());
        fields.insert(FIELD_EVENT.to_string(), event.to_string());
        fields.insert(FIELD_ERR_CODE.to_string(), "ERR_LOCKED".to_string());
        CapturedEvent {
            level: Level::ERROR,
            op: op.to_string(),
            event: Some(event.to_string()),
            fields,
        }
    }

    #[test]
    fn test_lifecycle_keeps_only_canonical_events() {
        let capture = TestCapture::default();
        {
            let mut sink = capture.sink.lock().unwrap();
            sink.push(captured("restore_snapshot", EVENT_START));
            sink.push(captured("restore_snapshot", "progress"));
            sink.push(captured("write_snapshot", EVENT_START));
            sink.push(captured("restore_snapshot", EVENT_END_ERROR));
        }

        assert_eq!(
            capture.lifecycle("restore_snapshot"),
            vec![EVENT_START.to_string(), EVENT_END_ERROR.to_string()]
        );
        assert_eq!(capture.events_for("restore_snapshot")[0].err_code(), Some("ERR_LOCKED"));
        assert!(capture.events_for("write_snapshot")[0].component().is_none());
    }
}
