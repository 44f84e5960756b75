//! Event sink system for observability.
//!
//! This module provides the event emission infrastructure used throughout
//! the uplink engine for logging, monitoring, and analytics.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use parking_lot::RwLock;
use std::sync::Arc;

static GLOBAL_EVENT_SINK: RwLock<Option<Arc<dyn EventSink>>> = RwLock::new(None);

/// Sets the current global event sink.
pub fn set_event_sink(sink: Arc<dyn EventSink>) {
    *GLOBAL_EVENT_SINK.write() = Some(sink);
}

/// Clears the current global event sink.
pub fn clear_event_sink() {
    *GLOBAL_EVENT_SINK.write() = None;
}

/// Gets the current global event sink.
///
/// Returns a `NoOpEventSink` if no sink is set.
pub fn get_event_sink() -> Arc<dyn EventSink> {
    GLOBAL_EVENT_SINK
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(NoOpEventSink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_sink_default() {
        clear_event_sink();
        let sink = get_event_sink();
        sink.try_emit("test", None);
    }

    #[test]
    fn test_set_and_get_sink() {
        let sink: Arc<dyn EventSink> = Arc::new(LoggingEventSink::default());
        set_event_sink(sink);

        let retrieved = get_event_sink();
        retrieved.try_emit("test.event", Some(serde_json::json!({"key": "value"})));

        clear_event_sink();
    }
}
