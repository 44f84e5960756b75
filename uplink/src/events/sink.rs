//! Event sink trait and implementations.

use async_trait::async_trait;
use tracing::{debug, info, Level};

/// Trait for event sinks that can receive engine events.
///
/// Event sinks are used throughout uplink for observability: pipeline
/// lifecycle, coordination decisions, retries, and validation display
/// all emit through the current sink.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The type of event (e.g., "pipeline.complete")
    /// * `data` - Optional event data
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>);

    /// Tries to emit an event without blocking.
    ///
    /// This method should never raise an exception. Errors are logged
    /// but suppressed.
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {
        // Intentionally empty - discards all events
    }

    fn try_emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {
        // Intentionally empty - discards all events
    }
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event_type: &str, data: &Option<serde_json::Value>) {
        match self.level {
            Level::DEBUG => {
                debug!(
                    event_type = %event_type,
                    event_data = ?data,
                    "Event: {}", event_type
                );
            }
            _ => {
                info!(
                    event_type = %event_type,
                    event_data = ?data,
                    "Event: {}", event_type
                );
            }
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, &data);
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, &data);
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns the event types collected, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}
