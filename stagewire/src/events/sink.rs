//! Event sink trait and implementations.

use crate::core::{ErrorEvent, SuccessEvent};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, warn, Level};

/// Trait for consumers of stage outcome events.
///
/// The orchestrator registers every sink on every stage's success and error
/// subscriber lists. Consuming an event must never fail.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Consumes a success event.
    async fn on_success(&self, event: &SuccessEvent);

    /// Consumes an error event.
    async fn on_error(&self, event: &ErrorEvent);
}

/// An event sink that logs events using the tracing framework.
///
/// Errors are always logged at `warn`; successes at the configured level.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::DEBUG }
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
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn on_success(&self, event: &SuccessEvent) {
        if self.level == Level::DEBUG {
            debug!(
                key = %event.key(),
                duration_ms = event.duration_ms(),
                "Stage succeeded"
            );
        } else {
            info!(
                key = %event.key(),
                duration_ms = event.duration_ms(),
                "Stage succeeded"
            );
        }
    }

    async fn on_error(&self, event: &ErrorEvent) {
        warn!(
            key = %event.key(),
            error_kind = %event.error_kind,
            message = %event.message,
            "Stage errored"
        );
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    successes: RwLock<Vec<SuccessEvent>>,
    errors: RwLock<Vec<ErrorEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected success events.
    #[must_use]
    pub fn successes(&self) -> Vec<SuccessEvent> {
        self.successes.read().clone()
    }

    /// Returns all collected error events.
    #[must_use]
    pub fn errors(&self) -> Vec<ErrorEvent> {
        self.errors.read().clone()
    }

    /// Returns the total number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.successes.read().len() + self.errors.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.successes.write().clear();
        self.errors.write().clear();
    }

    /// Returns success events for one stage.
    #[must_use]
    pub fn successes_for(&self, stage: &str) -> Vec<SuccessEvent> {
        self.successes
            .read()
            .iter()
            .filter(|e| e.stage == stage)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn on_success(&self, event: &SuccessEvent) {
        self.successes.write().push(event.clone());
    }

    async fn on_error(&self, event: &ErrorEvent) {
        self.errors.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingEventSink::info();
        sink.on_success(&SuccessEvent::new("a", "handle", 0.1)).await;
        LoggingEventSink::debug()
            .on_success(&SuccessEvent::new("a", "handle", 0.1))
            .await;
        sink.on_error(&ErrorEvent::new("a", "handle", "ValueError")).await;
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.on_success(&SuccessEvent::new("a", "handle", 0.1)).await;
        sink.on_success(&SuccessEvent::new("b", "handle", 0.2)).await;
        sink.on_error(&ErrorEvent::new("b", "handle", "ValueError")).await;

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.successes_for("b").len(), 1);
        assert_eq!(sink.errors()[0].error_kind, "ValueError");

        sink.clear();
        assert!(sink.is_empty());
    }
}
