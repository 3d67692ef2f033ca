//! Observability events emitted by `Stage::handle`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Emitted once per successful `handle` invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEvent {
    /// Name of the stage that handled the unit.
    pub stage: String,
    /// Operation name, `"handle"` for the stage template.
    pub operation: String,
    /// Time spent in `execute`, in seconds.
    pub duration: f64,
    /// When the event was created.
    pub occurred_at: DateTime<Utc>,
}

impl SuccessEvent {
    /// Creates a new success event.
    #[must_use]
    pub fn new(stage: impl Into<String>, operation: impl Into<String>, duration: f64) -> Self {
        Self {
            stage: stage.into(),
            operation: operation.into(),
            duration: duration.max(0.0),
            occurred_at: Utc::now(),
        }
    }

    /// Returns the aggregation key `"{stage}.{operation}"`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}.{}", self.stage, self.operation)
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.duration * 1000.0
    }
}

/// Emitted once per failed `handle` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Name of the stage whose transformation failed.
    pub stage: String,
    /// Operation name, `"handle"` for the stage template.
    pub operation: String,
    /// Classification of the failure.
    pub error_kind: String,
    /// Failure message.
    #[serde(default)]
    pub message: String,
    /// When the event was created.
    pub occurred_at: DateTime<Utc>,
}

impl ErrorEvent {
    /// Creates a new error event.
    #[must_use]
    pub fn new(
        stage: impl Into<String>,
        operation: impl Into<String>,
        error_kind: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            operation: operation.into(),
            error_kind: error_kind.into(),
            message: String::new(),
            occurred_at: Utc::now(),
        }
    }

    /// Attaches the failure message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Returns the aggregation key `"{stage}.{operation}"`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}.{}", self.stage, self.operation)
    }
}
