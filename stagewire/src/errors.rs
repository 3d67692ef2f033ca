//! Error types for stagewire.
//!
//! Failures fall into a small taxonomy: transformation failures raised by a
//! stage's `execute`, initialisation failures raised by a stage's setup hook,
//! export failures raised by metrics exporters, and configuration failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage failed its setup hook.
    #[error("{0}")]
    Init(#[from] InitError),

    /// A unit of work failed while travelling through the pipeline.
    #[error("{0}")]
    Handle(#[from] HandleError),

    /// Input was submitted before `initialize()` completed.
    #[error("Pipeline not initialized: call initialize() before submitting input")]
    NotInitialized,
}

/// A failure signalled by a stage's transformation.
///
/// The `kind` is a short classification (e.g. `"ValueError"`) used as the
/// error-kind key in aggregated metrics.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct TransformError {
    /// Short classification of the failure.
    pub kind: String,
    /// Human readable description.
    pub message: String,
}

impl TransformError {
    /// Creates a new transform error.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Creates a `ValueError` for input the stage cannot accept.
    #[must_use]
    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new("ValueError", message)
    }

    /// Creates a `ParseError` for input that could not be decoded.
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new("ParseError", message)
    }
}

impl From<serde_json::Error> for TransformError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse_error(err.to_string())
    }
}

/// Error returned by `Stage::handle` when a unit could not be processed.
///
/// Carries the name of the stage whose transformation failed. A failure in
/// a downstream stage is returned unchanged by every upstream `handle`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stage '{stage}' failed: {error}")]
pub struct HandleError {
    /// The stage whose transformation failed.
    pub stage: String,
    /// The underlying transformation failure.
    #[source]
    pub error: TransformError,
}

impl HandleError {
    /// Creates a new handle error.
    #[must_use]
    pub fn new(stage: impl Into<String>, error: TransformError) -> Self {
        Self {
            stage: stage.into(),
            error,
        }
    }

    /// Returns the error kind of the underlying failure.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.error.kind
    }
}

/// Error raised when a stage's setup hook fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stage '{stage}' failed to initialize: {message}")]
pub struct InitError {
    /// The stage that failed.
    pub stage: String,
    /// Additional message.
    pub message: String,
}

impl InitError {
    /// Creates a new initialization error.
    #[must_use]
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by metrics exporters.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writing the snapshot failed.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the snapshot failed.
    #[error("Export serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sink rejected the snapshot.
    #[error("Export rejected: {0}")]
    Rejected(String),
}

/// Error raised when a configuration value is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value '{value}' for {key}: {reason}")]
pub struct ConfigError {
    /// The configuration key.
    pub key: String,
    /// The offending value.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
