//! Builtin stages forming the default message pipeline.
//!
//! `IngestStage` (raw text -> JSON) -> `ProcessStage` (JSON -> JSON)
//! -> `MetricsStage` (JSON -> `MetricRecord`) -> `ExportStage`
//! (`MetricRecord` -> `bool`).

use super::Transform;
use crate::core::StageKind;
use crate::errors::TransformError;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info};

/// Decodes raw text units into JSON values.
#[derive(Debug)]
pub struct IngestStage {
    name: String,
}

impl IngestStage {
    /// Creates an ingest stage named `ingest`.
    #[must_use]
    pub fn new() -> Self {
        Self::named("ingest")
    }

    /// Creates an ingest stage with a custom name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for IngestStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transform for IngestStage {
    type Input = String;
    type Output = serde_json::Value;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Ingest
    }

    async fn execute(&self, input: String) -> Result<serde_json::Value, TransformError> {
        Ok(serde_json::from_str(input.trim())?)
    }
}

/// Validates that messages are JSON objects and stamps them.
#[derive(Debug)]
pub struct ProcessStage {
    name: String,
}

impl ProcessStage {
    /// Creates a process stage named `process`.
    #[must_use]
    pub fn new() -> Self {
        Self::named("process")
    }

    /// Creates a process stage with a custom name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for ProcessStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transform for ProcessStage {
    type Input = serde_json::Value;
    type Output = serde_json::Value;

    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, TransformError> {
        let mut message = match input {
            serde_json::Value::Object(message) => message,
            other => {
                return Err(TransformError::value_error(format!(
                    "expected a JSON object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        message.insert(
            "processed_at".to_string(),
            serde_json::json!(Utc::now().to_rfc3339()),
        );
        Ok(serde_json::Value::Object(message))
    }
}

/// Numeric fields extracted from one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// The message `type` field, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    /// Every numeric top-level field, by name.
    pub values: BTreeMap<String, f64>,
}

impl MetricRecord {
    /// Returns true if no numeric field was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Extracts numeric fields from processed messages.
#[derive(Debug)]
pub struct MetricsStage {
    name: String,
}

impl MetricsStage {
    /// Creates a metrics stage named `metrics`.
    #[must_use]
    pub fn new() -> Self {
        Self::named("metrics")
    }

    /// Creates a metrics stage with a custom name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for MetricsStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transform for MetricsStage {
    type Input = serde_json::Value;
    type Output = MetricRecord;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Enrich
    }

    async fn execute(&self, input: serde_json::Value) -> Result<MetricRecord, TransformError> {
        let message = input.as_object().ok_or_else(|| {
            TransformError::value_error(format!(
                "expected a JSON object, got {}",
                json_type_name(&input)
            ))
        })?;

        let values = message
            .iter()
            .filter_map(|(key, value)| value.as_f64().map(|number| (key.clone(), number)))
            .collect();

        Ok(MetricRecord {
            message_type: message
                .get("type")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            values,
        })
    }
}

/// Terminal stage handing records to the outside world.
///
/// Keeps the most recent record and a running count; forwards `true` for
/// every exported record.
#[derive(Debug)]
pub struct ExportStage {
    name: String,
    running: AtomicBool,
    exported: AtomicU64,
    last: Mutex<Option<MetricRecord>>,
}

impl ExportStage {
    /// Creates an export stage named `export`.
    #[must_use]
    pub fn new() -> Self {
        Self::named("export")
    }

    /// Creates an export stage with a custom name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            running: AtomicBool::new(false),
            exported: AtomicU64::new(0),
            last: Mutex::new(None),
        }
    }

    /// Returns the number of exported records.
    #[must_use]
    pub fn exported(&self) -> u64 {
        self.exported.load(Ordering::SeqCst)
    }

    /// Returns the last exported record.
    #[must_use]
    pub fn last_exported(&self) -> Option<MetricRecord> {
        self.last.lock().clone()
    }

    /// Returns true between setup and shutdown.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for ExportStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transform for ExportStage {
    type Input = MetricRecord;
    type Output = bool;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Export
    }

    async fn setup(&self) -> anyhow::Result<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!(stage = %self.name, exported = self.exported(), "Export stage shut down");
    }

    async fn execute(&self, input: MetricRecord) -> Result<bool, TransformError> {
        debug!(stage = %self.name, fields = input.values.len(), "Exporting record");
        *self.last.lock() = Some(input);
        self.exported.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
