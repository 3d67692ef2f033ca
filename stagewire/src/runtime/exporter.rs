//! Destinations for periodic metrics snapshots.

use crate::errors::ExportError;
use crate::monitor::MetricsSnapshot;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Publishes metrics snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsExporter: Send + Sync {
    /// Publishes one snapshot.
    async fn export(&self, snapshot: &MetricsSnapshot) -> Result<(), ExportError>;
}

/// Logs each snapshot as a single `info` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogExporter;

impl LogExporter {
    /// Creates a new log exporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricsExporter for LogExporter {
    async fn export(&self, snapshot: &MetricsSnapshot) -> Result<(), ExportError> {
        let payload = serde_json::to_string(snapshot)?;
        info!(
            stages = snapshot.stages.len(),
            successes = snapshot.total_successes(),
            errors = snapshot.total_errors(),
            snapshot = %payload,
            "Metrics snapshot"
        );
        Ok(())
    }
}

/// Appends one JSON document per snapshot to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesExporter {
    path: PathBuf,
}

impl JsonLinesExporter {
    /// Writes to `path`, creating it on first export.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The output file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetricsExporter for JsonLinesExporter {
    async fn export(&self, snapshot: &MetricsSnapshot) -> Result<(), ExportError> {
        let mut line = serde_json::to_vec(snapshot)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
