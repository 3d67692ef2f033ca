//! Runtime plumbing around a pipeline.
//!
//! This module provides:
//! - Input sources (channel, in-memory, line reader)
//! - Metrics exporters (log, JSON lines)
//! - The driver loop tying source, pipeline and exporter together

mod driver;
mod exporter;
mod source;

pub use driver::{Driver, RunSummary, MIN_REPORT_INTERVAL};
#[cfg(test)]
pub use exporter::MockMetricsExporter;
pub use exporter::{JsonLinesExporter, LogExporter, MetricsExporter};
pub use source::{ChannelSource, IterSource, LineSource, Source};
