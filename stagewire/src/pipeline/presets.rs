//! Ready-made pipelines built from the builtin stages.

use super::{Orchestrator, PipelineBuilder};
use crate::events::EventSink;
use crate::monitor::Monitor;
use crate::stages::{ExportStage, IngestStage, MetricsStage, ProcessStage, Stage};
use std::sync::Arc;

/// The default message pipeline and a handle on its terminal stage.
#[derive(Debug)]
pub struct MessagePipeline {
    /// Orchestrator accepting raw text units.
    pub orchestrator: Orchestrator<String>,
    /// The export stage, for inspecting what was exported.
    pub export: Arc<Stage<ExportStage>>,
}

/// Builds `ingest -> process -> metrics -> export`, reporting to `monitor`
/// and any extra sinks.
#[must_use]
pub fn message_pipeline(
    monitor: Arc<Monitor>,
    extra_sinks: Vec<Arc<dyn EventSink>>,
) -> MessagePipeline {
    let export = Arc::new(Stage::new(ExportStage::new()));

    let mut builder = PipelineBuilder::new(Arc::new(Stage::new(IngestStage::new())))
        .then(Arc::new(Stage::new(ProcessStage::new())))
        .then(Arc::new(Stage::new(MetricsStage::new())))
        .then(export.clone())
        .with_monitor(monitor);
    for sink in extra_sinks {
        builder = builder.with_sink(sink);
    }

    MessagePipeline {
        orchestrator: builder.build(),
        export,
    }
}
