//! # Stagewire
//!
//! Typed stage pipelines with dual-channel forwarding and windowed metrics.
//!
//! Stagewire chains processing stages so that each stage's output is
//! forwarded to the next, while every invocation also reports a success or
//! error event to any number of observers:
//!
//! - **Typed chaining**: adjacent stages must agree on their data type at compile time
//! - **Dual channel**: data flows forward, outcome events flow sideways
//! - **Metrics aggregation**: per-stage counts, error kinds and latency percentiles
//! - **Runtime driver**: pulls input, feeds the pipeline, exports metrics on a timer
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stagewire::prelude::*;
//!
//! let monitor = Arc::new(Monitor::new());
//! let orchestrator = PipelineBuilder::new(Arc::new(Stage::new(IngestStage::new())))
//!     .then(Arc::new(Stage::new(ProcessStage::new())))
//!     .then(Arc::new(Stage::new(MetricsStage::new())))
//!     .then(Arc::new(Stage::new(ExportStage::new())))
//!     .with_monitor(monitor.clone())
//!     .build();
//!
//! orchestrator.initialize().await?;
//! orchestrator.submit(r#"{"type": "metric", "value": 42}"#.to_string()).await?;
//! println!("{}", monitor.snapshot().to_json());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod monitor;
pub mod observability;
pub mod pipeline;
pub mod runtime;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{Mode, Settings};
    pub use crate::core::{ErrorEvent, Outcome, StageKind, SuccessEvent};
    pub use crate::errors::{
        ConfigError, ExportError, HandleError, InitError, PipelineError, TransformError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink};
    pub use crate::monitor::{MetricsSnapshot, Monitor, StageMetrics};
    pub use crate::pipeline::{message_pipeline, Orchestrator, PipelineBuilder};
    pub use crate::runtime::{
        Driver, IterSource, LineSource, LogExporter, MetricsExporter, RunSummary, Source,
    };
    pub use crate::stages::{
        ExportStage, FnTransform, IngestStage, MetricsStage, ProcessStage, Stage, Transform,
    };
    pub use std::sync::Arc;
}
