//! Pipeline construction and orchestration.
//!
//! This module provides:
//! - A typed builder chaining stages with matching input/output types
//! - The orchestrator owning stage lifecycle and wiring
//! - Completion counters fed by the terminal stage
//! - The default message pipeline

mod builder;
#[cfg(test)]
mod integration_tests;
mod orchestrator;
mod presets;

pub use builder::PipelineBuilder;
pub use orchestrator::{CompletionCounters, Orchestrator};
pub use presets::{message_pipeline, MessagePipeline};
