//! Core domain model types for stagewire.
//!
//! This module contains the fundamental types shared by stages, sinks and
//! the aggregator:
//! - Success and error events emitted by `Stage::handle`
//! - The stage kind enum
//! - The `Outcome` trait consumed by the completion counter

mod event;
mod status;

pub use event::{ErrorEvent, SuccessEvent};
pub use status::{Outcome, StageKind};

/// Operation name recorded by the stage template.
pub const HANDLE_OPERATION: &str = "handle";
