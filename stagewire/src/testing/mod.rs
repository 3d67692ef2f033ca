//! Testing utilities for stagewire pipelines.
//!
//! Small transforms with predictable behavior, useful for exercising the
//! stage template, the orchestrator and the runtime driver.

mod mocks;

pub use mocks::{
    ConstTransform, EchoTransform, FailOnTransform, FailingSetupTransform, SlowTransform,
};
