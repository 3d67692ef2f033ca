//! Event sinks for stage outcome events.
//!
//! Sinks receive the success and error events emitted by every stage's
//! `handle`. The metrics aggregator is one sink; logging and collecting
//! sinks are provided for diagnostics and tests.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink};
