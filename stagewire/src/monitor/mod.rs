//! Metrics aggregation over stage events.
//!
//! This module provides:
//! - `Monitor`, the event-consuming aggregator with bounded latency samples
//! - `MetricsSnapshot` and friends, the serialisable point-in-time view
//! - `percentile`, the floor-index percentile used by the snapshot

mod aggregator;
mod snapshot;

pub use aggregator::{Monitor, DEFAULT_LATENCY_CAPACITY};
pub use snapshot::{percentile, LatencySummary, MetricsSnapshot, StageMetrics};
