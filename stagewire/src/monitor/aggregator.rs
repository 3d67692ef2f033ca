//! The windowed metrics aggregator.

use super::snapshot::{LatencySummary, MetricsSnapshot, StageMetrics};
use crate::core::{ErrorEvent, SuccessEvent};
use crate::events::EventSink;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Default number of latency samples retained per key.
pub const DEFAULT_LATENCY_CAPACITY: usize = 1000;

/// Per-key counters and samples.
#[derive(Debug, Default)]
struct KeyStats {
    success_count: u64,
    durations: VecDeque<f64>,
    error_count: u64,
    error_kinds: HashMap<String, u64>,
}

impl KeyStats {
    fn to_metrics(&self) -> StageMetrics {
        StageMetrics {
            success_count: self.success_count,
            error_count: self.error_count,
            latency: LatencySummary::from_samples(&self.durations),
            error_kinds: self
                .error_kinds
                .iter()
                .map(|(kind, count)| (kind.clone(), *count))
                .collect(),
        }
    }
}

#[derive(Debug)]
struct State {
    keys: HashMap<String, KeyStats>,
    window_started_at: DateTime<Utc>,
}

impl State {
    fn new() -> Self {
        Self {
            keys: HashMap::new(),
            window_started_at: Utc::now(),
        }
    }

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            taken_at: Utc::now(),
            window_started_at: self.window_started_at,
            stages: self
                .keys
                .iter()
                .map(|(key, stats)| (key.clone(), stats.to_metrics()))
                .collect(),
        }
    }
}

/// Aggregates stage events into windowed metrics.
///
/// Keyed by `"stage.operation"`. Every key holds a success counter, the
/// most recent `capacity` durations (oldest evicted first), an error
/// counter and a per-kind error breakdown. All state sits behind a single
/// mutex, so consuming, snapshotting and resetting never interleave.
#[derive(Debug)]
pub struct Monitor {
    capacity: usize,
    state: Mutex<State>,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Monitor {
    /// Creates a monitor retaining [`DEFAULT_LATENCY_CAPACITY`] samples per key.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LATENCY_CAPACITY)
    }

    /// Creates a monitor retaining `capacity` samples per key.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(State::new()),
        }
    }

    /// Returns the per-key sample capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records a success event.
    pub fn consume_success(&self, event: &SuccessEvent) {
        let mut state = self.state.lock();
        let stats = state.keys.entry(event.key()).or_default();

        stats.success_count += 1;
        if stats.durations.len() == self.capacity {
            stats.durations.pop_front();
        }
        stats.durations.push_back(event.duration);
    }

    /// Records an error event.
    pub fn consume_error(&self, event: &ErrorEvent) {
        let mut state = self.state.lock();
        let stats = state.keys.entry(event.key()).or_default();

        stats.error_count += 1;
        *stats
            .error_kinds
            .entry(event.error_kind.clone())
            .or_insert(0) += 1;
    }

    /// Returns the current metrics without modifying them.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.state.lock().snapshot()
    }

    /// Clears every counter, sample and breakdown and starts a new window.
    pub fn reset(&self) {
        *self.state.lock() = State::new();
    }

    /// Takes a snapshot and resets under one lock acquisition.
    ///
    /// No event can land between the read and the reset.
    #[must_use]
    pub fn snapshot_and_reset(&self) -> MetricsSnapshot {
        let mut state = self.state.lock();
        let snapshot = state.snapshot();
        *state = State::new();
        snapshot
    }

    /// Returns the success count for a key.
    #[must_use]
    pub fn success_count(&self, key: &str) -> u64 {
        self.state.lock().keys.get(key).map_or(0, |s| s.success_count)
    }

    /// Returns the error count for a key.
    #[must_use]
    pub fn error_count(&self, key: &str) -> u64 {
        self.state.lock().keys.get(key).map_or(0, |s| s.error_count)
    }

    /// Returns the count of one error kind under a key.
    #[must_use]
    pub fn error_kind_count(&self, key: &str, kind: &str) -> u64 {
        self.state
            .lock()
            .keys
            .get(key)
            .and_then(|s| s.error_kinds.get(kind).copied())
            .unwrap_or(0)
    }

    /// Returns the retained duration samples for a key, oldest first.
    #[must_use]
    pub fn retained_samples(&self, key: &str) -> Vec<f64> {
        self.state
            .lock()
            .keys
            .get(key)
            .map(|s| s.durations.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the keys with recorded data, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.lock().keys.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl EventSink for Monitor {
    async fn on_success(&self, event: &SuccessEvent) {
        self.consume_success(event);
    }

    async fn on_error(&self, event: &ErrorEvent) {
        self.consume_error(event);
    }
}
