//! The ingestion loop.

use super::{MetricsExporter, Source};
use crate::cancellation::CancellationToken;
use crate::config::Settings;
use crate::monitor::{MetricsSnapshot, Monitor};
use crate::pipeline::Orchestrator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shortest report interval the driver accepts.
pub const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(1);

/// Totals for one driver run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique id of the run.
    pub run_id: Uuid,
    /// Units pulled from the source.
    pub received: u64,
    /// Units whose propagation failed somewhere.
    pub failed: u64,
    /// Terminal results that were truthy.
    pub completed: u64,
    /// Terminal results that were falsy.
    pub not_completed: u64,
    /// Metrics of the last, unreset window.
    pub final_snapshot: MetricsSnapshot,
}

/// Feeds a source into an initialised pipeline and exports metrics on a timer.
pub struct Driver<In> {
    orchestrator: Arc<Orchestrator<In>>,
    monitor: Arc<Monitor>,
    exporter: Arc<dyn MetricsExporter>,
    settings: Settings,
    token: Arc<CancellationToken>,
}

impl<In: Send + 'static> Driver<In> {
    /// Creates a driver with a fresh cancellation token.
    ///
    /// A report interval below [`MIN_REPORT_INTERVAL`] is raised to it.
    pub fn new(
        orchestrator: Arc<Orchestrator<In>>,
        monitor: Arc<Monitor>,
        exporter: Arc<dyn MetricsExporter>,
        mut settings: Settings,
    ) -> Self {
        if settings.report_interval < MIN_REPORT_INTERVAL {
            warn!(
                requested_ms = settings.report_interval.as_secs_f64() * 1000.0,
                "Report interval too short, using the minimum"
            );
            settings.report_interval = MIN_REPORT_INTERVAL;
        }
        Self {
            orchestrator,
            monitor,
            exporter,
            settings,
            token: Arc::new(CancellationToken::new()),
        }
    }

    /// Uses an externally owned stop signal.
    #[must_use]
    pub fn with_token(mut self, token: Arc<CancellationToken>) -> Self {
        self.token = token;
        self
    }

    /// The effective settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The stop signal. Cancelling it ends `run` after the in-flight unit.
    pub fn token(&self) -> &Arc<CancellationToken> {
        &self.token
    }

    /// Pulls units until the source is exhausted or the token is cancelled.
    ///
    /// Each unit propagates fully before the next is pulled. Every
    /// `report_interval` the window is snapshotted, reset and exported. On
    /// exit a final snapshot is exported without resetting.
    pub async fn run<S: Source<In>>(&self, mut source: S) -> RunSummary {
        let run_id = Uuid::new_v4();
        let mut received = 0u64;
        let mut failed = 0u64;

        let mut ticker = tokio::time::interval(self.settings.report_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(
            run_id = %run_id,
            interval_secs = self.settings.report_interval.as_secs_f64(),
            "Driver started"
        );

        loop {
            tokio::select! {
                biased;
                () = self.token.cancelled() => {
                    info!(run_id = %run_id, reason = ?self.token.reason(), "Driver stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let snapshot = self.monitor.snapshot_and_reset();
                    self.export(&snapshot).await;
                }
                next = source.next() => {
                    let Some(unit) = next else {
                        debug!(run_id = %run_id, "Source exhausted");
                        break;
                    };
                    received += 1;
                    if let Err(e) = self.orchestrator.submit(unit).await {
                        failed += 1;
                        warn!(run_id = %run_id, error = %e, "Unit failed");
                    }
                }
            }
        }

        let final_snapshot = self.monitor.snapshot();
        self.export(&final_snapshot).await;

        let summary = RunSummary {
            run_id,
            received,
            failed,
            completed: self.orchestrator.completed(),
            not_completed: self.orchestrator.not_completed(),
            final_snapshot,
        };
        info!(
            run_id = %run_id,
            received = summary.received,
            failed = summary.failed,
            completed = summary.completed,
            not_completed = summary.not_completed,
            "Driver finished"
        );
        summary
    }

    async fn export(&self, snapshot: &MetricsSnapshot) {
        if let Err(e) = self.exporter.export(snapshot).await {
            warn!(error = %e, "Metrics export failed");
        }
    }
}

impl<In> std::fmt::Debug for Driver<In> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("orchestrator", &self.orchestrator)
            .field("settings", &self.settings)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
