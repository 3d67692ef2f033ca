//! Runs the message pipeline over standard input.
//!
//! Each non-blank line is one unit. Metrics are logged every
//! `REPORT_INTERVAL_SECS`. SIGINT, SIGTERM or end of input stops the run;
//! the final snapshot is exported either way.

use anyhow::Context;
use stagewire::config::{Mode, Settings};
use stagewire::events::{EventSink, LoggingEventSink};
use stagewire::monitor::Monitor;
use stagewire::observability::init_tracing;
use stagewire::pipeline::message_pipeline;
use stagewire::runtime::{ChannelSource, Driver, LogExporter};
use std::sync::Arc;
use tracing::{info, warn};

const INPUT_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("invalid configuration")?;
    init_tracing(&settings);
    info!(mode = %settings.mode, "Starting stagewire");

    let monitor = Arc::new(Monitor::with_capacity(settings.latency_capacity));
    let sinks: Vec<Arc<dyn EventSink>> = match settings.mode {
        Mode::Dev => vec![Arc::new(LoggingEventSink::debug())],
        Mode::Staging => vec![Arc::new(LoggingEventSink::info())],
        Mode::Prod => Vec::new(),
    };

    let pipeline = message_pipeline(monitor.clone(), sinks);
    let orchestrator = Arc::new(pipeline.orchestrator);
    orchestrator
        .initialize()
        .await
        .context("pipeline failed to initialise")?;

    let driver = Driver::new(
        orchestrator.clone(),
        monitor,
        Arc::new(LogExporter::new()),
        settings,
    );

    let token = driver.token().clone();
    tokio::spawn(async move {
        let signal = shutdown_signal().await;
        token.cancel(signal);
    });

    let source = ChannelSource::stdin(INPUT_BUFFER).context("could not start the input reader")?;
    let summary = driver.run(source).await;
    orchestrator.shutdown().await;

    info!(
        run_id = %summary.run_id,
        received = summary.received,
        failed = summary.failed,
        completed = summary.completed,
        not_completed = summary.not_completed,
        exported = pipeline.export.transform().exported(),
        "Run complete"
    );
    Ok(())
}

/// Resolves with the name of the first stop signal received.
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => tokio::select! {
                () = interrupt() => "SIGINT",
                _ = terminate.recv() => "SIGTERM",
            },
            Err(e) => {
                warn!(error = %e, "Could not listen for SIGTERM");
                interrupt().await;
                "SIGINT"
            }
        }
    }
    #[cfg(not(unix))]
    {
        interrupt().await;
        "ctrl-c"
    }
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
