//! Pipeline orchestrator: lifecycle, wiring and completion counting.

use crate::core::{ErrorEvent, SuccessEvent};
use crate::errors::{HandleError, InitError, PipelineError};
use crate::events::EventSink;
use crate::stages::{Callback, DynStage};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A deferred forwarding registration, executed by `wire`.
pub(crate) type Link = Box<dyn FnOnce() + Send>;

/// Counts units that reached the end of the pipeline.
///
/// Mutated only by the terminal completion hook.
#[derive(Debug)]
pub struct CompletionCounters {
    completed: AtomicU64,
    not_completed: AtomicU64,
}

impl Default for CompletionCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionCounters {
    /// Creates counters starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            completed: AtomicU64::new(0),
            not_completed: AtomicU64::new(0),
        }
    }

    /// Records one terminal outcome.
    pub fn record(&self, completed: bool) {
        if completed {
            let total = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(completed = total, "Pipeline completed");
        } else {
            let total = self.not_completed.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(not_completed = total, "Pipeline not completed");
        }
    }

    /// Returns the number of completed units.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns the number of units whose terminal outcome was falsy.
    #[must_use]
    pub fn not_completed(&self) -> u64 {
        self.not_completed.load(Ordering::SeqCst)
    }

    /// Returns the number of units that reached the terminal stage.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.completed() + self.not_completed()
    }
}

/// Owns an ordered list of stages and connects them.
///
/// Built by [`super::PipelineBuilder`]. `initialize` runs every stage's
/// setup hook in order and then wires forwarding, sinks and the completion
/// counter. Input is accepted only after initialisation.
pub struct Orchestrator<In> {
    stages: Vec<Arc<dyn DynStage>>,
    sinks: Vec<Arc<dyn EventSink>>,
    entry: Callback<In, Result<(), HandleError>>,
    links: Mutex<Vec<Link>>,
    counters: Arc<CompletionCounters>,
    wired: AtomicBool,
    initialized: AtomicBool,
}

impl<In: Send + 'static> Orchestrator<In> {
    pub(crate) fn new(
        stages: Vec<Arc<dyn DynStage>>,
        sinks: Vec<Arc<dyn EventSink>>,
        entry: Callback<In, Result<(), HandleError>>,
        links: Vec<Link>,
        counters: Arc<CompletionCounters>,
    ) -> Self {
        Self {
            stages,
            sinks,
            entry,
            links: Mutex::new(links),
            counters,
            wired: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
        }
    }

    /// Connects the stages. Calling it again has no effect.
    ///
    /// Registers each stage's successor as its forwarding subscriber, every
    /// sink on every stage's success and error lists, and the completion
    /// counter on the last stage.
    pub fn wire(&self) {
        if self.wired.swap(true, Ordering::SeqCst) {
            return;
        }

        let links: Vec<Link> = std::mem::take(&mut *self.links.lock());
        for link in links {
            link();
        }

        for stage in &self.stages {
            for sink in &self.sinks {
                attach_sink(stage.as_ref(), sink);
            }
        }

        info!(
            stages = ?self.stage_names(),
            sinks = self.sinks.len(),
            "Pipeline wired"
        );
    }

    /// Runs every stage's setup hook in order, then wires the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Init` naming the first stage whose setup
    /// failed; later stages are not set up.
    pub async fn initialize(&self) -> Result<(), PipelineError> {
        for stage in &self.stages {
            if let Err(e) = stage.setup().await {
                error!(stage = %stage.name(), error = %e, "Stage setup failed");
                return Err(InitError::new(stage.name(), e.to_string()).into());
            }
            debug!(stage = %stage.name(), kind = %stage.kind(), "Stage set up");
        }

        self.wire();
        self.initialized.store(true, Ordering::SeqCst);
        info!(stages = self.stages.len(), "Pipeline initialized");
        Ok(())
    }

    /// Feeds one unit into the first stage and awaits its full propagation.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::NotInitialized` before `initialize`, or
    /// `PipelineError::Handle` if any stage failed on this unit.
    pub async fn submit(&self, input: In) -> Result<(), PipelineError> {
        if !self.is_initialized() {
            return Err(PipelineError::NotInitialized);
        }
        (self.entry)(input).await?;
        Ok(())
    }

    /// Runs every stage's shutdown hook in order.
    pub async fn shutdown(&self) {
        for stage in &self.stages {
            stage.shutdown().await;
        }
        info!(
            completed = self.completed(),
            not_completed = self.not_completed(),
            "Pipeline shut down"
        );
    }

    /// Returns the stage names in pipeline order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().to_string()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false; a pipeline has at least one stage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the completion counters.
    #[must_use]
    pub fn counters(&self) -> &Arc<CompletionCounters> {
        &self.counters
    }

    /// Returns the number of completed units.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.counters.completed()
    }

    /// Returns the number of units with a falsy terminal outcome.
    #[must_use]
    pub fn not_completed(&self) -> u64 {
        self.counters.not_completed()
    }

    /// Returns true once `wire` has run.
    #[must_use]
    pub fn is_wired(&self) -> bool {
        self.wired.load(Ordering::SeqCst)
    }

    /// Returns true once `initialize` has succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

fn attach_sink(stage: &dyn DynStage, sink: &Arc<dyn EventSink>) {
    let on_success = sink.clone();
    stage.success_hooks().push(move |event: SuccessEvent| {
        let sink = on_success.clone();
        async move { sink.on_success(&event).await }
    });

    let on_error = sink.clone();
    stage.error_hooks().push(move |event: ErrorEvent| {
        let sink = on_error.clone();
        async move { sink.on_error(&event).await }
    });
}

impl<In> std::fmt::Debug for Orchestrator<In> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field(
                "stages",
                &self.stages.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
            )
            .field("sinks", &self.sinks.len())
            .field("completed", &self.counters.completed())
            .field("not_completed", &self.counters.not_completed())
            .field("wired", &self.wired.load(Ordering::SeqCst))
            .finish()
    }
}
