//! Typed pipeline builder.

use super::orchestrator::{CompletionCounters, Link, Orchestrator};
use crate::core::Outcome;
use crate::errors::HandleError;
use crate::events::EventSink;
use crate::monitor::Monitor;
use crate::stages::{Callback, DynStage, Stage, Transform};
use futures::FutureExt;
use std::marker::PhantomData;
use std::sync::Arc;

type Forward<T> = Callback<T, Result<(), HandleError>>;

/// Registers a forwarding subscriber on the current last stage.
type Tail<Out> = Box<dyn FnOnce(Forward<Out>) + Send>;

/// Builder for linear pipelines with compile-time checked stage types.
///
/// Each call to [`PipelineBuilder::then`] only accepts a stage whose input
/// type equals the previous stage's output type, so a mismatch between
/// adjacent stages fails to compile.
pub struct PipelineBuilder<In, Out> {
    stages: Vec<Arc<dyn DynStage>>,
    links: Vec<Link>,
    entry: Forward<In>,
    tail: Tail<Out>,
    sinks: Vec<Arc<dyn EventSink>>,
    _phantom: PhantomData<fn(In) -> Out>,
}

impl<In, Out> PipelineBuilder<In, Out>
where
    In: Send + 'static,
    Out: Clone + Send + Sync + 'static,
{
    /// Starts a pipeline with its entry stage.
    #[must_use]
    pub fn new<T>(first: Arc<Stage<T>>) -> Self
    where
        T: Transform<Input = In, Output = Out>,
    {
        let entry_stage = first.clone();
        let entry: Forward<In> = Arc::new(move |input: In| {
            let stage = entry_stage.clone();
            async move { stage.handle(input).await }.boxed()
        });

        Self {
            stages: vec![first.clone() as Arc<dyn DynStage>],
            links: Vec::new(),
            entry,
            tail: tail_of(first),
            sinks: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Appends a stage consuming the current output type.
    #[must_use]
    pub fn then<T>(self, next: Arc<Stage<T>>) -> PipelineBuilder<In, T::Output>
    where
        T: Transform<Input = Out>,
    {
        let Self {
            mut stages,
            mut links,
            entry,
            tail,
            sinks,
            ..
        } = self;

        let next_stage = next.clone();
        let forward: Forward<Out> = Arc::new(move |value: Out| {
            let stage = next_stage.clone();
            async move { stage.handle(value).await }.boxed()
        });
        links.push(Box::new(move || tail(forward)));
        stages.push(next.clone() as Arc<dyn DynStage>);

        PipelineBuilder {
            stages,
            links,
            entry,
            tail: tail_of(next),
            sinks,
            _phantom: PhantomData,
        }
    }

    /// Adds an event sink registered on every stage at wiring time.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Adds the metrics aggregator as an event sink.
    #[must_use]
    pub fn with_monitor(self, monitor: Arc<Monitor>) -> Self {
        self.with_sink(monitor)
    }

    /// Returns the number of stages added so far.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Builds the orchestrator. Nothing is wired until `wire` or
    /// `initialize` is called.
    #[must_use]
    pub fn build(self) -> Orchestrator<In>
    where
        Out: Outcome,
    {
        let Self {
            stages,
            mut links,
            entry,
            tail,
            sinks,
            ..
        } = self;

        let counters = Arc::new(CompletionCounters::new());
        let terminal = counters.clone();
        let complete: Forward<Out> = Arc::new(move |outcome: Out| {
            terminal.record(outcome.is_completed());
            async { Ok(()) }.boxed()
        });
        links.push(Box::new(move || tail(complete)));

        Orchestrator::new(stages, sinks, entry, links, counters)
    }
}

fn tail_of<T: Transform>(stage: Arc<Stage<T>>) -> Tail<T::Output> {
    Box::new(move |forward| stage.on_handled_boxed(forward))
}

impl<In, Out> std::fmt::Debug for PipelineBuilder<In, Out> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field(
                "stages",
                &self.stages.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
            )
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
