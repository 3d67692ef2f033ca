//! Stage abstraction and implementations.
//!
//! A stage pairs a [`Transform`] (the business logic) with the fixed
//! `handle` template that times the transformation, forwards its output to
//! the forwarding subscribers and reports the outcome to the success or
//! error subscribers. Stages know nothing about monitors; observability is
//! attached purely by registering subscribers.

mod builtin;
mod callbacks;

pub use builtin::{ExportStage, IngestStage, MetricRecord, MetricsStage, ProcessStage};
pub use callbacks::{Callback, CallbackList};

use crate::core::{ErrorEvent, StageKind, SuccessEvent, HANDLE_OPERATION};
use crate::errors::{HandleError, TransformError};
use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::future::Future;
use std::marker::PhantomData;
use std::time::Instant;
use tracing::{debug, warn};

/// The transformation a stage performs.
///
/// This is the only trait a concrete stage implements. The input and output
/// types are checked at compile time when stages are chained.
#[async_trait]
pub trait Transform: Send + Sync + 'static {
    /// The value this stage receives.
    type Input: Send + 'static;
    /// The value this stage forwards.
    type Output: Clone + Send + Sync + 'static;

    /// Returns the stage identity used in events.
    fn name(&self) -> &str;

    /// Returns the role of the stage.
    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    /// Prepares the stage before any input is accepted.
    async fn setup(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Releases resources at process shutdown.
    async fn shutdown(&self) {}

    /// Transforms one unit of work.
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, TransformError>;
}

/// A transform wrapped in the handle/forward/emit template.
pub struct Stage<T: Transform> {
    name: String,
    transform: T,
    handled: CallbackList<T::Output, Result<(), HandleError>>,
    success: CallbackList<SuccessEvent>,
    error: CallbackList<ErrorEvent>,
}

impl<T: Transform> Stage<T> {
    /// Wraps a transform. The stage takes its name from the transform.
    #[must_use]
    pub fn new(transform: T) -> Self {
        Self {
            name: transform.name().to_string(),
            transform,
            handled: CallbackList::new(),
            success: CallbackList::new(),
            error: CallbackList::new(),
        }
    }

    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the wrapped transform.
    #[must_use]
    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// Registers a forwarding subscriber receiving each successful output.
    pub fn on_handled<F, Fut>(&self, callback: F)
    where
        F: Fn(T::Output) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandleError>> + Send + 'static,
    {
        self.handled.push(callback);
    }

    /// Registers an already type-erased forwarding subscriber.
    pub fn on_handled_boxed(&self, callback: Callback<T::Output, Result<(), HandleError>>) {
        self.handled.push_boxed(callback);
    }

    /// Registers a subscriber for success events.
    pub fn on_success<F, Fut>(&self, callback: F)
    where
        F: Fn(SuccessEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.success.push(callback);
    }

    /// Registers a subscriber for error events.
    pub fn on_error<F, Fut>(&self, callback: F)
    where
        F: Fn(ErrorEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.error.push(callback);
    }

    /// Returns the number of forwarding subscribers.
    #[must_use]
    pub fn handled_subscribers(&self) -> usize {
        self.handled.len()
    }

    /// Runs one unit through the stage.
    ///
    /// On success the output is forwarded first, then the success event is
    /// emitted. On failure the error event is emitted and the failure is
    /// returned. If a forwarding subscriber fails, the remaining forwarders
    /// are skipped, this stage still reports success, and the downstream
    /// error is returned unchanged.
    pub async fn handle(&self, input: T::Input) -> Result<(), HandleError> {
        let started = Instant::now();

        match self.transform.execute(input).await {
            Ok(output) => {
                let duration = started.elapsed().as_secs_f64();
                let forwarded = self.handled.try_emit(&output).await;

                debug!(stage = %self.name, duration_ms = duration * 1000.0, "Stage handled unit");
                self.success
                    .emit(&SuccessEvent::new(&self.name, HANDLE_OPERATION, duration))
                    .await;

                forwarded
            }
            Err(error) => {
                let duration = started.elapsed().as_secs_f64();
                warn!(
                    stage = %self.name,
                    error_kind = %error.kind,
                    duration_ms = duration * 1000.0,
                    "Stage failed: {}", error.message
                );

                let event = ErrorEvent::new(&self.name, HANDLE_OPERATION, &error.kind)
                    .with_message(&error.message);
                self.error.emit(&event).await;

                Err(HandleError::new(&self.name, error))
            }
        }
    }
}

impl<T: Transform> Debug for Stage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("kind", &self.transform.kind())
            .field("handled", &self.handled)
            .field("success", &self.success)
            .field("error", &self.error)
            .finish()
    }
}

/// Type-erased view of a stage used by the orchestrator.
///
/// Exposes only identity, lifecycle hooks and the two observability lists.
#[async_trait]
pub trait DynStage: Send + Sync {
    /// Returns the stage name.
    fn name(&self) -> &str;

    /// Returns the stage kind.
    fn kind(&self) -> StageKind;

    /// Runs the stage's setup hook.
    async fn setup(&self) -> anyhow::Result<()>;

    /// Runs the stage's shutdown hook.
    async fn shutdown(&self);

    /// Returns the success subscriber list.
    fn success_hooks(&self) -> &CallbackList<SuccessEvent>;

    /// Returns the error subscriber list.
    fn error_hooks(&self) -> &CallbackList<ErrorEvent>;
}

#[async_trait]
impl<T: Transform> DynStage for Stage<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.transform.kind()
    }

    async fn setup(&self) -> anyhow::Result<()> {
        self.transform.setup().await
    }

    async fn shutdown(&self) {
        self.transform.shutdown().await;
    }

    fn success_hooks(&self) -> &CallbackList<SuccessEvent> {
        &self.success
    }

    fn error_hooks(&self) -> &CallbackList<ErrorEvent> {
        &self.error
    }
}

/// A closure-based transform.
pub struct FnTransform<I, O, F>
where
    F: Fn(I) -> Result<O, TransformError> + Send + Sync,
{
    name: String,
    kind: StageKind,
    func: F,
    _phantom: PhantomData<fn(I) -> O>,
}

impl<I, O, F> FnTransform<I, O, F>
where
    F: Fn(I) -> Result<O, TransformError> + Send + Sync,
{
    /// Creates a new closure-based transform.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Transform,
            func,
            _phantom: PhantomData,
        }
    }

    /// Sets the stage kind.
    #[must_use]
    pub fn with_kind(mut self, kind: StageKind) -> Self {
        self.kind = kind;
        self
    }
}

impl<I, O, F> Debug for FnTransform<I, O, F>
where
    F: Fn(I) -> Result<O, TransformError> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

#[async_trait]
impl<I, O, F> Transform for FnTransform<I, O, F>
where
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
    F: Fn(I) -> Result<O, TransformError> + Send + Sync + 'static,
{
    type Input = I;
    type Output = O;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn execute(&self, input: I) -> Result<O, TransformError> {
        (self.func)(input)
    }
}
