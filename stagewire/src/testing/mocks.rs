//! Mock transforms for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::time::Duration;

use crate::core::StageKind;
use crate::errors::TransformError;
use crate::stages::Transform;

/// Forwards its input unchanged and records every call.
#[derive(Debug)]
pub struct EchoTransform {
    name: String,
    calls: Mutex<Vec<String>>,
}

impl EchoTransform {
    /// Creates a new echo transform.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the inputs seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Transform for EchoTransform {
    type Input = String;
    type Output = String;

    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, input: String) -> Result<String, TransformError> {
        self.calls.lock().push(input.clone());
        Ok(input)
    }
}

/// Fails with a fixed error kind when the input equals a trigger value.
#[derive(Debug)]
pub struct FailOnTransform {
    name: String,
    trigger: String,
    kind: String,
}

impl FailOnTransform {
    /// Creates a transform failing with `kind` whenever the input is `trigger`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        trigger: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            trigger: trigger.into(),
            kind: kind.into(),
        }
    }
}

#[async_trait]
impl Transform for FailOnTransform {
    type Input = String;
    type Output = String;

    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, input: String) -> Result<String, TransformError> {
        if input == self.trigger {
            return Err(TransformError::new(
                self.kind.clone(),
                format!("rejected input '{input}'"),
            ));
        }
        Ok(input)
    }
}

/// Ignores its input and always produces the same output.
#[derive(Debug)]
pub struct ConstTransform<I, O> {
    name: String,
    output: O,
    _phantom: PhantomData<fn(I)>,
}

impl<I, O: Clone> ConstTransform<I, O> {
    /// Creates a transform that always returns `output`.
    #[must_use]
    pub fn new(name: impl Into<String>, output: O) -> Self {
        Self {
            name: name.into(),
            output,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<I, O> Transform for ConstTransform<I, O>
where
    I: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    type Input = I;
    type Output = O;

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Export
    }

    async fn execute(&self, _input: I) -> Result<O, TransformError> {
        Ok(self.output.clone())
    }
}

/// Sleeps before echoing, to produce measurable durations.
#[derive(Debug)]
pub struct SlowTransform {
    name: String,
    delay: Duration,
}

impl SlowTransform {
    /// Creates a transform that sleeps for `delay` per unit.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }
}

#[async_trait]
impl Transform for SlowTransform {
    type Input = String;
    type Output = String;

    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, input: String) -> Result<String, TransformError> {
        tokio::time::sleep(self.delay).await;
        Ok(input)
    }
}

/// A transform whose setup hook always fails.
#[derive(Debug)]
pub struct FailingSetupTransform {
    name: String,
    reason: String,
}

impl FailingSetupTransform {
    /// Creates a transform whose setup fails with `reason`.
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Transform for FailingSetupTransform {
    type Input = String;
    type Output = String;

    fn name(&self) -> &str {
        &self.name
    }

    async fn setup(&self) -> anyhow::Result<()> {
        anyhow::bail!("{}", self.reason)
    }

    async fn execute(&self, input: String) -> Result<String, TransformError> {
        Ok(input)
    }
}
