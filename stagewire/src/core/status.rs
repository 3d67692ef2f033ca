//! Stage kind enum and the terminal outcome trait.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a stage plays in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Entry stage that decodes raw units from the transport.
    Ingest,
    /// A stage that changes the form of its input.
    Transform,
    /// A stage that derives additional data from its input.
    Enrich,
    /// Terminal stage that hands results to an external sink.
    Export,
}

impl Default for StageKind {
    fn default() -> Self {
        Self::Transform
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingest => write!(f, "ingest"),
            Self::Transform => write!(f, "transform"),
            Self::Enrich => write!(f, "enrich"),
            Self::Export => write!(f, "export"),
        }
    }
}

/// A value a terminal stage can forward to the completion counter.
///
/// Truthy outcomes count as completed pipelines, everything else as
/// not completed.
pub trait Outcome {
    /// Returns true if the unit completed the pipeline successfully.
    fn is_completed(&self) -> bool;
}

impl Outcome for bool {
    fn is_completed(&self) -> bool {
        *self
    }
}

impl<T> Outcome for Option<T> {
    fn is_completed(&self) -> bool {
        self.is_some()
    }
}

impl<T, E> Outcome for Result<T, E> {
    fn is_completed(&self) -> bool {
        self.is_ok()
    }
}
