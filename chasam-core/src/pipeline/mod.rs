//! Staged search pipeline: an ordered chain of stage worker threads
//! connected by bounded channels, fed by the walker and draining into a
//! match sink and an error sink.

pub mod builder;
pub mod stage;

pub use builder::Builder;
pub use stage::{StageFn, StageResult};

use crate::error::{BuildError, StageError};

/// Unifies the two error sources that land on the pipeline's single error
/// queue: the walker's per-file build failures, and a stage's per-descriptor
/// processing failures.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Stage(#[from] StageError),
}
