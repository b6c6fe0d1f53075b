//! A pipeline stage applies one predicate to each descriptor it receives
//! and reports what should happen to it next.

use crate::cancel::CancellationToken;
use crate::descriptor::MediaDescriptor;
use crate::error::StageError;

/// The outcome of running one stage over one descriptor.
#[derive(Debug)]
pub enum StageResult {
    /// Push the descriptor to the sink; it does not continue downstream.
    Match,
    /// Push the descriptor to the next stage's queue (or drop it, if this
    /// is the terminal stage).
    Next,
    /// Drop the descriptor; it reaches neither the sink nor downstream.
    Skip,
}

/// A stage function: given the cancellation token and ownership of one
/// descriptor, decide its fate. Boxed so a [`super::builder::Builder`] can
/// hold a heterogeneous, ordered list of them.
pub type StageFn = Box<dyn Fn(&CancellationToken, &mut MediaDescriptor) -> Result<StageResult, StageError> + Send + Sync>;
