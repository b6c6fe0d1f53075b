//! Concurrent media-hash search pipeline: sniff a file's content type,
//! decode it if it's an image, compute content and perceptual hashes, and
//! stream the result through an ordered chain of stages to a sink, matching
//! descriptors against a reference index along the way.

pub mod cancel;
pub mod decode;
pub mod descriptor;
pub mod error;
pub mod hash;
pub mod index;
pub mod pipeline;
pub mod sniff;
pub mod walker;
pub mod workers;

pub use cancel::CancellationToken;
pub use descriptor::{MatchAnnotation, MediaDescriptor};
pub use error::{BuildError, ConfigError, DecodeError, HashError, IndexError, SniffError, StageError};
pub use hash::HashKind;
pub use index::ReferenceIndex;
pub use pipeline::{Builder, PipelineError, StageFn, StageResult};
pub use sniff::MediaKind;
