//! Error taxonomy: one enum per fallible stage of the pipeline.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SniffError {
    #[error("no signature in the sniff table matched the first bytes of the file")]
    Unsupported,
    #[error("failed to read the file while sniffing its content type: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read the file while decoding it: {0}")]
    Io(#[from] std::io::Error),
    #[error("the image decoder rejected the file: {0}")]
    Decoder(#[from] image::ImageError),
    #[error("content type '{0}' is not a decodable image type")]
    UnsupportedForDecoding(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("a perceptual hasher was given an image with no pixels")]
    NilImage,
    #[error("hash vectors of unequal length cannot be compared")]
    LengthMismatch,
}

/// Raised while turning one path into a [`crate::descriptor::MediaDescriptor`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to open or stat '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("sniffing '{path}' failed: {source}")]
    Sniff {
        path: PathBuf,
        #[source]
        source: SniffError,
    },
    #[error("decoding '{path}' failed: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("hashing '{path}' failed: {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: HashError,
    },
}

impl BuildError {
    /// True for the one case the walker must drop silently rather than
    /// surface to the error sink.
    pub fn is_unsupported_media_type(&self) -> bool {
        matches!(
            self,
            BuildError::Sniff {
                source: SniffError::Unsupported,
                ..
            }
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to read the reference directory '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("the reference directory '{0}' contains no file that sniffs as a supported media type")]
    Empty(PathBuf),
    #[error("failed to build a descriptor for reference file '{path}': {source}")]
    Build {
        path: PathBuf,
        #[source]
        source: BuildError,
    },
    #[error("w-hash is advertised but not implemented")]
    WHashRequested,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("--source is required")]
    MissingSource,
    #[error("--target is required")]
    MissingTarget,
    #[error("unknown hash kind: '{0}'")]
    UnknownHashKind(String),
    #[error("w-hash is advertised but not implemented")]
    WHashRequested,
    #[error("the reference directory is empty or has no supported media files")]
    EmptyReferenceDir,
}

/// An error raised while a [`crate::pipeline::StageResult`]-producing stage
/// processes one descriptor. Forwarded to the pipeline's error sink; never
/// aborts the pipeline itself.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("{0}")]
    Other(String),
}
