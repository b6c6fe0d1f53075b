//! Hash engines: content hashes (SHA-1, ED2K) and perceptual image hashes
//! (AHash, MHash, DHash family, PHash, LHash). `HashKind` is the closed set
//! of all recognized kinds; `WHash` is a reserved member with no
//! computation path (see [`crate::error::ConfigError::WHashRequested`]).

pub mod crypto;
pub mod dct;
pub mod hamming;
pub mod perceptual;

pub use hamming::{Distance, Hamming};

/// The closed set of hash algorithms this crate can be asked to compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashKind {
    Sha1,
    Ed2k,
    AHash,
    MHash,
    DHash,
    DHashV,
    DHashD,
    PHash,
    LHash,
    WHash,
}

impl HashKind {
    pub const ALL: [HashKind; 10] = [
        HashKind::Sha1,
        HashKind::Ed2k,
        HashKind::AHash,
        HashKind::MHash,
        HashKind::DHash,
        HashKind::DHashV,
        HashKind::DHashD,
        HashKind::PHash,
        HashKind::LHash,
        HashKind::WHash,
    ];

    /// The spelling used on the wire (CLI flags, CSV output) and in logs.
    pub fn canonical_name(self) -> &'static str {
        match self {
            HashKind::Sha1 => "SHA1",
            HashKind::Ed2k => "ED2K",
            HashKind::AHash => "AHash",
            HashKind::MHash => "MHash",
            HashKind::DHash => "DHash",
            HashKind::DHashV => "DHashV",
            HashKind::DHashD => "DHashD",
            HashKind::PHash => "PHash",
            HashKind::LHash => "LHash",
            HashKind::WHash => "WHash",
        }
    }

    pub fn from_canonical_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.canonical_name() == name)
    }

    /// True for the two whole-file content hashes; false for the perceptual
    /// image hashes.
    pub fn is_content_hash(self) -> bool {
        matches!(self, HashKind::Sha1 | HashKind::Ed2k)
    }

    pub fn is_perceptual_hash(self) -> bool {
        !self.is_content_hash() && self != HashKind::WHash
    }
}

impl std::fmt::Display for HashKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical_name())
    }
}
