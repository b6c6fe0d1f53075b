//! Argument parsing and validation: a raw `clap` struct that parses, and a
//! separate validated `RunConfig` that carries checked values into the run.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use chasam_core::error::ConfigError;
use chasam_core::HashKind;
use clap::Parser;

/// Finds media files whose content or perceptual hash matches a reference
/// corpus.
#[derive(Parser, Debug)]
#[command(name = "chasam")]
pub struct Cli {
    /// Directory of reference media to compare against (non-recursive).
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Comma-separated list of directories to search (recursive).
    #[arg(long, value_delimiter = ',')]
    pub target: Vec<PathBuf>,

    /// Comma-separated list of hash kinds to compute, in the order they
    /// are tried as pipeline stages (default: d-hash). Accepts
    /// `sha1,ed2k,a-hash,m-hash,d-hash,d-hash-v,d-hash-d,p-hash,l-hash,
    /// w-hash` -- `w-hash` is documented but always rejected.
    #[arg(long, default_value = "d-hash", value_delimiter = ',')]
    pub hash: Vec<String>,

    /// Maximum Hamming distance accepted as a perceptual match.
    #[arg(long, default_value_t = 10)]
    pub hamming: u32,

    /// Number of concurrent directory visitors used by the walker.
    #[arg(long)]
    pub cpu: Option<usize>,

    /// A file to additionally write the logs to.
    #[arg(long)]
    pub logfile: Option<PathBuf>,
}

/// The validated, ready-to-run configuration. `chasam_core` itself never
/// parses strings -- everything it receives is already a concrete Rust
/// value.
#[derive(Debug)]
pub struct RunConfig {
    pub source: PathBuf,
    pub targets: Vec<PathBuf>,
    pub hashes: Vec<HashKind>,
    pub hamming: u32,
    pub cpu: usize,
    pub logfile: Option<PathBuf>,
}

fn parse_hash_token(token: &str) -> Result<HashKind, ConfigError> {
    let canonical = match token.to_ascii_lowercase().as_str() {
        "sha1" => "SHA1",
        "ed2k" => "ED2K",
        "a-hash" | "ahash" => "AHash",
        "m-hash" | "mhash" => "MHash",
        "d-hash" | "dhash" => "DHash",
        "d-hash-v" | "dhashv" => "DHashV",
        "d-hash-d" | "dhashd" => "DHashD",
        "p-hash" | "phash" => "PHash",
        "l-hash" | "lhash" => "LHash",
        "w-hash" | "whash" => "WHash",
        _ => return Err(ConfigError::UnknownHashKind(token.to_owned())),
    };

    let kind = HashKind::from_canonical_name(canonical)
        .ok_or_else(|| ConfigError::UnknownHashKind(token.to_owned()))?;
    if kind == HashKind::WHash {
        return Err(ConfigError::WHashRequested);
    }
    Ok(kind)
}

impl Cli {
    pub fn into_run_config(self) -> Result<RunConfig, ConfigError> {
        let source = self.source.ok_or(ConfigError::MissingSource)?;
        if self.target.is_empty() {
            return Err(ConfigError::MissingTarget);
        }

        let hashes = self
            .hash
            .iter()
            .map(|t| parse_hash_token(t))
            .collect::<Result<Vec<_>, _>>()?;

        let cpu = self.cpu.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        });

        Ok(RunConfig {
            source,
            targets: self.target,
            hashes,
            hamming: self.hamming,
            cpu,
            logfile: self.logfile,
        })
    }
}
