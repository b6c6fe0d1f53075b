//! Reference index. Built once, read-only thereafter, shared across
//! pipeline stages behind an `Arc`. Enumerates a reference directory
//! **non-recursively** and hashes every entry in parallel via `rayon`, then
//! folds into two maps: an O(1) content-hash lookup and a linear-scan
//! perceptual lookup.

use std::collections::HashMap;
use std::path::Path;

use rayon::prelude::*;

use crate::descriptor::MediaDescriptor;
use crate::error::IndexError;
use crate::hash::{Hamming, HashKind};

pub struct ReferenceIndex {
    content_table: HashMap<HashKind, HashMap<String, String>>,
    perceptual_table: HashMap<HashKind, Vec<(Hamming, String)>>,
}

impl ReferenceIndex {
    /// Build an index over every file directly inside `dir` (no recursion)
    /// that sniffs as a supported media type, computing the hashes in
    /// `enabled`. Fails with [`IndexError::Empty`] if no entry qualifies.
    pub fn build(dir: &Path, enabled: &[HashKind]) -> Result<ReferenceIndex, IndexError> {
        if enabled.contains(&HashKind::WHash) {
            return Err(IndexError::WHashRequested);
        }

        let entries: Vec<_> = std::fs::read_dir(dir)
            .map_err(|source| IndexError::Io {
                path: dir.to_owned(),
                source,
            })?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .collect();

        let descriptors: Vec<MediaDescriptor> = entries
            .par_iter()
            .filter_map(|entry| {
                let path = entry.path();
                match MediaDescriptor::build(&path, enabled) {
                    Ok(d) => Some(d),
                    Err(e) if e.is_unsupported_media_type() => None,
                    Err(e) => {
                        log::warn!("skipping reference file '{}': {e}", path.display());
                        None
                    }
                }
            })
            .collect();

        if descriptors.is_empty() {
            return Err(IndexError::Empty(dir.to_owned()));
        }

        let mut content_table: HashMap<HashKind, HashMap<String, String>> = HashMap::new();
        let mut perceptual_table: HashMap<HashKind, Vec<(Hamming, String)>> = HashMap::new();

        for d in &descriptors {
            for &kind in enabled {
                if let Some(hex) = d.content_hash(kind) {
                    let table = content_table.entry(kind).or_default();
                    if let Some(prev) = table.insert(hex.to_owned(), d.name().to_owned()) {
                        log::warn!(
                            "duplicate {kind} value '{hex}' in reference index: '{prev}' overwritten by '{}'",
                            d.name()
                        );
                    }
                } else if let Some(hash) = d.perceptual_hash(kind) {
                    perceptual_table
                        .entry(kind)
                        .or_default()
                        .push((hash, d.name().to_owned()));
                }
            }
        }

        Ok(ReferenceIndex {
            content_table,
            perceptual_table,
        })
    }

    /// Expected-O(1) exact lookup for a content hash's hex string.
    pub fn find_content(&self, kind: HashKind, hex: &str) -> Option<&str> {
        self.content_table
            .get(&kind)
            .and_then(|table| table.get(hex))
            .map(String::as_str)
    }

    /// Linear scan for the closest reference entry within `threshold`,
    /// resolved by minimum distance with a lexicographic tiebreak on
    /// source name so the result is deterministic regardless of insertion
    /// order.
    pub fn find_perceptual(
        &self,
        kind: HashKind,
        hash: Hamming,
        threshold: u32,
    ) -> Option<(&str, u32)> {
        let entries = self.perceptual_table.get(&kind)?;

        entries
            .iter()
            .map(|(h, name)| (name.as_str(), hash.distance_to(*h)))
            .filter(|&(_, dist)| dist <= threshold)
            .min_by(|(name_a, dist_a), (name_b, dist_b)| {
                dist_a.cmp(dist_b).then_with(|| name_a.cmp(name_b))
            })
    }
}
