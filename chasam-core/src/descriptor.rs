//! Media descriptor factory. A `MediaDescriptor` is built once per
//! candidate file, owns its hash fields write-once, and accumulates match
//! annotations append-only as it flows through the pipeline's stages.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use image::RgbImage;

use crate::decode;
use crate::error::BuildError;
use crate::hash::{crypto, perceptual, Hamming, HashKind};
use crate::sniff::{self, MediaKind};

/// One match found against a reference index entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchAnnotation {
    pub source_name: String,
    pub kind: HashKind,
    pub hamming_distance: u32,
}

/// In-memory record for one candidate file: its identity, sniffed type,
/// the subset of its enabled hashes, and the matches found against a
/// reference index so far.
#[derive(Debug)]
pub struct MediaDescriptor {
    path: PathBuf,
    name: String,
    kind: MediaKind,
    content_type: String,
    modified: Option<SystemTime>,
    content_hashes: HashMap<HashKind, String>,
    perceptual_hashes: HashMap<HashKind, Hamming>,
    matches: Vec<MatchAnnotation>,
}

impl MediaDescriptor {
    /// Build a descriptor for `path`: sniff, stat, and compute every hash in
    /// `enabled`. Perceptual hashes are skipped for video descriptors and
    /// the underlying pixel buffer is decoded at most once, lazily, only if
    /// at least one perceptual hash was requested.
    pub fn build(path: &Path, enabled: &[HashKind]) -> Result<MediaDescriptor, BuildError> {
        let io_err = |source: std::io::Error| BuildError::Io {
            path: path.to_owned(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let mut reader = BufReader::new(file);

        let content_type =
            sniff::sniff(&mut reader).map_err(|source| BuildError::Sniff {
                path: path.to_owned(),
                source,
            })?;
        let kind = MediaKind::from_content_type(&content_type).ok_or_else(|| BuildError::Sniff {
            path: path.to_owned(),
            source: crate::error::SniffError::Unsupported,
        })?;

        let metadata = std::fs::metadata(path).map_err(io_err)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = metadata.modified().ok();

        let mut descriptor = MediaDescriptor {
            path: path.to_owned(),
            name,
            kind,
            content_type,
            modified,
            content_hashes: HashMap::new(),
            perceptual_hashes: HashMap::new(),
            matches: Vec::new(),
        };

        let mut image: Option<RgbImage> = None;

        for &k in enabled {
            if k.is_content_hash() {
                let value = match k {
                    HashKind::Sha1 => crypto::sha1_hash(&mut reader),
                    HashKind::Ed2k => crypto::ed2k_hash(&mut reader),
                    _ => unreachable!(),
                }
                .map_err(io_err)?;
                descriptor.content_hashes.insert(k, value);
                continue;
            }

            if k == HashKind::WHash {
                continue; // rejected earlier, at config time; never reached in practice.
            }

            if descriptor.kind != MediaKind::Image {
                continue;
            }

            if image.is_none() {
                let decoded = decode::decode(&mut reader, &descriptor.content_type).map_err(
                    |source| BuildError::Decode {
                        path: path.to_owned(),
                        source,
                    },
                )?;
                image = Some(decoded);
            }

            let hash = compute_perceptual(k, image.as_ref().unwrap()).map_err(|source| {
                BuildError::Hash {
                    path: path.to_owned(),
                    source,
                }
            })?;
            descriptor.perceptual_hashes.insert(k, hash);
        }

        Ok(descriptor)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn content_hash(&self, kind: HashKind) -> Option<&str> {
        self.content_hashes.get(&kind).map(String::as_str)
    }

    pub fn perceptual_hash(&self, kind: HashKind) -> Option<Hamming> {
        self.perceptual_hashes.get(&kind).copied()
    }

    pub fn matches(&self) -> &[MatchAnnotation] {
        &self.matches
    }

    /// Append a match annotation. Never removes or rewrites a prior entry.
    pub fn push_match(&mut self, annotation: MatchAnnotation) {
        self.matches.push(annotation);
    }
}

fn compute_perceptual(kind: HashKind, img: &RgbImage) -> Result<Hamming, crate::error::HashError> {
    match kind {
        HashKind::AHash => perceptual::ahash(img),
        HashKind::MHash => perceptual::mhash(img),
        HashKind::DHash => perceptual::dhash(img),
        HashKind::DHashV => perceptual::dhash_vertical(img),
        HashKind::DHashD => perceptual::dhash_diagonal(img),
        HashKind::PHash => perceptual::phash(img),
        HashKind::LHash => perceptual::lhash(img),
        HashKind::Sha1 | HashKind::Ed2k | HashKind::WHash => unreachable!(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn write_png(path: &Path) {
        let img = RgbImage::from_fn(8, 8, |x, y| image::Rgb([(x * 30) as u8, (y * 30) as u8, 0]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn builds_descriptor_with_content_and_perceptual_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path);

        let enabled = [HashKind::Sha1, HashKind::PHash, HashKind::AHash];
        let d = MediaDescriptor::build(&path, &enabled).unwrap();

        assert_eq!(d.kind(), MediaKind::Image);
        assert_eq!(d.content_type(), "image/png");
        assert!(d.content_hash(HashKind::Sha1).is_some());
        assert!(d.perceptual_hash(HashKind::PHash).is_some());
        assert!(d.perceptual_hash(HashKind::AHash).is_some());
        assert!(d.perceptual_hash(HashKind::DHash).is_none());
    }

    #[test]
    fn type_is_prefix_of_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path);

        let d = MediaDescriptor::build(&path, &[HashKind::Sha1]).unwrap();
        let prefix = d.content_type().split('/').next().unwrap();
        assert_eq!(prefix, d.kind().as_str());
    }

    #[test]
    fn unsupported_file_fails_to_sniff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"not a media file at all").unwrap();

        let err = MediaDescriptor::build(&path, &[HashKind::Sha1]).unwrap_err();
        assert!(err.is_unsupported_media_type());
    }

    #[test]
    fn matches_are_append_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_png(&path);

        let mut d = MediaDescriptor::build(&path, &[HashKind::Sha1]).unwrap();
        assert!(d.matches().is_empty());
        d.push_match(MatchAnnotation {
            source_name: "ref.png".into(),
            kind: HashKind::Sha1,
            hamming_distance: 0,
        });
        assert_eq!(d.matches().len(), 1);
    }
}
