//! End-to-end pipeline scenarios covering the full walker-to-sink path.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use chasam_core::descriptor::MediaDescriptor;
use chasam_core::hash::HashKind;
use chasam_core::pipeline::{Builder, StageResult};
use chasam_core::sniff::MediaKind;
use chasam_core::{CancellationToken, ReferenceIndex};

fn write_png(path: &std::path::Path, w: u32, h: u32, seed: u8) {
    let img = image::RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([
            ((x + seed as u32) % 256) as u8,
            ((y + seed as u32) % 256) as u8,
            seed,
        ])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    fs::write(path, bytes).unwrap();
}

fn write_blurred_variant(path: &std::path::Path, w: u32, h: u32, seed: u8) {
    let img = image::RgbImage::from_fn(w, h, |x, y| {
        let base = ((x + seed as u32) % 256) as u8;
        image::Rgb([base.saturating_add(3), base, seed])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    fs::write(path, bytes).unwrap();
}

#[test]
fn identity_pipeline_matches_on_sha1() {
    let refdir = tempfile::tempdir().unwrap();
    let targetdir = tempfile::tempdir().unwrap();

    write_png(&refdir.path().join("A.png"), 6, 6, 11);
    write_png(&targetdir.path().join("A.png"), 6, 6, 11);
    write_png(&targetdir.path().join("B.png"), 6, 6, 99);

    let index = Arc::new(ReferenceIndex::build(refdir.path(), &[HashKind::Sha1]).unwrap());
    let cancel = CancellationToken::new();

    let matches = Arc::new(Mutex::new(Vec::new()));
    let matches_clone = matches.clone();

    let idx = index.clone();
    let builder = Builder::new()
        .on_each(Box::new(move |_cancel, descriptor| {
            let Some(hex) = descriptor.content_hash(HashKind::Sha1) else {
                return Ok(StageResult::Next);
            };
            let hex = hex.to_owned();
            Ok(match idx.find_content(HashKind::Sha1, &hex) {
                Some(source) => {
                    descriptor.push_match(chasam_core::MatchAnnotation {
                        source_name: source.to_owned(),
                        kind: HashKind::Sha1,
                        hamming_distance: 0,
                    });
                    StageResult::Match
                }
                None => StageResult::Next,
            })
        }))
        .on_match(move |descriptor| {
            let m = descriptor.matches().last().unwrap().clone();
            matches_clone
                .lock()
                .unwrap()
                .push((m.source_name, descriptor.name().to_owned(), m.hamming_distance));
        });

    builder.run(
        &[targetdir.path().to_owned()],
        &[HashKind::Sha1],
        2,
        &cancel,
    );

    let matches = matches.lock().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0], ("A.png".to_owned(), "A.png".to_owned(), 0));
}

#[test]
fn filter_then_phash_matches_near_duplicate() {
    let refdir = tempfile::tempdir().unwrap();
    let targetdir = tempfile::tempdir().unwrap();

    write_png(&refdir.path().join("lenna.png"), 40, 40, 20);
    write_png(&targetdir.path().join("lenna.png"), 40, 40, 20);
    write_blurred_variant(&targetdir.path().join("lenna-blur.png"), 40, 40, 20);

    let index = Arc::new(ReferenceIndex::build(refdir.path(), &[HashKind::PHash]).unwrap());
    let cancel = CancellationToken::new();

    let matches = Arc::new(Mutex::new(Vec::new()));
    let matches_clone = matches.clone();

    let filter_stage: chasam_core::StageFn = Box::new(|_cancel, descriptor| {
        Ok(if descriptor.kind() == MediaKind::Image {
            StageResult::Next
        } else {
            StageResult::Skip
        })
    });

    let idx = index.clone();
    let phash_stage: chasam_core::StageFn = Box::new(move |_cancel, descriptor| {
        let Some(hash) = descriptor.perceptual_hash(HashKind::PHash) else {
            return Ok(StageResult::Next);
        };
        Ok(match idx.find_perceptual(HashKind::PHash, hash, 10) {
            Some((source, distance)) => {
                descriptor.push_match(chasam_core::MatchAnnotation {
                    source_name: source.to_owned(),
                    kind: HashKind::PHash,
                    hamming_distance: distance,
                });
                StageResult::Match
            }
            None => StageResult::Next,
        })
    });

    let builder = Builder::new()
        .on_each(filter_stage)
        .on_each(phash_stage)
        .on_match(move |descriptor| {
            let m = descriptor.matches().last().unwrap().clone();
            matches_clone.lock().unwrap().push((
                descriptor.name().to_owned(),
                m.source_name,
                m.hamming_distance,
            ));
        });

    builder.run(
        &[targetdir.path().to_owned()],
        &[HashKind::PHash],
        2,
        &cancel,
    );

    let matches = matches.lock().unwrap();
    let blur_match = matches
        .iter()
        .find(|(name, ..)| name == "lenna-blur.png");
    assert!(
        blur_match.is_some(),
        "expected lenna-blur.png to match lenna.png within distance 10"
    );
    let (_, source, distance) = blur_match.unwrap();
    assert_eq!(source, "lenna.png");
    assert!(*distance <= 10);
}

#[test]
fn skip_path_drops_video_with_no_rows_or_errors() {
    let refdir = tempfile::tempdir().unwrap();
    write_png(&refdir.path().join("ref.png"), 6, 6, 1);
    let targetdir = tempfile::tempdir().unwrap();

    // Minimal ISO BMFF "ftyp" box identifying as an mp4, just enough for
    // the sniffer's signature table to classify it as video/mp4.
    let mut mp4 = Vec::new();
    mp4.extend_from_slice(&28u32.to_be_bytes());
    mp4.extend_from_slice(b"ftypmp42");
    mp4.extend_from_slice(b"mp42isom");
    mp4.extend_from_slice(b"mp41\0\0\0\0");
    fs::write(targetdir.path().join("clip.mp4"), mp4).unwrap();

    let cancel = CancellationToken::new();
    let matches = Arc::new(Mutex::new(0usize));
    let errors = Arc::new(Mutex::new(0usize));
    let matches_clone = matches.clone();
    let errors_clone = errors.clone();

    let filter_stage: chasam_core::StageFn = Box::new(|_cancel, descriptor| {
        Ok(if descriptor.kind() == MediaKind::Image {
            StageResult::Next
        } else {
            StageResult::Skip
        })
    });

    let builder = Builder::new()
        .on_each(filter_stage)
        .on_error(move |_e| {
            *errors_clone.lock().unwrap() += 1;
        })
        .on_match(move |_d| {
            *matches_clone.lock().unwrap() += 1;
        });

    builder.run(&[targetdir.path().to_owned()], &[], 2, &cancel);

    assert_eq!(*matches.lock().unwrap(), 0);
    assert_eq!(*errors.lock().unwrap(), 0);
}

#[test]
fn truncated_jpeg_surfaces_a_build_error() {
    let targetdir = tempfile::tempdir().unwrap();
    // A JPEG SOI marker followed by garbage: sniffs as image/jpeg but fails
    // to decode.
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(&[0u8; 16]);
    fs::write(targetdir.path().join("broken.jpg"), bytes).unwrap();

    let cancel = CancellationToken::new();
    let errors = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = errors.clone();
    let matches = Arc::new(Mutex::new(0usize));
    let matches_clone = matches.clone();

    let builder = Builder::new()
        .on_error(move |e| errors_clone.lock().unwrap().push(e.to_string()))
        .on_match(move |_d| *matches_clone.lock().unwrap() += 1);

    builder.run(
        &[targetdir.path().to_owned()],
        &[HashKind::AHash],
        2,
        &cancel,
    );

    assert_eq!(*matches.lock().unwrap(), 0);
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
}

#[test]
fn cancellation_before_first_descriptor_returns_cleanly() {
    let targetdir = tempfile::tempdir().unwrap();
    for i in 0..20u8 {
        write_png(&targetdir.path().join(format!("f{i}.png")), 4, 4, i);
    }

    let cancel = CancellationToken::new();
    cancel.cancel();

    let matches = Arc::new(Mutex::new(0usize));
    let matches_clone = matches.clone();
    let builder = Builder::new().on_match(move |_d| *matches_clone.lock().unwrap() += 1);

    builder.run(
        &[targetdir.path().to_owned()],
        &[HashKind::AHash],
        2,
        &cancel,
    );

    // Cancellation observed at the walker's first loop iteration means at
    // most a handful of in-flight descriptors can still land; the bulk of
    // the 20 files must never be visited.
    assert!(*matches.lock().unwrap() < 20);
}

#[test]
fn empty_target_directory_completes_with_zero_matches() {
    let targetdir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();

    let matches = Arc::new(Mutex::new(0usize));
    let errors = Arc::new(Mutex::new(0usize));
    let matches_clone = matches.clone();
    let errors_clone = errors.clone();

    let builder = Builder::new()
        .on_error(move |_e| *errors_clone.lock().unwrap() += 1)
        .on_match(move |_d| *matches_clone.lock().unwrap() += 1);

    builder.run(
        &[targetdir.path().to_owned()],
        &[HashKind::AHash],
        2,
        &cancel,
    );

    assert_eq!(*matches.lock().unwrap(), 0);
    assert_eq!(*errors.lock().unwrap(), 0);
}

#[test]
fn reference_directory_of_only_unsupported_files_is_empty_index_error() {
    let refdir = tempfile::tempdir().unwrap();
    fs::write(refdir.path().join("notes.txt"), b"plain text, not media").unwrap();

    let result = ReferenceIndex::build(refdir.path(), &[HashKind::Sha1]);
    assert!(matches!(
        result,
        Err(chasam_core::IndexError::Empty(_))
    ));
}

#[test]
fn descriptor_build_is_independent_of_unused_helpers() {
    // Sanity check that MediaDescriptor::build is reachable directly, not
    // only through the walker -- exercised by the reference-index build
    // pass in the other tests above, exercised directly here too.
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("solo.png");
    write_png(&path, 8, 8, 5);

    let descriptor = MediaDescriptor::build(&path, &[HashKind::Sha1, HashKind::AHash]).unwrap();
    assert!(descriptor.content_hash(HashKind::Sha1).is_some());
    assert!(descriptor.perceptual_hash(HashKind::AHash).is_some());
}

#[test]
fn back_pressure_keeps_walker_from_outrunning_a_slow_sink() {
    let targetdir = tempfile::tempdir().unwrap();
    for i in 0..40u8 {
        write_png(&targetdir.path().join(format!("f{i}.png")), 4, 4, i);
    }

    let cancel = CancellationToken::new();
    let seen = Arc::new(Mutex::new(0usize));
    let seen_clone = seen.clone();
    let (done_tx, done_rx) = mpsc::channel();

    let builder = Builder::new()
        .queue_capacity(4)
        .on_match(move |_d| {
            std::thread::sleep(std::time::Duration::from_millis(5));
            *seen_clone.lock().unwrap() += 1;
        });

    let roots = vec![targetdir.path().to_owned()];
    std::thread::spawn(move || {
        builder.run(&roots, &[HashKind::AHash], 4, &cancel);
        done_tx.send(()).unwrap();
    });

    // Mid-run, the sink cannot have drained everything yet: a bounded queue
    // capacity of 4 means the walker must have blocked on send rather than
    // buffering all 40 descriptors in memory.
    std::thread::sleep(std::time::Duration::from_millis(20));
    let mid_run = *seen.lock().unwrap();
    assert!(mid_run < 40);

    done_rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
    assert_eq!(*seen.lock().unwrap(), 40);
}
