//! Directory walker. Recursively visits every root with the `walkdir`
//! crate, bounding the number of directories under concurrent visitation
//! with a counting semaphore backed by a condvar gate rather than an
//! unbounded channel. One scoped worker thread per root
//! (`crate::workers::scoped_workers`), each feeding descriptors into the
//! pipeline's head queue and routing unsupported-media-type errors to
//! nowhere (silently dropped) and every other build error to the error
//! sink.

use std::path::{Path, PathBuf};
use std::sync::mpsc::SyncSender;
use std::sync::{Condvar, Mutex};

use walkdir::WalkDir;

use crate::cancel::CancellationToken;
use crate::descriptor::MediaDescriptor;
use crate::error::BuildError;
use crate::hash::HashKind;
use crate::workers::{scoped_workers, WorkerScope};

/// A counting semaphore bounding how many directories are visited at once
/// across all root-walking workers.
struct Gate {
    state: Mutex<usize>,
    available: Condvar,
    capacity: usize,
}

impl Gate {
    fn new(capacity: usize) -> Self {
        Gate {
            state: Mutex::new(0),
            available: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    fn acquire(&self) {
        let mut taken = self.state.lock().unwrap();
        while *taken >= self.capacity {
            taken = self.available.wait(taken).unwrap();
        }
        *taken += 1;
    }

    fn release(&self) {
        let mut taken = self.state.lock().unwrap();
        *taken -= 1;
        self.available.notify_one();
    }
}

/// Walk every root in `roots`, emitting a [`MediaDescriptor`] for every file
/// that sniffs as a supported media type into `descriptors`, and every other
/// [`BuildError`] into `errors`. Closes `descriptors` only after every root
/// worker has finished. `concurrency` bounds the number of directories
/// visited at once across all roots.
pub fn walk(
    roots: &[PathBuf],
    enabled: &[HashKind],
    concurrency: usize,
    cancel: &CancellationToken,
    descriptors: SyncSender<MediaDescriptor>,
    errors: SyncSender<BuildError>,
) {
    let gate = Gate::new(concurrency);

    scoped_workers(|scope: &mut WorkerScope<()>| {
        for root in roots {
            let gate = &gate;
            let descriptors = descriptors.clone();
            let errors = errors.clone();
            scope.spawn("walker-", move || {
                walk_root(root, enabled, gate, cancel, &descriptors, &errors);
            });
        }
    });
}

fn walk_root(
    root: &Path,
    enabled: &[HashKind],
    gate: &Gate,
    cancel: &CancellationToken,
    descriptors: &SyncSender<MediaDescriptor>,
    errors: &SyncSender<BuildError>,
) {
    // Permits currently held, one per open ancestor directory, indexed by
    // walkdir's `depth()`. Released as the traversal backtracks past them.
    let mut held_until_depth: Vec<usize> = Vec::new();

    let mut it = WalkDir::new(root).into_iter();
    loop {
        if cancel.is_cancelled() {
            break;
        }

        let entry = match it.next() {
            None => break,
            Some(Ok(e)) => e,
            Some(Err(err)) => {
                log::warn!("walking '{}' failed: {err}", root.display());
                continue;
            }
        };

        while let Some(&depth) = held_until_depth.last() {
            if entry.depth() <= depth {
                held_until_depth.pop();
                gate.release();
            } else {
                break;
            }
        }

        if entry.file_type().is_dir() {
            if cancel.is_cancelled() {
                it.skip_current_dir();
                continue;
            }
            gate.acquire();
            held_until_depth.push(entry.depth());
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        match MediaDescriptor::build(entry.path(), enabled) {
            Ok(descriptor) => {
                if descriptors.send(descriptor).is_err() {
                    break;
                }
            }
            Err(e) if e.is_unsupported_media_type() => {}
            Err(e) => {
                if errors.send(e).is_err() {
                    break;
                }
            }
        }
    }

    for _ in held_until_depth.drain(..) {
        gate.release();
    }
}
