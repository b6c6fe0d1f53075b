//! Fluent pipeline facade: a builder-with-defaults surface
//! (`on_error`/`on_each`/`on_match`) that wires up and runs the full
//! walker-to-stages-to-sink pipeline in one call.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, SyncSender};

use crate::cancel::CancellationToken;
use crate::descriptor::MediaDescriptor;
use crate::hash::HashKind;
use crate::walker;
use crate::workers::{scoped_workers, WorkerScope};

use super::stage::StageResult;
use super::{PipelineError, StageFn};

const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Builds and runs a [`StageFn`] chain over descriptors produced by the
/// walker. Stages are tried in the order they were added with
/// [`Builder::on_each`]; with none added, every descriptor goes straight to
/// the sink (the identity pipeline).
pub struct Builder {
    stages: Vec<StageFn>,
    queue_capacity: usize,
    error_fn: Box<dyn FnMut(PipelineError) + Send>,
    match_fn: Box<dyn FnMut(MediaDescriptor) + Send>,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            stages: Vec::new(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            error_fn: Box::new(|e| log::error!("{e}")),
            match_fn: Box::new(|_| {}),
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default bounded-queue capacity (128) used between every
    /// stage, including the walker's head queue and the sink/error queues.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Register an error handler. Default: `log::error!` the formatted
    /// error.
    pub fn on_error(mut self, f: impl FnMut(PipelineError) + Send + 'static) -> Self {
        self.error_fn = Box::new(f);
        self
    }

    /// Append a stage to the chain.
    pub fn on_each(mut self, stage: StageFn) -> Self {
        self.stages.push(stage);
        self
    }

    /// Register the sink handler, called once per `Match` outcome. Stages
    /// run concurrently, so there is no guaranteed ordering across
    /// descriptors arriving from different stages.
    pub fn on_match(mut self, f: impl FnMut(MediaDescriptor) + Send + 'static) -> Self {
        self.match_fn = Box::new(f);
        self
    }

    /// Walk `roots`, run every descriptor through the stage chain, and
    /// block until the whole pipeline has drained: the walker has finished
    /// (or been cancelled), every stage has processed everything in its
    /// queue, and the error and sink handlers have seen everything sent to
    /// them.
    pub fn run(
        self,
        roots: &[PathBuf],
        enabled: &[HashKind],
        walk_concurrency: usize,
        cancel: &CancellationToken,
    ) {
        let Builder {
            stages,
            queue_capacity,
            mut error_fn,
            mut match_fn,
        } = self;

        let (head_tx, head_rx) = mpsc::sync_channel::<MediaDescriptor>(queue_capacity);
        let (build_err_tx, build_err_rx) = mpsc::sync_channel(queue_capacity);
        let (err_tx, err_rx) = mpsc::sync_channel::<PipelineError>(queue_capacity);
        let (match_tx, match_rx) = mpsc::sync_channel::<MediaDescriptor>(queue_capacity);

        scoped_workers(|scope: &mut WorkerScope<()>| {
            scope.spawn("walker-feeder", {
                let roots = roots.to_vec();
                let enabled = enabled.to_vec();
                let cancel = cancel.clone();
                move || {
                    walker::walk(
                        &roots,
                        &enabled,
                        walk_concurrency,
                        &cancel,
                        head_tx,
                        build_err_tx,
                    );
                }
            });

            scope.spawn("build-error-bridge", {
                let err_tx = err_tx.clone();
                move || {
                    for e in build_err_rx.iter() {
                        if err_tx.send(PipelineError::Build(e)).is_err() {
                            break;
                        }
                    }
                }
            });

            spawn_stage_chain(
                scope,
                stages,
                head_rx,
                match_tx.clone(),
                err_tx.clone(),
                cancel.clone(),
                queue_capacity,
            );

            drop(err_tx);
            drop(match_tx);

            scope.spawn("error-sink", move || {
                for e in err_rx.iter() {
                    error_fn(e);
                }
            });

            scope.spawn("match-sink", move || {
                for m in match_rx.iter() {
                    match_fn(m);
                }
            });
        });
    }
}

fn spawn_stage_chain<'scope, 'env>(
    scope: &mut WorkerScope<'scope, 'env, ()>,
    stages: Vec<StageFn>,
    head_rx: Receiver<MediaDescriptor>,
    match_tx: SyncSender<MediaDescriptor>,
    err_tx: SyncSender<PipelineError>,
    cancel: CancellationToken,
    queue_capacity: usize,
) {
    if stages.is_empty() {
        // Identity pipeline: forward every descriptor straight to the sink.
        scope.spawn("stage-identity", move || {
            for d in head_rx.iter() {
                if match_tx.send(d).is_err() {
                    break;
                }
            }
        });
        return;
    }

    let stage_count = stages.len();

    // inputs[i] is the queue stage i reads from; outputs[i] is the queue
    // stage i writes `Next` results to (`None` for the terminal stage).
    let mut inputs: Vec<Receiver<MediaDescriptor>> = Vec::with_capacity(stage_count);
    let mut outputs: Vec<Option<SyncSender<MediaDescriptor>>> = Vec::with_capacity(stage_count);

    inputs.push(head_rx);
    for _ in 0..stage_count - 1 {
        let (tx, rx) = mpsc::sync_channel(queue_capacity);
        outputs.push(Some(tx));
        inputs.push(rx);
    }
    outputs.push(None);

    for (i, ((stage, input), output)) in stages
        .into_iter()
        .zip(inputs.into_iter())
        .zip(outputs.into_iter())
        .enumerate()
    {
        let match_tx = match_tx.clone();
        let err_tx = err_tx.clone();
        let cancel = cancel.clone();

        scope.spawn(format!("stage-{i}-"), move || {
            for mut descriptor in input.iter() {
                match stage(&cancel, &mut descriptor) {
                    Ok(StageResult::Match) => {
                        if match_tx.send(descriptor).is_err() {
                            break;
                        }
                    }
                    Ok(StageResult::Next) => {
                        if let Some(out) = &output {
                            if out.send(descriptor).is_err() {
                                break;
                            }
                        }
                    }
                    Ok(StageResult::Skip) => {}
                    Err(e) => {
                        if err_tx.send(PipelineError::Stage(e)).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
}
