//! `chasam`: walks one or more directories, computes content and
//! perceptual hashes for every media file found, and reports matches
//! against a reference corpus. One pipeline stage per enabled hash kind,
//! tried in the order given on the command line.

mod cli;
mod logging;
mod output;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chasam_core::descriptor::MatchAnnotation;
use chasam_core::hash::HashKind;
use chasam_core::pipeline::{Builder, PipelineError, StageResult};
use chasam_core::{CancellationToken, ReferenceIndex};
use clap::Parser;
use color_eyre::eyre::{self, Context};

use cli::{Cli, RunConfig};
use output::MatchWriter;

fn make_hash_stage(kind: HashKind, index: Arc<ReferenceIndex>, threshold: u32) -> chasam_core::StageFn {
    Box::new(move |_cancel, descriptor| {
        if kind.is_content_hash() {
            let Some(hex) = descriptor.content_hash(kind) else {
                return Ok(StageResult::Next);
            };
            let hex = hex.to_owned();
            return Ok(match index.find_content(kind, &hex) {
                Some(source) => {
                    descriptor.push_match(MatchAnnotation {
                        source_name: source.to_owned(),
                        kind,
                        hamming_distance: 0,
                    });
                    StageResult::Match
                }
                None => StageResult::Next,
            });
        }

        let Some(hash) = descriptor.perceptual_hash(kind) else {
            return Ok(StageResult::Next);
        };
        Ok(match index.find_perceptual(kind, hash, threshold) {
            Some((source, distance)) => {
                descriptor.push_match(MatchAnnotation {
                    source_name: source.to_owned(),
                    kind,
                    hamming_distance: distance,
                });
                StageResult::Match
            }
            None => StageResult::Next,
        })
    })
}

fn install_signal_handler(cancel: CancellationToken) -> eyre::Result<()> {
    let flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    for sig in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(sig, flag.clone())
            .wrap_err("failed to register a signal handler")?;
    }

    std::thread::spawn(move || loop {
        if flag.load(Ordering::SeqCst) {
            cancel.cancel();
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    });

    Ok(())
}

fn run(config: RunConfig) -> eyre::Result<()> {
    log::info!("Building the reference index from: {}", config.source.display());
    let index = ReferenceIndex::build(&config.source, &config.hashes)
        .map_err(|e| eyre::eyre!("{e}"))
        .wrap_err("failed to build the reference index")?;
    let index = Arc::new(index);

    let cancel = CancellationToken::new();
    install_signal_handler(cancel.clone())?;

    let writer = Mutex::new(MatchWriter::new(std::io::stdout()).wrap_err("failed to open stdout for CSV output")?);
    let match_count = AtomicU64::new(0);

    let mut builder = Builder::new().on_error(|e: PipelineError| {
        log::error!("{e}");
    });

    for &kind in &config.hashes {
        builder = builder.on_each(make_hash_stage(kind, index.clone(), config.hamming));
    }

    builder = builder.on_match(move |descriptor| {
        match_count.fetch_add(1, Ordering::Relaxed);
        if let Some(m) = descriptor.matches().last() {
            let mut writer = writer.lock().unwrap();
            if let Err(e) = writer.write_match(
                &m.source_name,
                descriptor.name(),
                descriptor.path(),
                m.kind,
                m.hamming_distance,
            ) {
                log::error!("failed to write a match row: {e}");
            }
        }
        log::info!("match count so far: {}", match_count.load(Ordering::Relaxed));
    });

    let started = Instant::now();
    builder.run(&config.targets, &config.hashes, config.cpu, &cancel);
    log::info!("search completed in {:?}", started.elapsed());

    Ok(())
}

fn main() -> eyre::Result<()> {
    logging::init_eyre()?;
    let cli = Cli::parse();
    logging::init_logger(cli.logfile.as_deref())?;

    let config = cli
        .into_run_config()
        .map_err(|e| eyre::eyre!("{e}"))
        .wrap_err("invalid configuration")?;

    run(config)
}
