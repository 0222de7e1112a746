//! # imi-runner
//!
//! Batch entry point for IMI order-book reconstruction.
//!
//! Takes day files (or directories of them), fans them across a pool of
//! worker threads — one day per worker at a time, strictly single-threaded
//! within a day — and writes one JSON summary per day as the hand-off to the
//! downstream statistics stage.
//!
//! # Usage
//!
//! ```bash
//! imi-runner /data/imi/unzipped --workers 7 --output-dir summaries
//! ```

use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use tracing::{error, info, warn};

use imi_book::DayBundle;
use imi_core::config::{RunnerConfig, load_config};
use imi_core::types::ErrorSummary;

/// IMI market-data reconstruction runner.
#[derive(Parser)]
#[command(name = "imi-runner", about = "IMI order book reconstruction runner")]
struct Cli {
    /// Day files (`*_YYYY_MM_DD.bin`) or directories containing them.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of worker threads (default: available cores - 1).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Directory receiving one JSON summary per processed day.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Optional JSON config file; CLI flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// The per-day artifact written for downstream consumers.
#[derive(Debug, Serialize)]
struct DaySummary {
    date: String,
    books: usize,
    orders: usize,
    transactions: usize,
    quote_events: usize,
    snapshots: usize,
    system_events: usize,
    errors: ErrorSummary,
}

impl DaySummary {
    fn from_bundle(bundle: &DayBundle) -> Self {
        Self {
            date: bundle.date.clone(),
            books: bundle.books.len(),
            orders: bundle.order_count(),
            transactions: bundle.transaction_count(),
            quote_events: bundle.quote_event_count(),
            snapshots: bundle.snapshot_count(),
            system_events: bundle.system_event_count(),
            errors: bundle.errors.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Config file first, CLI flags on top
    let config = match &cli.config {
        Some(path) => load_config(path).with_context(|| format!("loading {}", path.display()))?,
        None => RunnerConfig::default(),
    };
    let log_level = cli.log_level.or(config.log_level.clone()).unwrap_or_else(|| "info".into());
    let log_dir = cli.log_dir.or(config.log_dir.clone());
    let output_dir = cli.output_dir.or(config.output_dir.clone());

    // 2. Logging
    imi_core::logging::init_logging(&log_level, log_dir.as_deref(), "imi-runner");

    // 3. Work list
    let files = collect_input_files(&cli.inputs)?;
    if files.is_empty() {
        bail!("no .bin day files found in the given inputs");
    }
    if let Some(dir) = &output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output dir {}", dir.display()))?;
    }

    let workers = cli
        .workers
        .or(config.workers)
        .unwrap_or_else(|| {
            let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(2);
            (cores - 1).max(1)
        })
        .min(files.len())
        .max(1);
    info!(days = files.len(), workers, "starting reconstruction run");

    // 4. Fan the day files across the worker pool
    let (work_tx, work_rx) = crossbeam_channel::unbounded::<PathBuf>();
    for file in files {
        // the receiver outlives every send
        let _ = work_tx.send(file);
    }
    drop(work_tx);

    let (done_tx, done_rx) = crossbeam_channel::unbounded::<Result<DaySummary, PathBuf>>();

    let mut processed = 0usize;
    let mut failed = 0usize;
    thread::scope(|scope| {
        for index in 0..workers {
            let work_rx = work_rx.clone();
            let done_tx = done_tx.clone();
            let output_dir = output_dir.clone();
            let core = config.core_for_worker(index);
            let spawned = thread::Builder::new()
                .name(format!("day-worker-{index}"))
                .spawn_scoped(scope, move || {
                    worker_loop(index, core, work_rx, done_tx, output_dir.as_deref());
                });
            if let Err(err) = spawned {
                error!(index, %err, "failed to spawn worker thread");
            }
        }
        drop(done_tx);

        // 5. Tally results as workers drain the queue
        for outcome in done_rx {
            match outcome {
                Ok(summary) => {
                    processed += 1;
                    info!(
                        date = %summary.date,
                        books = summary.books,
                        transactions = summary.transactions,
                        clean = summary.errors.is_clean(),
                        "day summarized"
                    );
                }
                Err(path) => {
                    failed += 1;
                    error!(path = %path.display(), "day lost");
                }
            }
        }
    });

    info!(processed, failed, "run finished");
    if failed > 0 {
        bail!("{failed} day(s) failed");
    }
    Ok(())
}

/// Process days off the queue until it is closed.
fn worker_loop(
    index: usize,
    core: Option<i32>,
    work_rx: Receiver<PathBuf>,
    done_tx: Sender<Result<DaySummary, PathBuf>>,
    output_dir: Option<&Path>,
) {
    pin_worker(index, core);
    while let Ok(path) = work_rx.recv() {
        match imi_book::process_day(&path) {
            Ok(bundle) => {
                let summary = DaySummary::from_bundle(&bundle);
                if let Some(dir) = output_dir
                    && let Err(err) = write_summary(dir, &path, &summary)
                {
                    error!(path = %path.display(), %err, "failed to write summary");
                }
                let _ = done_tx.send(Ok(summary));
            }
            Err(err) => {
                error!(path = %path.display(), %err, "day processing failed");
                let _ = done_tx.send(Err(path));
            }
        }
    }
}

/// Pin a day worker to the core its config row assigns, if any.
///
/// A worker runs one tight decode-and-apply loop per day; keeping it on a
/// fixed core avoids scheduler migration while several days run in parallel.
/// Failure to pin is logged and the worker runs unpinned.
fn pin_worker(index: usize, core: Option<i32>) {
    let Some(core) = core.filter(|id| *id >= 0) else {
        return;
    };
    let available = core_affinity::get_core_ids().unwrap_or_default();
    match available.get(core as usize) {
        Some(id) if core_affinity::set_for_current(*id) => {
            info!(worker = index, core, "day worker pinned to core");
        }
        _ => warn!(
            worker = index,
            core,
            cores = available.len(),
            "could not pin day worker; continuing unpinned"
        ),
    }
}

/// Expand directories to their `.bin` entries and sort the work list.
fn collect_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in std::fs::read_dir(input)
                .with_context(|| format!("reading {}", input.display()))?
            {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "bin") {
                    files.push(path);
                }
            }
        } else {
            files.push(input.clone());
        }
    }
    files.sort();
    Ok(files)
}

/// Write `<input stem>_summary.json` into the output directory.
fn write_summary(dir: &Path, input: &Path, summary: &DaySummary) -> Result<()> {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("day");
    let path = dir.join(format!("{stem}_summary.json"));
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(&path, json)?;
    Ok(())
}
