//! Load generator for the rotating file logger.
//!
//! Spawns a number of threads that each write a fixed number of records
//! through one shared logger and reports the elapsed time.
#![warn(missing_docs)]

use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use rotolog::{FileLoggerConfig, Level, RollingLogger};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Logger could not be opened
    #[error(transparent)]
    Logger(#[from] rotolog::Error),

    /// Final flush failed
    #[error("flush failed: {0}")]
    Flush(#[from] std::io::Error),

    /// A writer thread panicked
    #[error("writer thread {0} panicked")]
    WriterPanicked(usize),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of the active log file
    #[arg(long, default_value = "logs/bench.log", env = "ROTOLOG_BENCH_PATH")]
    path: PathBuf,

    /// Number of writer threads
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Records written by each thread
    #[arg(long, default_value_t = 100_000)]
    records: usize,

    /// Size threshold of the active file in kilobytes
    #[arg(long, default_value_t = 2000)]
    max_size_kb: u64,

    /// Files kept in the rotation chain, 0 disables rotation
    #[arg(long, default_value_t = 10)]
    max_files: i32,

    /// Write buffer size in kilobytes
    #[arg(long, default_value_t = rotolog::DEFAULT_BUFFER_SIZE_KB)]
    buffer_size_kb: usize,

    /// Level of the generated records
    #[arg(long, default_value_t = Level::Info)]
    level: Level,

    /// Timestamp records in UTC
    #[arg(long)]
    utc: bool,
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = FileLoggerConfig::builder(&args.path)
        .max_size_kb(args.max_size_kb)
        .max_files(args.max_files)
        .buffer_size_kb(args.buffer_size_kb)
        .utc(args.utc)
        .build()?;
    let logger = Arc::new(RollingLogger::open(config)?);

    info!(
        path = %args.path.display(),
        threads = args.threads,
        records = args.records,
        "starting writers"
    );

    let elapsed = run(&logger, &args)?;
    logger.shutdown()?;

    let total = args.threads * args.records;
    let divisor = u32::try_from(total).unwrap_or(u32::MAX).max(1);
    let per_record = elapsed / divisor;
    info!(
        total,
        elapsed_ms = elapsed.as_millis() as u64,
        per_record_ns = per_record.as_nanos() as u64,
        dropped = logger.dropped_records(),
        "finished"
    );

    Ok(())
}

fn run(logger: &Arc<RollingLogger>, args: &Args) -> Result<Duration, Error> {
    let barrier = Arc::new(Barrier::new(args.threads + 1));

    let handles: Vec<_> = (0..args.threads)
        .map(|worker| {
            let logger = Arc::clone(logger);
            let barrier = Arc::clone(&barrier);
            let (records, level) = (args.records, args.level);
            thread::spawn(move || {
                barrier.wait();
                for seq in 0..records {
                    rotolog::log!(logger, level, "worker {} wrote record {}", worker, seq);
                }
            })
        })
        .collect();

    barrier.wait();
    let started = Instant::now();
    for (worker, handle) in handles.into_iter().enumerate() {
        handle.join().map_err(|_| Error::WriterPanicked(worker))?;
    }
    let elapsed = started.elapsed();

    logger.flush()?;
    Ok(elapsed)
}
