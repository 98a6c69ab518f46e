//! Many threads writing through one logger

// Records are written at every level, so all of them must be compiled in.
#![cfg(not(any(
    feature = "min-level-debug",
    feature = "min-level-info",
    feature = "min-level-warn",
    feature = "min-level-error",
    feature = "min-level-fatal",
    feature = "min-level-off"
)))]

mod common;

use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

use common::{init_tracing, read_lines};
use rotolog::{ParsedRecord, RollingLogger};
use tempfile::tempdir;

const THREADS: usize = 8;
const RECORDS: usize = 2_000;

fn run_writers(logger: &Arc<RollingLogger>) {
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let logger = Arc::clone(logger);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for seq in 0..RECORDS {
                    rotolog::info!(logger, "worker={worker} seq={seq}");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

/// Every line parses and every worker's sequence is complete and in order
fn check_records(lines: &[String]) {
    assert_eq!(lines.len(), THREADS * RECORDS);

    let mut next_seq: HashMap<usize, usize> = HashMap::new();
    for line in lines {
        let record = ParsedRecord::parse(line).unwrap();
        let (worker, seq) = record
            .message
            .strip_prefix("worker=")
            .and_then(|rest| rest.split_once(" seq="))
            .unwrap();
        let worker: usize = worker.parse().unwrap();
        let seq: usize = seq.parse().unwrap();

        let expected = next_seq.entry(worker).or_default();
        assert_eq!(seq, *expected, "worker {worker} out of order");
        *expected += 1;
    }
    assert!(next_seq.values().all(|&count| count == RECORDS));
}

#[test]
fn test_concurrent_writes_without_rotation() {
    init_tracing();
    let dir = tempdir().unwrap();
    let logger = Arc::new(RollingLogger::init(dir.path().join("app.log"), 0, 0, 64).unwrap());

    run_writers(&logger);
    logger.flush().unwrap();

    let lines = read_lines(&logger.active_path());
    check_records(&lines);
    assert_eq!(
        logger.current_file_size(),
        fs::metadata(logger.active_path()).unwrap().len()
    );
    assert_eq!(logger.dropped_records(), 0);
}

#[test]
fn test_concurrent_writes_with_rotation() {
    init_tracing();
    let dir = tempdir().unwrap();
    // Large enough that no record is lost off the end of the chain.
    let logger = Arc::new(RollingLogger::init(dir.path().join("app.log"), 100, 64, 16).unwrap());

    run_writers(&logger);
    logger.shutdown().unwrap();

    let mut lines = Vec::new();
    for index in (0..64).rev() {
        let path = logger.file_path(index);
        let size = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
        assert!(size <= 100_000, "{} is {size} bytes", path.display());
        lines.extend(read_lines(&path));
    }
    assert!(logger.file_path(1).exists());
    check_records(&lines);
}
