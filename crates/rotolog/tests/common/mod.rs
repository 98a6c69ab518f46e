//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rotolog::{CallSite, ParsedRecord};

/// Route the logger's own diagnostics to the test output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Call site whose records are `FIXED_WIDTH + 6 + message` bytes long
pub fn short_site() -> CallSite {
    CallSite::new("t", "a.rs", 1)
}

/// Lines of a log file, empty if it does not exist
pub fn read_lines(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(contents) => contents.lines().map(str::to_owned).collect(),
        Err(_) => Vec::new(),
    }
}

/// Messages of every record in a log file
pub fn read_messages(path: &Path) -> Vec<String> {
    read_lines(path)
        .iter()
        .map(|line| {
            ParsedRecord::parse(line)
                .unwrap_or_else(|e| panic!("unparseable line {line:?}: {e}"))
                .message
                .to_string()
        })
        .collect()
}

/// Every file name in `dir`, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Paths of a chain from the active file up to index `count - 1`
pub fn chain_paths(logger: &rotolog::RollingLogger, count: u32) -> Vec<PathBuf> {
    (0..count).map(|index| logger.file_path(index)).collect()
}
