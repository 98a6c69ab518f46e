//! Test compile-time level filtering
//!
//! The `min-level-*` features set a floor below which the macros expand to
//! nothing: arguments are not evaluated and no record reaches the file.

use std::cell::Cell;
use std::fs;

use rotolog::{Level, ParsedRecord, RollingLogger};
use tempfile::{TempDir, tempdir};

fn unbuffered_logger() -> (TempDir, RollingLogger) {
    let dir = tempdir().unwrap();
    let logger = RollingLogger::init(dir.path().join("app.log"), 0, 0, 0).unwrap();
    (dir, logger)
}

/// One record per level through the macros, counting evaluated arguments
fn write_every_level(logger: &RollingLogger, evaluated: &Cell<usize>) {
    let arg = |name: &'static str| {
        evaluated.set(evaluated.get() + 1);
        name
    };
    rotolog::trace!(logger, "{}", arg("trace"));
    rotolog::debug!(logger, "{}", arg("debug"));
    rotolog::info!(logger, "{}", arg("info"));
    rotolog::warn!(logger, "{}", arg("warn"));
    rotolog::error!(logger, "{}", arg("error"));
    rotolog::fatal!(logger, "{}", arg("fatal"));
}

fn written_levels(logger: &RollingLogger) -> Vec<Level> {
    fs::read_to_string(logger.active_path())
        .unwrap()
        .lines()
        .map(|line| ParsedRecord::parse(line).unwrap().level)
        .collect()
}

#[test]
fn test_macros_follow_static_floor() {
    let (_dir, logger) = unbuffered_logger();
    let evaluated = Cell::new(0);

    write_every_level(&logger, &evaluated);

    let expected: Vec<Level> = Level::ALL
        .into_iter()
        .filter(|level| level.is_enabled_static())
        .collect();
    assert_eq!(evaluated.get(), expected.len());
    assert_eq!(written_levels(&logger), expected);
}

#[cfg(feature = "min-level-off")]
#[test]
fn test_all_levels_compiled_out() {
    assert_eq!(Level::static_min(), None);

    let (_dir, logger) = unbuffered_logger();
    let evaluated = Cell::new(0);
    write_every_level(&logger, &evaluated);
    logger.fatal(&rotolog::CallSite::new("f", "a.rs", 1), "direct");

    assert_eq!(evaluated.get(), 0);
    assert!(written_levels(&logger).is_empty());
    assert_eq!(logger.current_file_size(), 0);
    assert_eq!(logger.dropped_records(), 0);
}

#[cfg(all(
    feature = "min-level-warn",
    not(any(
        feature = "min-level-error",
        feature = "min-level-fatal",
        feature = "min-level-off"
    ))
))]
#[test]
fn test_levels_below_warn_compiled_out() {
    assert_eq!(Level::static_min(), Some(Level::Warning));

    let (_dir, logger) = unbuffered_logger();
    let evaluated = Cell::new(0);
    write_every_level(&logger, &evaluated);
    logger.info(&rotolog::CallSite::new("f", "a.rs", 1), "direct");

    assert_eq!(evaluated.get(), 3);
    assert_eq!(
        written_levels(&logger),
        [Level::Warning, Level::Error, Level::Fatal]
    );
}

#[test]
fn test_runtime_floor_never_lowers_static_floor() {
    let (_dir, logger) = unbuffered_logger();
    assert_eq!(logger.min_level(), Level::Trace);

    for level in Level::ALL {
        assert_eq!(logger.is_enabled(level), level.is_enabled_static(), "{level}");
    }
}
