//! The process-wide rotating file logger
//!
//! A single [`RollingLogger`] owns the active file, its byte count and the
//! rotation chain behind one mutex. Records are formatted outside the lock
//! into a per-thread buffer; the lock only covers the rotation decision,
//! the write and the byte-count update.

use crate::clock::Clock;
use crate::config::FileLoggerConfig;
use crate::error::Result;
use crate::format::{CallSite, Record, current_thread_id, format_record};
use crate::level::Level;
use crate::rotation::{RotatingFile, RotationChain};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::fmt::{self, Write as _};
use std::io;
use std::path::PathBuf;

/// Starting capacity of the per-thread scratch buffers
const SCRATCH_CAPACITY: usize = 512;

thread_local! {
    static RECORD_BUFFER: RefCell<Vec<u8>> = RefCell::new(Vec::with_capacity(SCRATCH_CAPACITY));
    static MESSAGE_BUFFER: RefCell<String> = RefCell::new(String::with_capacity(SCRATCH_CAPACITY));
}

/// Lifecycle state of a [`RollingLogger`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    /// The active file is open and accepting records
    Open,
    /// Shut down, or the active file could not be reopened after rotation
    Closed,
}

#[derive(Debug)]
struct WriterState {
    file: RotatingFile,
    dropped: u64,
}

/// What happened to one record, reported after the lock is released
enum Outcome {
    Written,
    /// `lost` buffered records of the rotated-out file were never flushed
    Rotated { lost: u64 },
    Dropped(io::Error),
    Closed { error: io::Error, lost: u64 },
    /// The logger was already closed; nothing to report
    Discarded,
}

/// Thread-safe logger writing fixed-layout records to a rotating file set
#[derive(Debug)]
pub struct RollingLogger {
    config: FileLoggerConfig,
    clock: Clock,
    state: Mutex<WriterState>,
}

impl RollingLogger {
    /// Open the logger described by `config`.
    ///
    /// Creates missing parent directories and continues the byte count of
    /// an existing active file.
    pub fn open(config: FileLoggerConfig) -> Result<Self> {
        config.validate()?;

        let chain = RotationChain::new(&config.path);
        let file = RotatingFile::open(chain, config.rotation_policy(), config.buffer_size_bytes())?;

        tracing::debug!(
            path = %config.path.display(),
            size = file.size(),
            max_size_kb = config.max_size_kb,
            max_files = config.max_files,
            "opened log file"
        );

        Ok(Self {
            clock: Clock::new(config.utc),
            config,
            state: Mutex::new(WriterState { file, dropped: 0 }),
        })
    }

    /// Open a logger with positional limits.
    ///
    /// `max_size_kb == 0` together with `max_files == 0` is a single file
    /// that grows without bound. Negative `max_files` is rejected.
    pub fn init(
        path: impl Into<PathBuf>,
        max_size_kb: u64,
        max_files: i32,
        buffer_size_kb: usize,
    ) -> Result<Self> {
        let config = FileLoggerConfig::builder(path)
            .max_size_kb(max_size_kb)
            .max_files(max_files)
            .buffer_size_kb(buffer_size_kb)
            .build()?;
        Self::open(config)
    }

    /// Configuration the logger was opened with
    pub const fn config(&self) -> &FileLoggerConfig {
        &self.config
    }

    /// Lowest level written
    pub const fn min_level(&self) -> Level {
        self.config.min_level
    }

    /// Whether records at `level` are written
    #[inline]
    pub fn is_enabled(&self, level: Level) -> bool {
        level.is_enabled_static() && level >= self.config.min_level
    }

    /// Write one record.
    ///
    /// Failures never reach the caller: the record is dropped, counted in
    /// [`RollingLogger::dropped_records`] and reported through `tracing`.
    pub fn write(&self, level: Level, site: &CallSite, message: &str) {
        if !self.is_enabled(level) {
            return;
        }

        let record = Record::new(level, site, message);
        let timestamp = self.clock.now();
        let thread_id = current_thread_id();

        let outcome = with_scratch(&RECORD_BUFFER, |buf| {
            format_record(buf, &timestamp, thread_id, &record);
            self.commit(buf)
        });

        match outcome {
            Outcome::Written | Outcome::Discarded => {}
            Outcome::Rotated { lost: 0 } => {
                tracing::debug!(path = %self.config.path.display(), "rotated log file");
            }
            Outcome::Rotated { lost } => {
                tracing::warn!(
                    path = %self.config.path.display(),
                    lost,
                    "rotated log file, buffered records could not be flushed"
                );
            }
            Outcome::Dropped(e) => {
                tracing::warn!(
                    path = %self.config.path.display(),
                    error = %e,
                    "dropped log record"
                );
            }
            Outcome::Closed { error, lost } => {
                tracing::error!(
                    path = %self.config.path.display(),
                    error = %error,
                    lost,
                    "failed to reopen log file after rotation, logger closed"
                );
            }
        }
    }

    /// Format `args` and write the result as one record
    pub fn log(&self, level: Level, site: &CallSite, args: fmt::Arguments<'_>) {
        if !self.is_enabled(level) {
            return;
        }

        if let Some(message) = args.as_str() {
            return self.write(level, site, message);
        }

        with_scratch(&MESSAGE_BUFFER, |message| {
            message.clear();
            let _ = message.write_fmt(args);
            self.write(level, site, message);
        });
    }

    /// Write a trace record
    #[inline]
    pub fn trace(&self, site: &CallSite, message: &str) {
        self.write(Level::Trace, site, message);
    }

    /// Write a debug record
    #[inline]
    pub fn debug(&self, site: &CallSite, message: &str) {
        self.write(Level::Debug, site, message);
    }

    /// Write an info record
    #[inline]
    pub fn info(&self, site: &CallSite, message: &str) {
        self.write(Level::Info, site, message);
    }

    /// Write a warning record
    #[inline]
    pub fn warning(&self, site: &CallSite, message: &str) {
        self.write(Level::Warning, site, message);
    }

    /// Write an error record
    #[inline]
    pub fn error(&self, site: &CallSite, message: &str) {
        self.write(Level::Error, site, message);
    }

    /// Write a fatal record
    #[inline]
    pub fn fatal(&self, site: &CallSite, message: &str) {
        self.write(Level::Fatal, site, message);
    }

    /// Flush buffered records to disk
    pub fn flush(&self) -> io::Result<()> {
        self.state.lock().file.flush()
    }

    /// Flush and close the active file; later records are dropped
    pub fn shutdown(&self) -> io::Result<()> {
        let result = self.state.lock().file.close();
        tracing::debug!(path = %self.config.path.display(), "log file closed");
        result
    }

    /// Current lifecycle state
    pub fn state(&self) -> LoggerState {
        if self.state.lock().file.is_open() {
            LoggerState::Open
        } else {
            LoggerState::Closed
        }
    }

    /// Bytes written to the active file so far
    pub fn current_file_size(&self) -> u64 {
        self.state.lock().file.size()
    }

    /// Records dropped because of I/O failures or a closed logger
    pub fn dropped_records(&self) -> u64 {
        self.state.lock().dropped
    }

    /// Path of the active file
    pub fn active_path(&self) -> PathBuf {
        self.file_path(0)
    }

    /// Path of rotation index `index`; larger indices are older
    pub fn file_path(&self, index: u32) -> PathBuf {
        self.state.lock().file.chain().path(index)
    }

    fn commit(&self, record: &[u8]) -> Outcome {
        let mut state = self.state.lock();
        let was_open = state.file.is_open();

        let result = state.file.append(record);
        let lost = state.file.take_lost_records();
        state.dropped += lost;

        match result {
            Ok(true) => Outcome::Rotated { lost },
            Ok(false) => Outcome::Written,
            Err(e) => {
                state.dropped += 1;
                if was_open && !state.file.is_open() {
                    Outcome::Closed { error: e, lost }
                } else if was_open {
                    Outcome::Dropped(e)
                } else {
                    Outcome::Discarded
                }
            }
        }
    }
}

impl Drop for RollingLogger {
    fn drop(&mut self) {
        let _ = self.state.get_mut().file.close();
    }
}

/// Run `f` on a per-thread scratch value, or on a fresh one if the
/// thread's value is already borrowed or being torn down.
fn with_scratch<T, R>(
    key: &'static std::thread::LocalKey<RefCell<T>>,
    f: impl FnOnce(&mut T) -> R,
) -> R
where
    T: Default,
{
    let mut f = Some(f);
    let result = key.try_with(|cell| {
        let mut value = cell.try_borrow_mut().ok()?;
        let f = f.take()?;
        Some(f(&mut value))
    });
    if let Ok(Some(result)) = result {
        return result;
    }

    match f {
        Some(f) => f(&mut T::default()),
        None => unreachable!("scratch closure ran without producing a result"),
    }
}
