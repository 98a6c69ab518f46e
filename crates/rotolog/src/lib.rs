//! Thread-safe leveled logging into a size-bounded rotating file set
//!
//! This crate provides a low-overhead file logger that supports:
//! - Fixed-layout text records formatted without per-call allocation
//! - Size-based rotation across a bounded chain of numbered files
//! - Exact byte accounting shared by every writing thread
//! - Compile-time and run-time level filtering
//!
//! ```no_run
//! use rotolog::{RollingLogger, info};
//!
//! let logger = RollingLogger::init("logs/server.log", 2000, 10, 256)?;
//! info!(logger, "listening on port {}", 8080);
//! # Ok::<(), rotolog::Error>(())
//! ```

#![warn(missing_docs, unreachable_pub)]
#![deny(unsafe_code)]

mod clock;
mod config;
mod error;
mod format;
mod level;
mod logger;
#[doc(hidden)]
pub mod macros;
mod parse;
mod rotation;

pub use clock::{Clock, Timestamp};
pub use config::{
    DEFAULT_BUFFER_SIZE_KB, FileLoggerConfig, FileLoggerConfigBuilder, RotationPolicy,
};
pub use error::{Error, Result};
pub use format::{
    CallSite, FIXED_WIDTH, Record, THREAD_ID_WIDTH, current_thread_id, format_record,
};
pub use level::{LEVEL_TAG_WIDTH, Level};
pub use logger::{LoggerState, RollingLogger};
pub use parse::ParsedRecord;
pub use rotation::{RotatingFile, RotationChain};
