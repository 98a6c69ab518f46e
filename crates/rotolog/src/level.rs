//! Record severity levels

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a record, ordered from least to most severe
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Very fine-grained tracing
    Trace = 0,
    /// Debugging information
    Debug = 1,
    /// Normal operational messages
    Info = 2,
    /// Something unexpected that the program recovered from
    #[serde(rename = "warn", alias = "warning")]
    Warning = 3,
    /// An operation failed
    Error = 4,
    /// The program cannot continue
    Fatal = 5,
}

/// Width of the level tag inside a record
pub const LEVEL_TAG_WIDTH: usize = 5;

impl Level {
    /// All levels in ascending severity
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Fatal,
    ];

    /// The fixed-width tag written into records
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info ",
            Level::Warning => "warn ",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Lowercase name without padding
    pub const fn name(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Level as its numeric value
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create from numeric value (returns None if out of range)
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Level::Trace),
            1 => Some(Level::Debug),
            2 => Some(Level::Info),
            3 => Some(Level::Warning),
            4 => Some(Level::Error),
            5 => Some(Level::Fatal),
            _ => None,
        }
    }

    /// Parse a fixed-width tag as written by the formatter
    pub fn from_tag(tag: &str) -> Option<Self> {
        Level::ALL.into_iter().find(|level| level.as_str() == tag)
    }

    /// Lowest level compiled in, selected by the `min-level-*` features.
    ///
    /// `None` means every level is compiled out.
    pub const fn static_min() -> Option<Level> {
        if cfg!(feature = "min-level-off") {
            None
        } else if cfg!(feature = "min-level-fatal") {
            Some(Level::Fatal)
        } else if cfg!(feature = "min-level-error") {
            Some(Level::Error)
        } else if cfg!(feature = "min-level-warn") {
            Some(Level::Warning)
        } else if cfg!(feature = "min-level-info") {
            Some(Level::Info)
        } else if cfg!(feature = "min-level-debug") {
            Some(Level::Debug)
        } else {
            Some(Level::Trace)
        }
    }

    /// Whether this level survives the compile-time floor
    #[inline(always)]
    pub const fn is_enabled_static(self) -> bool {
        match Level::static_min() {
            Some(min) => self as u8 >= min as u8,
            None => false,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}
