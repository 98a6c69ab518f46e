//! Error types for the rotating file logger

use std::io;
use std::path::PathBuf;

/// Result type for logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while configuring or opening the logger
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failed to create the parent directory of the log file
    #[error("Failed to create log directory at {path}: {source}")]
    CreateDirectory {
        /// The directory that could not be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to open the active log file
    #[error("Failed to open log file {path}: {source}")]
    Open {
        /// The file that could not be opened
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Unknown level name
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// A record line did not match the record layout
    #[error("Malformed record: bad {0}")]
    MalformedRecord(&'static str),
}
