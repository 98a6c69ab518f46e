//! Logger configuration

use crate::error::{Error, Result};
use crate::level::Level;
use serde::Deserialize;
use std::path::PathBuf;

/// Default size of the write buffer in kilobytes
pub const DEFAULT_BUFFER_SIZE_KB: usize = 256;

/// Configuration for the rotating file logger
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileLoggerConfig {
    /// Path of the active log file; its stem and extension name the backups
    pub path: PathBuf,
    /// Size threshold of the active file in kilobytes (1 kB = 1000 bytes)
    pub max_size_kb: u64,
    /// Number of files in the rotation chain, active file included.
    /// Zero disables rotation.
    pub max_files: i32,
    /// Size of the write buffer in kilobytes; zero writes straight through
    pub buffer_size_kb: usize,
    /// Records below this level are discarded
    pub min_level: Level,
    /// Timestamp records in UTC instead of local time
    pub utc: bool,
}

impl Default for FileLoggerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("rotolog.log"),
            max_size_kb: 0,
            max_files: 0,
            buffer_size_kb: DEFAULT_BUFFER_SIZE_KB,
            min_level: Level::Trace,
            utc: false,
        }
    }
}

/// When the active file is rotated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPolicy {
    /// The active file grows without bound
    Unbounded,
    /// Rotate before a record would push the active file past `max_bytes`
    Size {
        /// Byte threshold of the active file
        max_bytes: u64,
        /// Files kept in the chain, active file included
        max_files: u32,
    },
}

impl RotationPolicy {
    /// Whether a record of `record_len` bytes must go to a fresh file
    #[inline]
    pub const fn should_rotate(&self, current_size: u64, record_len: u64) -> bool {
        match *self {
            RotationPolicy::Unbounded => false,
            RotationPolicy::Size { max_bytes, .. } => current_size + record_len > max_bytes,
        }
    }
}

impl FileLoggerConfig {
    /// Start building a configuration for the given log file
    pub fn builder(path: impl Into<PathBuf>) -> FileLoggerConfigBuilder {
        FileLoggerConfigBuilder {
            config: FileLoggerConfig {
                path: path.into(),
                ..Default::default()
            },
        }
    }

    /// Load a configuration from TOML
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: FileLoggerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the logger cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.max_files < 0 {
            return Err(Error::Configuration(format!(
                "max_files must not be negative, got {}",
                self.max_files
            )));
        }
        if self.path.as_os_str().is_empty() || self.path.file_name().is_none() {
            return Err(Error::Configuration(format!(
                "log path {} does not name a file",
                self.path.display()
            )));
        }
        Ok(())
    }

    /// Byte threshold of the active file
    pub const fn max_size_bytes(&self) -> u64 {
        self.max_size_kb.saturating_mul(1000)
    }

    /// Write buffer capacity in bytes
    pub const fn buffer_size_bytes(&self) -> usize {
        self.buffer_size_kb.saturating_mul(1000)
    }

    /// Rotation behaviour implied by the size and file limits
    pub fn rotation_policy(&self) -> RotationPolicy {
        match u32::try_from(self.max_files) {
            Ok(0) | Err(_) => RotationPolicy::Unbounded,
            Ok(max_files) => RotationPolicy::Size {
                max_bytes: self.max_size_bytes(),
                max_files,
            },
        }
    }
}

/// Builder for [`FileLoggerConfig`]
#[derive(Debug, Clone)]
pub struct FileLoggerConfigBuilder {
    config: FileLoggerConfig,
}

impl FileLoggerConfigBuilder {
    /// Size threshold in kilobytes
    pub fn max_size_kb(mut self, max_size_kb: u64) -> Self {
        self.config.max_size_kb = max_size_kb;
        self
    }

    /// Number of files in the rotation chain
    pub fn max_files(mut self, max_files: i32) -> Self {
        self.config.max_files = max_files;
        self
    }

    /// Write buffer size in kilobytes
    pub fn buffer_size_kb(mut self, buffer_size_kb: usize) -> Self {
        self.config.buffer_size_kb = buffer_size_kb;
        self
    }

    /// Minimum level written
    pub fn min_level(mut self, level: Level) -> Self {
        self.config.min_level = level;
        self
    }

    /// Use UTC timestamps
    pub fn utc(mut self, utc: bool) -> Self {
        self.config.utc = utc;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<FileLoggerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FileLoggerConfig::default();
        assert_eq!(config.buffer_size_kb, 256);
        assert_eq!(config.min_level, Level::Trace);
        assert_eq!(config.rotation_policy(), RotationPolicy::Unbounded);
    }

    #[test]
    fn test_builder() {
        let config = FileLoggerConfig::builder("logs/app.log")
            .max_size_kb(2000)
            .max_files(10)
            .buffer_size_kb(512)
            .min_level(Level::Info)
            .utc(true)
            .build()
            .unwrap();

        assert_eq!(config.path, PathBuf::from("logs/app.log"));
        assert_eq!(config.max_size_bytes(), 2_000_000);
        assert_eq!(config.buffer_size_bytes(), 512_000);
        assert_eq!(
            config.rotation_policy(),
            RotationPolicy::Size {
                max_bytes: 2_000_000,
                max_files: 10
            }
        );
        assert!(config.utc);
    }

    #[test]
    fn test_negative_max_files_rejected() {
        let err = FileLoggerConfig::builder("app.log")
            .max_files(-1)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_path_must_name_a_file() {
        assert!(matches!(
            FileLoggerConfig::builder("").build(),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            FileLoggerConfig::builder("logs/..").build(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_should_rotate() {
        let policy = RotationPolicy::Size {
            max_bytes: 100,
            max_files: 2,
        };
        assert!(!policy.should_rotate(50, 50));
        assert!(policy.should_rotate(51, 50));
        assert!(!RotationPolicy::Unbounded.should_rotate(u64::MAX / 2, 1000));
    }

    #[test]
    fn test_zero_size_with_files_rotates_every_record() {
        let config = FileLoggerConfig::builder("app.log")
            .max_files(3)
            .build()
            .unwrap();
        assert!(config.rotation_policy().should_rotate(0, 1));
    }

    #[test]
    fn test_from_toml() {
        let config = FileLoggerConfig::from_toml_str(
            r#"
            path = "/var/log/app/server.log"
            max_size_kb = 1
            max_files = 2
            min_level = "warn"
            utc = true
            "#,
        )
        .unwrap();

        assert_eq!(config.path, PathBuf::from("/var/log/app/server.log"));
        assert_eq!(config.max_files, 2);
        assert_eq!(config.min_level, Level::Warning);
        assert_eq!(config.buffer_size_kb, DEFAULT_BUFFER_SIZE_KB);
    }

    #[test]
    fn test_from_toml_rejects_bad_input() {
        assert!(matches!(
            FileLoggerConfig::from_toml_str("max_files = -3"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            FileLoggerConfig::from_toml_str("max_file = 3"),
            Err(Error::ConfigParse(_))
        ));
        assert!(matches!(
            FileLoggerConfig::from_toml_str("min_level = \"loud\""),
            Err(Error::ConfigParse(_))
        ));
    }
}
