//! Configuration for file outputs

use crate::{Error, Level, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Hard cap on the number of backup files a rotating file may keep.
pub const MAX_BACKUP_FILES: usize = 200_000;

/// Fixed-delay retry policy for blocking file operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first (default: 5)
    pub attempts: u32,
    /// Delay between attempts (default: 10ms)
    #[serde(with = "duration_ms")]
    pub delay: Duration,
}

impl RetryPolicy {
    /// Policy used when opening files: 5 attempts, 10ms apart.
    pub const OPEN: Self = Self::new(5, Duration::from_millis(10));

    /// Policy used when renaming backups: one retry after 100ms.
    pub const RENAME: Self = Self::new(2, Duration::from_millis(100));

    /// Create a policy
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Run `op` until it succeeds or the attempts are used up, sleeping
    /// between attempts. `op` receives the zero-based attempt number. The
    /// operation always runs at least once.
    pub fn run<T, E>(
        &self,
        mut op: impl FnMut(u32) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let attempts = self.attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 >= attempts => return Err(e),
                Err(_) => {
                    attempt += 1;
                    thread::sleep(self.delay);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::OPEN
    }
}

fn default_rename_retry() -> RetryPolicy {
    RetryPolicy::RENAME
}

/// Configuration for a size-rotated log file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotatingFileConfig {
    /// Path of the active (index 0) log file
    pub path: PathBuf,
    /// Size in bytes at which the active file is rotated
    pub max_size: u64,
    /// Number of backup files kept
    pub max_files: usize,
    /// Rotate a non-empty pre-existing file on startup
    #[serde(default)]
    pub rotate_on_open: bool,
    /// Retry policy for opening files
    #[serde(default)]
    pub open_retry: RetryPolicy,
    /// Retry policy for each rename in the backup chain
    #[serde(default = "default_rename_retry")]
    pub rename_retry: RetryPolicy,
    /// Escape string overrides per level
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub colors: BTreeMap<Level, String>,
}

impl RotatingFileConfig {
    /// Start building a configuration for `path`
    pub fn builder(path: impl Into<PathBuf>) -> RotatingFileConfigBuilder {
        RotatingFileConfigBuilder::new(path)
    }

    /// Check the construction rules
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::Configuration("max_size cannot be zero".to_string()));
        }
        if self.max_files > MAX_BACKUP_FILES {
            return Err(Error::Configuration(format!(
                "max_files cannot exceed {MAX_BACKUP_FILES}"
            )));
        }
        if self.path.to_str().is_none() {
            return Err(Error::Configuration(format!(
                "path {} is not valid UTF-8",
                self.path.display()
            )));
        }
        Ok(())
    }
}

/// Builder for [`RotatingFileConfig`]
#[derive(Debug, Clone)]
pub struct RotatingFileConfigBuilder {
    config: RotatingFileConfig,
}

impl RotatingFileConfigBuilder {
    /// Create a builder with 5MB files and 3 backups
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            config: RotatingFileConfig {
                path: path.into(),
                max_size: 5 * 1024 * 1024,
                max_files: 3,
                rotate_on_open: false,
                open_retry: RetryPolicy::OPEN,
                rename_retry: RetryPolicy::RENAME,
                colors: BTreeMap::new(),
            },
        }
    }

    /// Set the rotation threshold in bytes
    pub fn max_size(mut self, max_size: u64) -> Self {
        self.config.max_size = max_size;
        self
    }

    /// Set the number of backups kept
    pub fn max_files(mut self, max_files: usize) -> Self {
        self.config.max_files = max_files;
        self
    }

    /// Rotate a non-empty pre-existing file on startup
    pub fn rotate_on_open(mut self, rotate_on_open: bool) -> Self {
        self.config.rotate_on_open = rotate_on_open;
        self
    }

    /// Set the retry policy for opening files
    pub fn open_retry(mut self, policy: RetryPolicy) -> Self {
        self.config.open_retry = policy;
        self
    }

    /// Set the retry policy for backup renames
    pub fn rename_retry(mut self, policy: RetryPolicy) -> Self {
        self.config.rename_retry = policy;
        self
    }

    /// Override the escape string for a level
    pub fn color(mut self, level: Level, escape: impl Into<String>) -> Self {
        self.config.colors.insert(level, escape.into());
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<RotatingFileConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
