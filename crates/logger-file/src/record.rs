//! Log records as they enter and leave the formatter

use crate::Level;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::ops::Range;

/// A log event handed to a sink
#[derive(Debug, Clone)]
pub struct Record<'a> {
    /// Log level
    pub level: Level,
    /// The log message
    pub message: Cow<'a, str>,
    /// Target module
    pub target: Cow<'a, str>,
    /// When the log was created
    pub timestamp: DateTime<Utc>,
}

impl<'a> Record<'a> {
    /// Create a new record stamped with the current time
    pub fn new(level: Level, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            level,
            message: message.into(),
            target: Cow::Borrowed(""),
            timestamp: Utc::now(),
        }
    }

    /// Builder-style method for setting target
    #[must_use]
    pub fn with_target(mut self, target: impl Into<Cow<'a, str>>) -> Self {
        self.target = target.into();
        self
    }

    /// Builder-style method for setting the timestamp
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Formatted bytes plus the sub-range that should be colorized.
///
/// An empty `color_range` (`start >= end`) requests no colorization.
#[derive(Debug, Clone)]
pub struct FormattedRecord<'a> {
    /// Level of the record the bytes were produced from
    pub level: Level,
    /// The formatted bytes
    pub buf: &'a [u8],
    /// Sub-range of `buf` to colorize
    pub color_range: Range<usize>,
}

impl<'a> FormattedRecord<'a> {
    /// Wrap a buffer without requesting colorization
    pub fn plain(level: Level, buf: &'a [u8]) -> Self {
        Self {
            level,
            buf,
            color_range: 0..0,
        }
    }

    /// Wrap a buffer and mark `color_range` for colorization
    pub fn colored(level: Level, buf: &'a [u8], color_range: Range<usize>) -> Self {
        Self {
            level,
            buf,
            color_range,
        }
    }
}
