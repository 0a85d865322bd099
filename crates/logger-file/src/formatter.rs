//! Formatter seam between records and sinks

use crate::Record;
use std::io::Write;
use std::ops::Range;

/// Turns a record into bytes.
pub trait Formatter: Send + Sync {
    /// Append the formatted record to `dest` and return the range of `dest`
    /// that should be colorized. Return an empty range for no color.
    fn format(&self, record: &Record<'_>, dest: &mut Vec<u8>) -> Range<usize>;
}

/// `[2024-01-01 12:00:00.000] [target] [info] message`
///
/// The level name is marked for colorization.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn format(&self, record: &Record<'_>, dest: &mut Vec<u8>) -> Range<usize> {
        // Writing into a Vec cannot fail
        let _ = write!(
            dest,
            "[{}] ",
            record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f")
        );
        if !record.target.is_empty() {
            let _ = write!(dest, "[{}] ", record.target);
        }

        dest.push(b'[');
        let start = dest.len();
        dest.extend_from_slice(record.level.as_str().as_bytes());
        let end = dest.len();
        dest.extend_from_slice(b"] ");

        dest.extend_from_slice(record.message.as_bytes());
        dest.push(b'\n');

        start..end
    }
}
