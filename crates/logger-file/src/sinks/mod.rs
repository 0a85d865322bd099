//! Color-capable sinks built from the file writer, the rotating file and the
//! colorizer.
//!
//! Every sink guards its state with exactly one lock chosen by a
//! [`LockPolicy`](crate::LockPolicy): `Mt` for sinks shared between threads,
//! `St` for single-threaded use.

mod console;
mod file;
mod rotating;

pub use console::{ColorConsoleSink, ColorConsoleSinkMt, ColorConsoleSinkSt, ColorMode};
pub use file::{ColorFileSink, ColorFileSinkMt, ColorFileSinkSt};
pub use rotating::{ColorRotatingFileSink, ColorRotatingFileSinkMt, ColorRotatingFileSinkSt};

use crate::{AnsiColors, DefaultFormatter, Formatter, FormattedRecord, Level, Record, Result};
use std::sync::Arc;

/// A destination for log records
pub trait Sink {
    /// Format and write a record
    fn log(&self, record: &Record<'_>) -> Result<()>;

    /// Flush buffered output
    fn flush(&self) -> Result<()>;

    /// Replace the formatter
    fn set_formatter(&self, formatter: Box<dyn Formatter>);
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn log(&self, record: &Record<'_>) -> Result<()> {
        (**self).log(record)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }

    fn set_formatter(&self, formatter: Box<dyn Formatter>) {
        (**self).set_formatter(formatter);
    }
}

/// Formatter, color table and reusable buffer shared by the color sinks.
struct ColorFormatter {
    colors: AnsiColors,
    formatter: Box<dyn Formatter>,
    buf: Vec<u8>,
}

impl ColorFormatter {
    fn new() -> Self {
        Self {
            colors: AnsiColors::new(),
            formatter: Box::new(DefaultFormatter),
            buf: Vec::with_capacity(256),
        }
    }

    fn set_color(&mut self, level: Level, color: String) {
        self.colors.set_color(level, color);
    }

    /// Format `record` and return the ranges to write, escape codes included.
    fn colored(&mut self, record: &Record<'_>) -> Vec<&[u8]> {
        self.buf.clear();
        let color_range = self.formatter.format(record, &mut self.buf);
        let formatted = FormattedRecord::colored(record.level, &self.buf, color_range);
        self.colors.ranges(&formatted)
    }

    /// Format `record` without escape codes.
    fn plain(&mut self, record: &Record<'_>) -> &[u8] {
        self.buf.clear();
        self.formatter.format(record, &mut self.buf);
        &self.buf
    }
}
