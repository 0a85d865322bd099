//! Durable log output: files, size-based rotation and ANSI colors
//!
//! This crate provides the output side of a logger:
//! - [`FileWriter`] opens, writes, flushes and closes a log file with bounded
//!   open retries and lifecycle hooks
//! - [`RotatingFile`] keeps a file under a size limit by shifting it through
//!   a numbered chain of backups
//! - [`AnsiColors`] wraps the level-relevant part of a formatted record in
//!   escape codes
//! - color sinks combine the above behind a [`Sink`] trait, guarded by a
//!   [`LockPolicy`]
//! - [`SinkLayer`] forwards `tracing` events into any sink

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod colors;
mod config;
mod error;
mod file_writer;
mod formatter;
mod layer;
mod level;
mod lock;
mod record;
mod rotating_file;
mod sinks;

pub use colors::{AnsiColors, codes};
pub use config::{MAX_BACKUP_FILES, RetryPolicy, RotatingFileConfig, RotatingFileConfigBuilder};
pub use error::{Error, Result};
pub use file_writer::{FileEventHandlers, FileWriter, split_by_extension};
pub use formatter::{DefaultFormatter, Formatter};
pub use layer::{SinkLayer, init_tracing};
pub use level::Level;
pub use lock::{LockPolicy, Lockable, Mt, NullLock, St};
pub use record::{FormattedRecord, Record};
pub use rotating_file::RotatingFile;
pub use sinks::{
    ColorConsoleSink, ColorConsoleSinkMt, ColorConsoleSinkSt, ColorFileSink, ColorFileSinkMt,
    ColorFileSinkSt, ColorMode, ColorRotatingFileSink, ColorRotatingFileSinkMt,
    ColorRotatingFileSinkSt, Sink,
};
