use super::{ColorFormatter, Sink};
use crate::{
    FileEventHandlers, Formatter, Level, LockPolicy, Lockable, Mt, Record, Result, RotatingFile,
    RotatingFileConfig, St,
};
use std::path::{Path, PathBuf};
use tracing::debug;

struct State {
    file: RotatingFile,
    fmt: ColorFormatter,
    scratch: Vec<u8>,
}

/// ANSI-colored output to a size-rotated file
pub struct ColorRotatingFileSink<P: LockPolicy = Mt> {
    filename: PathBuf,
    state: P::Lock<State>,
}

/// Thread-safe [`ColorRotatingFileSink`]
pub type ColorRotatingFileSinkMt = ColorRotatingFileSink<Mt>;
/// Single-threaded [`ColorRotatingFileSink`]
pub type ColorRotatingFileSinkSt = ColorRotatingFileSink<St>;

impl<P: LockPolicy> ColorRotatingFileSink<P> {
    /// Open `base_filename` rotated at `max_size` bytes across `max_files`
    /// backups.
    pub fn new(
        base_filename: impl Into<PathBuf>,
        max_size: u64,
        max_files: usize,
        rotate_on_open: bool,
        handlers: FileEventHandlers,
    ) -> Result<Self> {
        let file = RotatingFile::new(base_filename, max_size, max_files, rotate_on_open, handlers)?;
        Ok(Self::from_parts(file, ColorFormatter::new()))
    }

    /// Open the file described by `config`, applying its color overrides
    pub fn from_config(config: &RotatingFileConfig, handlers: FileEventHandlers) -> Result<Self> {
        let file = RotatingFile::from_config(config, handlers)?;
        let mut fmt = ColorFormatter::new();
        for (level, color) in &config.colors {
            fmt.set_color(*level, color.clone());
        }
        Ok(Self::from_parts(file, fmt))
    }

    fn from_parts(file: RotatingFile, fmt: ColorFormatter) -> Self {
        debug!(
            file = %file.filename().display(),
            max_size = file.max_size(),
            max_files = file.max_files(),
            "opened rotating log file"
        );
        Self {
            filename: file.filename().to_path_buf(),
            state: Lockable::new(State {
                file,
                fmt,
                scratch: Vec::with_capacity(256),
            }),
        }
    }

    /// Replace the escape string for `level`
    pub fn set_color(&self, level: Level, color: impl Into<String>) {
        let color = color.into();
        self.state.with_lock(|state| state.fmt.set_color(level, color));
    }

    /// Path of the active file
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Path of backup `index` for `base_filename`
    pub fn calc_filename(base_filename: &str, index: usize) -> String {
        RotatingFile::calc_filename(base_filename, index)
    }
}

impl<P: LockPolicy> Sink for ColorRotatingFileSink<P> {
    fn log(&self, record: &Record<'_>) -> Result<()> {
        self.state.with_lock(|state| {
            // One write per record so a record never straddles two files.
            state.scratch.clear();
            for range in state.fmt.colored(record) {
                state.scratch.extend_from_slice(range);
            }
            state.file.write(&state.scratch)
        })
    }

    fn flush(&self) -> Result<()> {
        self.state.with_lock(|state| state.file.flush());
        Ok(())
    }

    fn set_formatter(&self, formatter: Box<dyn Formatter>) {
        self.state.with_lock(|state| state.fmt.formatter = formatter);
    }
}
