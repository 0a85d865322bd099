use super::{ColorFormatter, Sink};
use crate::{
    FileEventHandlers, FileWriter, Formatter, Level, LockPolicy, Lockable, Mt, Record, Result, St,
};
use std::path::{Path, PathBuf};

struct State {
    file: FileWriter,
    fmt: ColorFormatter,
}

/// ANSI-colored output to a single file
pub struct ColorFileSink<P: LockPolicy = Mt> {
    filename: PathBuf,
    state: P::Lock<State>,
}

/// Thread-safe [`ColorFileSink`]
pub type ColorFileSinkMt = ColorFileSink<Mt>;
/// Single-threaded [`ColorFileSink`]
pub type ColorFileSinkSt = ColorFileSink<St>;

impl<P: LockPolicy> ColorFileSink<P> {
    /// Open `path`, appending unless `truncate` is set
    pub fn new(path: impl AsRef<Path>, truncate: bool, handlers: FileEventHandlers) -> Result<Self> {
        let path = path.as_ref();
        let mut file = FileWriter::new(handlers);
        file.open(path, truncate)?;

        Ok(Self {
            filename: path.to_path_buf(),
            state: Lockable::new(State {
                file,
                fmt: ColorFormatter::new(),
            }),
        })
    }

    /// Replace the escape string for `level`
    pub fn set_color(&self, level: Level, color: impl Into<String>) {
        let color = color.into();
        self.state.with_lock(|state| state.fmt.set_color(level, color));
    }

    /// Path of the file being written
    pub fn filename(&self) -> &Path {
        &self.filename
    }
}

impl<P: LockPolicy> Sink for ColorFileSink<P> {
    fn log(&self, record: &Record<'_>) -> Result<()> {
        self.state.with_lock(|state| -> Result<()> {
            for range in state.fmt.colored(record) {
                state.file.write(range)?;
            }
            Ok(())
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
