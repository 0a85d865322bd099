use super::{ColorFormatter, Sink};
use crate::{Formatter, Level, LockPolicy, Lockable, Mt, Record, Result, St};
use serde::{Deserialize, Serialize};
use std::io::{self, IsTerminal, Write};

/// When a console sink emits escape codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Always colorize
    Always,
    /// Colorize when the target is a terminal
    #[default]
    Automatic,
    /// Never colorize
    Never,
}

impl ColorMode {
    /// Resolve the mode for a target whose terminal status is known
    pub const fn should_color(self, is_terminal: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Automatic => is_terminal,
            Self::Never => false,
        }
    }
}

struct State {
    target: Box<dyn Write + Send>,
    is_terminal: bool,
    should_color: bool,
    fmt: ColorFormatter,
}

/// Colorized output to stdout, stderr or any other stream
pub struct ColorConsoleSink<P: LockPolicy = Mt> {
    state: P::Lock<State>,
}

/// Thread-safe [`ColorConsoleSink`]
pub type ColorConsoleSinkMt = ColorConsoleSink<Mt>;
/// Single-threaded [`ColorConsoleSink`]
pub type ColorConsoleSinkSt = ColorConsoleSink<St>;

impl<P: LockPolicy> ColorConsoleSink<P> {
    /// Write to `target`. `is_terminal` tells `ColorMode::Automatic` whether
    /// the stream supports color.
    pub fn new(target: impl Write + Send + 'static, is_terminal: bool, mode: ColorMode) -> Self {
        Self {
            state: Lockable::new(State {
                target: Box::new(target),
                is_terminal,
                should_color: mode.should_color(is_terminal),
                fmt: ColorFormatter::new(),
            }),
        }
    }

    /// Write to standard output
    pub fn stdout(mode: ColorMode) -> Self {
        let stdout = io::stdout();
        let is_terminal = stdout.is_terminal();
        Self::new(stdout, is_terminal, mode)
    }

    /// Write to standard error
    pub fn stderr(mode: ColorMode) -> Self {
        let stderr = io::stderr();
        let is_terminal = stderr.is_terminal();
        Self::new(stderr, is_terminal, mode)
    }

    /// Change when escape codes are emitted
    pub fn set_color_mode(&self, mode: ColorMode) {
        self.state
            .with_lock(|state| state.should_color = mode.should_color(state.is_terminal));
    }

    /// Whether escape codes are currently emitted
    pub fn should_color(&self) -> bool {
        self.state.with_lock(|state| state.should_color)
    }

    /// Replace the escape string for `level`
    pub fn set_color(&self, level: Level, color: impl Into<String>) {
        let color = color.into();
        self.state.with_lock(|state| state.fmt.set_color(level, color));
    }
}

impl<P: LockPolicy> Sink for ColorConsoleSink<P> {
    fn log(&self, record: &Record<'_>) -> Result<()> {
        self.state.with_lock(|state| -> Result<()> {
            if state.should_color {
                for range in state.fmt.colored(record) {
                    state.target.write_all(range)?;
                }
            } else {
                state.target.write_all(state.fmt.plain(record))?;
            }
            state.target.flush()?;
            Ok(())
        })
    }

    fn flush(&self) -> Result<()> {
        self.state.with_lock(|state| state.target.flush())?;
        Ok(())
    }

    fn set_formatter(&self, formatter: Box<dyn Formatter>) {
        self.state.with_lock(|state| state.fmt.formatter = formatter);
    }
}
