//! ANSI colorization of formatted records

use crate::{FormattedRecord, Level};

/// ANSI escape sequences
pub mod codes {
    /// Reset all attributes
    pub const RESET: &str = "\x1b[m";
    /// Bold
    pub const BOLD: &str = "\x1b[1m";
    /// Dim
    pub const DARK: &str = "\x1b[2m";
    /// Underline
    pub const UNDERLINE: &str = "\x1b[4m";
    /// Blink
    pub const BLINK: &str = "\x1b[5m";
    /// Reverse video
    pub const REVERSE: &str = "\x1b[7m";
    /// Concealed
    pub const CONCEALED: &str = "\x1b[8m";
    /// Clear to end of line
    pub const CLEAR_LINE: &str = "\x1b[K";

    /// Black foreground
    pub const BLACK: &str = "\x1b[30m";
    /// Red foreground
    pub const RED: &str = "\x1b[31m";
    /// Green foreground
    pub const GREEN: &str = "\x1b[32m";
    /// Yellow foreground
    pub const YELLOW: &str = "\x1b[33m";
    /// Blue foreground
    pub const BLUE: &str = "\x1b[34m";
    /// Magenta foreground
    pub const MAGENTA: &str = "\x1b[35m";
    /// Cyan foreground
    pub const CYAN: &str = "\x1b[36m";
    /// White foreground
    pub const WHITE: &str = "\x1b[37m";

    /// Black background
    pub const ON_BLACK: &str = "\x1b[40m";
    /// Red background
    pub const ON_RED: &str = "\x1b[41m";
    /// Green background
    pub const ON_GREEN: &str = "\x1b[42m";
    /// Yellow background
    pub const ON_YELLOW: &str = "\x1b[43m";
    /// Blue background
    pub const ON_BLUE: &str = "\x1b[44m";
    /// Magenta background
    pub const ON_MAGENTA: &str = "\x1b[45m";
    /// Cyan background
    pub const ON_CYAN: &str = "\x1b[46m";
    /// White background
    pub const ON_WHITE: &str = "\x1b[47m";

    /// Bold yellow
    pub const YELLOW_BOLD: &str = "\x1b[33m\x1b[1m";
    /// Bold red
    pub const RED_BOLD: &str = "\x1b[31m\x1b[1m";
    /// Bold on a red background
    pub const BOLD_ON_RED: &str = "\x1b[1m\x1b[41m";
}

/// Per-level escape strings and the splicing of formatted records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsiColors {
    colors: [String; Level::COUNT],
}

impl AnsiColors {
    /// Create the table with the default colors
    pub fn new() -> Self {
        Self {
            colors: Level::ALL.map(|level| Self::default_color(level).to_string()),
        }
    }

    /// The escape string a level starts with
    pub const fn default_color(level: Level) -> &'static str {
        match level {
            Level::Trace => codes::WHITE,
            Level::Debug => codes::CYAN,
            Level::Info => codes::GREEN,
            Level::Warn => codes::YELLOW_BOLD,
            Level::Error => codes::RED_BOLD,
            Level::Critical => codes::BOLD_ON_RED,
            Level::Off => codes::RESET,
        }
    }

    /// Replace the escape string for `level`. The string is not validated.
    pub fn set_color(&mut self, level: Level, color: impl Into<String>) {
        self.colors[level.ordinal()] = color.into();
    }

    /// The escape string for `level`
    pub fn color(&self, level: Level) -> &str {
        &self.colors[level.ordinal()]
    }

    /// Split a formatted record into the byte ranges to write, in order.
    ///
    /// With a non-empty color range the result is prefix (if any), the
    /// level's escape string, the colored span, the reset code and the suffix
    /// (if any). Otherwise it is the whole buffer. Content bytes are never
    /// altered; a range reaching past the buffer is cut at its end.
    pub fn ranges<'a>(&'a self, record: &FormattedRecord<'a>) -> Vec<&'a [u8]> {
        let buf = record.buf;
        let end = record.color_range.end.min(buf.len());
        let start = record.color_range.start;

        if end <= start {
            return vec![buf];
        }

        let mut result = Vec::with_capacity(5);
        if start > 0 {
            result.push(&buf[..start]);
        }
        result.push(self.color(record.level).as_bytes());
        result.push(&buf[start..end]);
        result.push(codes::RESET.as_bytes());
        if end < buf.len() {
            result.push(&buf[end..]);
        }
        result
    }
}

impl Default for AnsiColors {
    fn default() -> Self {
        Self::new()
    }
}
