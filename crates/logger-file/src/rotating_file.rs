//! Size-bounded log file with a numbered backup chain
//!
//! ```text
//! log.txt   -> log.1.txt
//! log.1.txt -> log.2.txt
//! log.2.txt -> log.3.txt
//! log.3.txt -> deleted (max_files = 3)
//! ```

use crate::{
    Error, FileEventHandlers, FileWriter, Result, RetryPolicy, RotatingFileConfig,
    split_by_extension,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A log file rotated by size across `max_files` indexed backups.
///
/// The size of the active file is tracked as a running estimate; the real
/// size is only read back from disk when the estimate crosses `max_size`.
#[derive(Debug)]
pub struct RotatingFile {
    base_filename: String,
    max_size: u64,
    max_files: usize,
    current_size: u64,
    rename_retry: RetryPolicy,
    file: FileWriter,
}

impl RotatingFile {
    /// Open `base_filename` with the default retry policies.
    pub fn new(
        base_filename: impl Into<PathBuf>,
        max_size: u64,
        max_files: usize,
        rotate_on_open: bool,
        handlers: FileEventHandlers,
    ) -> Result<Self> {
        let config = RotatingFileConfig::builder(base_filename)
            .max_size(max_size)
            .max_files(max_files)
            .rotate_on_open(rotate_on_open)
            .build()?;
        Self::from_config(&config, handlers)
    }

    /// Open the file described by `config`.
    pub fn from_config(config: &RotatingFileConfig, handlers: FileEventHandlers) -> Result<Self> {
        config.validate()?;
        let base_filename = config
            .path
            .to_str()
            .ok_or_else(|| Error::Configuration("path must be valid UTF-8".to_string()))?
            .to_string();

        let mut file = FileWriter::with_retry_policy(handlers, config.open_retry);
        file.open(&base_filename, false)?;
        let current_size = file.size()?;

        let mut rotating = Self {
            base_filename,
            max_size: config.max_size,
            max_files: config.max_files,
            current_size,
            rename_retry: config.rename_retry,
            file,
        };

        if config.rotate_on_open && rotating.current_size > 0 {
            rotating.rotate()?;
            rotating.current_size = 0;
        }
        Ok(rotating)
    }

    /// Path of backup `index`; index 0 is the active file.
    ///
    /// ```
    /// use proven_logger_file::RotatingFile;
    ///
    /// assert_eq!(RotatingFile::calc_filename("logs/app.log", 0), "logs/app.log");
    /// assert_eq!(RotatingFile::calc_filename("logs/app.log", 3), "logs/app.3.log");
    /// assert_eq!(RotatingFile::calc_filename("logs/app", 2), "logs/app.2");
    /// ```
    pub fn calc_filename(base_filename: &str, index: usize) -> String {
        if index == 0 {
            return base_filename.to_string();
        }
        let (stem, ext) = split_by_extension(base_filename);
        format!("{stem}.{index}{ext}")
    }

    /// Write `buf`, rotating first if it would push the file past `max_size`.
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        let len = buf.len() as u64;
        let mut new_size = self.current_size + len;

        if new_size > self.max_size {
            self.file.flush();
            // An empty file cannot overflow; this also keeps a full disk from
            // rotating on every write.
            if self.file.size()? > 0 {
                self.rotate()?;
                new_size = len;
            } else {
                trace!(file = %self.base_filename, "skipping rotation of empty file");
            }
        }

        self.file.write(buf)?;
        self.current_size = new_size;
        Ok(())
    }

    /// Flush the active file. Best effort.
    pub fn flush(&mut self) {
        self.file.flush();
    }

    /// Path of the active file
    pub fn filename(&self) -> &Path {
        Path::new(&self.base_filename)
    }

    /// Running estimate of the active file's size
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Rotation threshold in bytes
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Number of backups kept
    pub fn max_files(&self) -> usize {
        self.max_files
    }

    fn rotate(&mut self) -> Result<()> {
        debug!(file = %self.base_filename, max_files = self.max_files, "rotating log files");
        self.file.close();

        // Highest index first so every target slot is vacated before
        // anything is renamed into it.
        for i in (1..=self.max_files).rev() {
            let src = Self::calc_filename(&self.base_filename, i - 1);
            if !Path::new(&src).exists() {
                continue;
            }
            let target = Self::calc_filename(&self.base_filename, i);

            if let Err(source) = self.rename_retry.run(|_| rename_file(&src, &target)) {
                // Keep the size bound even though the chain is broken.
                self.file.reopen(true)?;
                self.current_size = 0;
                return Err(Error::Rotation {
                    from: src.into(),
                    to: target.into(),
                    source,
                });
            }
        }

        self.file.reopen(true)
    }
}

/// Delete `target` if it exists, then rename `src` to it.
fn rename_file(src: &str, target: &str) -> io::Result<()> {
    let _ = fs::remove_file(target);
    fs::rename(src, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::{TempDir, tempdir};
    use tracing_test::traced_test;

    fn base_in(dir: &TempDir) -> String {
        dir.path().join("app.log").to_str().unwrap().to_string()
    }

    fn read(path: impl AsRef<Path>) -> String {
        String::from_utf8(fs::read(path).unwrap()).unwrap()
    }

    #[test]
    fn test_calc_filename() {
        assert_eq!(RotatingFile::calc_filename("app.log", 0), "app.log");
        assert_eq!(RotatingFile::calc_filename("app.log", 1), "app.1.log");
        assert_eq!(RotatingFile::calc_filename("dir/.hidden", 2), "dir/.hidden.2");
        assert_eq!(RotatingFile::calc_filename("dir/.hidden.log", 12), "dir/.hidden.12.log");
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);

        let err = RotatingFile::new(&base, 0, 3, false, FileEventHandlers::new()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err =
            RotatingFile::new(&base, 100, 200_001, false, FileEventHandlers::new()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        // Nothing is created when construction is rejected
        assert!(!Path::new(&base).exists());
    }

    #[test]
    fn test_reads_existing_size_on_open() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);
        fs::write(&base, b"0123456789").unwrap();

        let file = RotatingFile::new(&base, 100, 3, false, FileEventHandlers::new()).unwrap();
        assert_eq!(file.current_size(), 10);
    }

    #[test]
    fn test_rotates_once_at_crossing_write() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);
        let record = [b'a'; 30];

        let mut file = RotatingFile::new(&base, 100, 3, false, FileEventHandlers::new()).unwrap();
        for _ in 0..3 {
            file.write(&record).unwrap();
        }
        assert_eq!(file.current_size(), 90);
        assert!(!Path::new(&RotatingFile::calc_filename(&base, 1)).exists());

        file.write(&[b'b'; 30]).unwrap();
        file.flush();

        assert_eq!(file.current_size(), 30);
        assert_eq!(read(RotatingFile::calc_filename(&base, 1)), "a".repeat(90));
        assert_eq!(read(&base), "b".repeat(30));
        assert!(!Path::new(&RotatingFile::calc_filename(&base, 2)).exists());
    }

    #[test]
    fn test_write_exactly_at_limit_does_not_rotate() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);

        let mut file = RotatingFile::new(&base, 100, 3, false, FileEventHandlers::new()).unwrap();
        file.write(&[b'x'; 100]).unwrap();
        file.flush();

        assert_eq!(file.current_size(), 100);
        assert!(!Path::new(&RotatingFile::calc_filename(&base, 1)).exists());
    }

    #[test]
    fn test_chain_shifts_every_backup_up() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);
        fs::write(&base, b"zero").unwrap();
        fs::write(RotatingFile::calc_filename(&base, 1), b"one").unwrap();
        fs::write(RotatingFile::calc_filename(&base, 2), b"two").unwrap();

        let mut file = RotatingFile::new(&base, 5, 3, false, FileEventHandlers::new()).unwrap();
        file.write(b"fresh").unwrap();
        file.flush();

        assert_eq!(read(&base), "fresh");
        assert_eq!(read(RotatingFile::calc_filename(&base, 1)), "zero");
        assert_eq!(read(RotatingFile::calc_filename(&base, 2)), "one");
        assert_eq!(read(RotatingFile::calc_filename(&base, 3)), "two");
    }

    #[test]
    fn test_chain_discards_top_backup() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);
        fs::write(&base, b"zero").unwrap();
        fs::write(RotatingFile::calc_filename(&base, 1), b"one").unwrap();
        fs::write(RotatingFile::calc_filename(&base, 2), b"two").unwrap();

        let mut file = RotatingFile::new(&base, 5, 2, false, FileEventHandlers::new()).unwrap();
        file.write(b"fresh").unwrap();
        file.flush();

        assert_eq!(read(&base), "fresh");
        assert_eq!(read(RotatingFile::calc_filename(&base, 1)), "zero");
        assert_eq!(read(RotatingFile::calc_filename(&base, 2)), "one");
        assert!(!Path::new(&RotatingFile::calc_filename(&base, 3)).exists());
    }

    #[test]
    fn test_sparse_chain_is_tolerated() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);
        fs::write(&base, b"zero").unwrap();
        fs::write(RotatingFile::calc_filename(&base, 2), b"two").unwrap();

        let mut file = RotatingFile::new(&base, 5, 3, false, FileEventHandlers::new()).unwrap();
        file.write(b"fresh").unwrap();
        file.flush();

        assert_eq!(read(RotatingFile::calc_filename(&base, 1)), "zero");
        assert!(!Path::new(&RotatingFile::calc_filename(&base, 2)).exists());
        assert_eq!(read(RotatingFile::calc_filename(&base, 3)), "two");
    }

    #[test]
    fn test_zero_max_files_only_truncates() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);

        let mut file = RotatingFile::new(&base, 10, 0, false, FileEventHandlers::new()).unwrap();
        file.write(b"0123456789").unwrap();
        file.write(b"abc").unwrap();
        file.flush();

        assert_eq!(read(&base), "abc");
        assert!(!Path::new(&RotatingFile::calc_filename(&base, 1)).exists());
    }

    #[test]
    fn test_skips_rotation_when_file_is_empty_on_disk() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);

        let mut file = RotatingFile::new(&base, 100, 3, false, FileEventHandlers::new()).unwrap();
        file.write(&[b'a'; 90]).unwrap();
        file.flush();

        // Truncated behind our back
        fs::OpenOptions::new()
            .write(true)
            .open(&base)
            .unwrap()
            .set_len(0)
            .unwrap();

        file.write(&[b'b'; 20]).unwrap();
        file.flush();

        assert_eq!(file.current_size(), 110);
        assert!(!Path::new(&RotatingFile::calc_filename(&base, 1)).exists());
        assert_eq!(read(&base), "b".repeat(20));
    }

    #[test]
    fn test_rotate_on_open() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);
        fs::write(&base, b"previous run").unwrap();

        let file = RotatingFile::new(&base, 100, 3, true, FileEventHandlers::new()).unwrap();

        assert_eq!(file.current_size(), 0);
        assert_eq!(read(&base), "");
        assert_eq!(read(RotatingFile::calc_filename(&base, 1)), "previous run");
    }

    #[test]
    fn test_rotate_on_open_ignores_empty_file() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);
        fs::write(&base, b"").unwrap();

        RotatingFile::new(&base, 100, 3, true, FileEventHandlers::new()).unwrap();

        assert!(!Path::new(&RotatingFile::calc_filename(&base, 1)).exists());
    }

    #[test]
    fn test_failed_rename_truncates_active_file() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);

        // A non-empty directory in the first backup slot cannot be replaced
        let blocker = PathBuf::from(RotatingFile::calc_filename(&base, 1));
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), b"").unwrap();

        let mut file = RotatingFile::new(&base, 10, 1, false, FileEventHandlers::new()).unwrap();
        file.write(b"0123456789").unwrap();

        let start = Instant::now();
        let err = file.write(b"overflow").unwrap_err();

        assert!(start.elapsed() >= Duration::from_millis(100));
        match &err {
            Error::Rotation { from, to, .. } => {
                assert_eq!(from, &PathBuf::from(&base));
                assert_eq!(to, &blocker);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.raw_os_error().is_some());
        assert_eq!(file.current_size(), 0);
        assert_eq!(read(&base), "");

        // The engine stays usable
        file.write(b"after").unwrap();
        file.flush();
        assert_eq!(read(&base), "after");
    }

    #[traced_test]
    #[test]
    fn test_rotation_is_traced() {
        let dir = tempdir().unwrap();
        let base = base_in(&dir);

        let mut file = RotatingFile::new(&base, 4, 1, false, FileEventHandlers::new()).unwrap();
        file.write(b"abcd").unwrap();
        file.write(b"e").unwrap();

        assert!(logs_contain("rotating log files"));
    }
}
