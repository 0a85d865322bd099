//! Retrying ownership of a single writable log file

use crate::{Error, Result, RetryPolicy};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf, is_separator};
use std::sync::Arc;
use tracing::trace;

type PathHook = Arc<dyn Fn(&Path) + Send + Sync>;
type FileHook = Arc<dyn Fn(&Path, &mut File) + Send + Sync>;

/// Callbacks invoked around file opens and closes
#[derive(Clone, Default)]
pub struct FileEventHandlers {
    before_open: Option<PathHook>,
    after_open: Option<FileHook>,
    before_close: Option<FileHook>,
    after_close: Option<PathHook>,
}

impl FileEventHandlers {
    /// Create an empty set of handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Called before every open attempt
    #[must_use]
    pub fn before_open(mut self, f: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.before_open = Some(Arc::new(f));
        self
    }

    /// Called after a successful open, before anything is written
    #[must_use]
    pub fn after_open(mut self, f: impl Fn(&Path, &mut File) + Send + Sync + 'static) -> Self {
        self.after_open = Some(Arc::new(f));
        self
    }

    /// Called with the flushed file right before it is closed
    #[must_use]
    pub fn before_close(mut self, f: impl Fn(&Path, &mut File) + Send + Sync + 'static) -> Self {
        self.before_close = Some(Arc::new(f));
        self
    }

    /// Called after the file has been closed
    #[must_use]
    pub fn after_close(mut self, f: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.after_close = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for FileEventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEventHandlers")
            .field("before_open", &self.before_open.is_some())
            .field("after_open", &self.after_open.is_some())
            .field("before_close", &self.before_close.is_some())
            .field("after_close", &self.after_close.is_some())
            .finish()
    }
}

/// Owns one OS file handle.
///
/// A `FileWriter` is not synchronized; callers serialize access.
#[derive(Debug)]
pub struct FileWriter {
    file: Option<BufWriter<File>>,
    filename: Option<PathBuf>,
    retry: RetryPolicy,
    handlers: FileEventHandlers,
}

impl FileWriter {
    /// Create a closed writer that retries opens with [`RetryPolicy::OPEN`]
    pub fn new(handlers: FileEventHandlers) -> Self {
        Self::with_retry_policy(handlers, RetryPolicy::OPEN)
    }

    /// Create a closed writer with a custom open retry policy
    pub fn with_retry_policy(handlers: FileEventHandlers, retry: RetryPolicy) -> Self {
        Self {
            file: None,
            filename: None,
            retry,
            handlers,
        }
    }

    /// Open `path` for writing, closing any file that is currently open.
    ///
    /// Missing parent directories are created. With `truncate` the file is
    /// emptied first; writes always append.
    pub fn open(&mut self, path: impl AsRef<Path>, truncate: bool) -> Result<()> {
        self.close();
        let path = path.as_ref();
        self.filename = Some(path.to_path_buf());

        let handlers = &self.handlers;
        let file = self
            .retry
            .run(|attempt| {
                let result = Self::try_open(handlers, path, truncate);
                if let Err(e) = &result {
                    trace!(path = %path.display(), attempt, error = %e, "open attempt failed");
                }
                result
            })
            .map_err(|source| Error::FileOpen {
                path: path.to_path_buf(),
                source,
            })?;

        self.file = Some(BufWriter::new(file));
        Ok(())
    }

    fn try_open(
        handlers: &FileEventHandlers,
        path: &Path,
        truncate: bool,
    ) -> std::io::Result<File> {
        if let Some(hook) = &handlers.before_open {
            hook(path);
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                // A failure here shows up as an open failure below
                let _ = fs::create_dir_all(parent);
            }
        }

        if truncate {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        if let Some(hook) = &handlers.after_open {
            hook(path, &mut file);
        }
        Ok(file)
    }

    /// Re-open the file last passed to [`open`](Self::open)
    pub fn reopen(&mut self, truncate: bool) -> Result<()> {
        let path = self
            .filename
            .clone()
            .ok_or(Error::Usage("cannot reopen a file that was never opened"))?;
        self.open(path, truncate)
    }

    /// Write the whole buffer or fail
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or(Error::Usage("cannot write to a closed file"))?;
        file.write_all(buf).map_err(|source| Error::FileWrite {
            path: self.filename.clone().unwrap_or_default(),
            source,
        })
    }

    /// Push buffered bytes to the OS. Best effort.
    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }

    /// Close the file. Does nothing if already closed.
    pub fn close(&mut self) {
        let Some(mut writer) = self.file.take() else {
            return;
        };
        let _ = writer.flush();
        let path = self.filename.clone().unwrap_or_default();

        if let Some(hook) = &self.handlers.before_close {
            hook(&path, writer.get_mut());
        }
        drop(writer);
        if let Some(hook) = &self.handlers.after_close {
            hook(&path);
        }
    }

    /// Size of the open file on disk.
    ///
    /// This stats the file; do not call it per write. Bytes still sitting in
    /// the write buffer are not counted until [`flush`](Self::flush).
    pub fn size(&self) -> Result<u64> {
        let file = self
            .file
            .as_ref()
            .ok_or(Error::Usage("cannot query the size of a closed file"))?;
        Ok(file.get_ref().metadata()?.len())
    }

    /// Whether a file is currently open
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// The file last passed to [`open`](Self::open)
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Split a file name into stem and extension.
///
/// The extension starts at the last `.` of the final path segment. A dot
/// that starts the segment (hidden files) or ends the name does not begin an
/// extension.
///
/// ```
/// use proven_logger_file::split_by_extension;
///
/// assert_eq!(split_by_extension("mylog.txt"), ("mylog", ".txt"));
/// assert_eq!(split_by_extension("mylog"), ("mylog", ""));
/// assert_eq!(split_by_extension("dir/.mylog"), ("dir/.mylog", ""));
/// assert_eq!(split_by_extension("dir/.mylog.txt"), ("dir/.mylog", ".txt"));
/// ```
pub fn split_by_extension(filename: &str) -> (&str, &str) {
    let Some(dot) = filename.rfind('.') else {
        return (filename, "");
    };
    if dot == 0 || dot == filename.len() - 1 {
        return (filename, "");
    }

    let segment_start = filename
        .char_indices()
        .filter(|(_, c)| is_separator(*c))
        .map(|(i, c)| i + c.len_utf8())
        .last()
        .unwrap_or(0);
    if dot <= segment_start {
        return (filename, "");
    }

    filename.split_at(dot)
}
