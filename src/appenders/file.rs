use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::{
    element::Element,
    error::{IoResultExt, Result},
    record::Record,
};

use super::Appender;

/// How long to wait before trying to reopen a file after an I/O failure.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Opens a file for appending (or truncation), creating parent directories
/// as needed.
pub(crate) fn open_file(path: &Path, truncate: bool) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_path(parent)?;
    }

    OpenOptions::new()
        .create(true)
        .write(true)
        .append(!truncate)
        .truncate(truncate)
        .open(path)
        .with_path(path)
}

/// Lazily opened output file with a retry window after failures.
#[derive(Debug)]
pub(crate) struct LogFile {
    path: PathBuf,
    truncate: bool,
    file: Option<BufWriter<File>>,
    retry: Option<Instant>,
    /// Bytes in the file, including what was there before it was opened.
    pub size: u64,
}

impl LogFile {
    pub fn new(path: PathBuf, truncate: bool) -> Self {
        Self {
            path,
            truncate,
            file: None,
            retry: None,
            size: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Points at a new path. The current file, if any, is closed.
    pub fn set_path(&mut self, path: PathBuf) {
        self.close();
        self.path = path;
        self.retry = None;
    }

    /// Makes sure the file is open. Returns `false` while a recent failure
    /// is still being waited out, or if opening fails again.
    pub fn prepare(&mut self) -> bool {
        if self.file.is_some() {
            return true;
        }

        if self
            .retry
            .is_some_and(|failed| failed.elapsed() < RETRY_DELAY)
        {
            return false;
        }

        match open_file(&self.path, self.truncate) {
            Ok(file) => {
                self.size = file.metadata().map(|m| m.len()).unwrap_or(0);
                self.file = Some(BufWriter::new(file));
                self.retry = None;
                true
            }
            Err(e) => {
                eprintln!("Logging error: {}", e.report());
                self.retry = Some(Instant::now());
                false
            }
        }
    }

    pub fn write(&mut self, data: &[u8], auto_flush: bool) {
        if !self.prepare() {
            return;
        }

        let Some(file) = self.file.as_mut() else {
            return;
        };

        let result = file.write_all(data).and_then(|()| {
            if auto_flush {
                file.flush()
            } else {
                Ok(())
            }
        });

        match result {
            Ok(()) => self.size += data.len() as u64,
            Err(e) => {
                eprintln!(
                    "Logging error: failed to write to '{}': {}",
                    self.path.display(),
                    e
                );
                self.file = None;
                self.retry = Some(Instant::now());
            }
        }
    }

    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush() {
                eprintln!(
                    "Logging error: failed to flush '{}': {}",
                    self.path.display(),
                    e
                );
                self.file = None;
                self.retry = Some(Instant::now());
            }
        }
    }

    pub fn close(&mut self) {
        self.flush();
        self.file = None;
        self.size = 0;
    }
}

/// Appends records to a single file.
///
/// The file is opened on the first record. If an I/O error occurs the
/// record is dropped, the file is closed and reopening is not attempted
/// again for 100 ms.
#[derive(Debug)]
pub struct FileAppender {
    file: Mutex<LogFile>,
    auto_flush: bool,
}

impl FileAppender {
    pub fn new(path: impl Into<PathBuf>, truncate: bool, auto_flush: bool) -> Self {
        Self {
            file: Mutex::new(LogFile::new(path.into(), truncate)),
            auto_flush,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .path()
            .to_path_buf()
    }
}

impl Element for FileAppender {
    fn stop(&self) -> bool {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .close();
        true
    }
}

impl Appender for FileAppender {
    fn append_record(&self, record: &Record) {
        if record.raw.is_empty() {
            return;
        }
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(&record.raw, self.auto_flush);
    }

    fn flush(&self) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if file.prepare() {
            file.flush();
        }
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        self.file
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .close();
    }
}
