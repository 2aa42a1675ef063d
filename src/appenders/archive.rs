use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{
        mpsc::{channel, Sender},
        Arc, Condvar, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
};

use crate::{
    error::{IoResultExt, Result},
    processors::ThreadHooks,
};

pub(crate) const ARCHIVE_EXTENSION: &str = "zst";

/// `name.log` -> `name.log.zst`
pub(crate) fn archive_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ARCHIVE_EXTENSION);
    PathBuf::from(name)
}

/// Compresses `path` next to itself and removes the original.
pub(crate) fn archive_file(path: &Path) -> Result<PathBuf> {
    let target = archive_path(path);
    {
        let source = BufReader::new(File::open(path).with_path(path)?);
        let destination = File::create(&target).with_path(&target)?;
        zstd::stream::copy_encode(source, destination, 0).with_path(&target)?;
    }
    std::fs::remove_file(path).with_path(path)?;
    Ok(target)
}

#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

/// Background thread that compresses finished log files.
pub(crate) struct Archiver {
    sender: Option<Sender<PathBuf>>,
    handle: Option<JoinHandle<()>>,
    pending: Arc<Pending>,
}

impl Archiver {
    /// Starts the archive thread; `hooks` run on it before the first file
    /// and after the last one.
    pub fn new(hooks: ThreadHooks) -> Result<Self> {
        let (sender, receiver) = channel::<PathBuf>();
        let pending = Arc::new(Pending::default());

        let worker_pending = pending.clone();
        let handle = thread::Builder::new()
            .name("lumber-archiver".into())
            .spawn(move || {
                hooks.initialize();
                for path in receiver {
                    if let Err(e) = archive_file(&path) {
                        eprintln!("Logging error: failed to archive: {}", e.report());
                    }
                    let mut count = worker_pending
                        .count
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    *count -= 1;
                    if *count == 0 {
                        worker_pending.idle.notify_all();
                    }
                }
                hooks.cleanup();
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
            pending,
        })
    }

    pub fn archive(&self, path: PathBuf) {
        let Some(sender) = self.sender.as_ref() else {
            return;
        };

        *self
            .pending
            .count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;

        if let Err(e) = sender.send(path) {
            eprintln!(
                "Logging error: archiver is gone, '{}' stays uncompressed",
                e.0.display()
            );
            *self
                .pending
                .count
                .lock()
                .unwrap_or_else(PoisonError::into_inner) -= 1;
        }
    }

    /// Blocks until every queued file has been processed.
    pub fn wait_idle(&self) {
        let mut count = self
            .pending
            .count
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *count > 0 {
            count = self
                .pending
                .idle
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Drop for Archiver {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish the queue and exit
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                eprintln!("Logging error: archiver thread panicked");
            }
        }
    }
}
