use std::{
    fmt,
    sync::{
        mpsc::{Receiver, RecvTimeoutError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{error::Result, record::Record};

use super::{DefaultProcessor, Processor};

/// Upper bound between two flushes of the background processor.
const FLUSH_PERIOD: Duration = Duration::from_secs(1);

pub(super) enum Message {
    Record(Box<Record>),
    Flush,
    Stop,
}

type Hook = Arc<dyn Fn() + Send + Sync>;

/// Callbacks run on a background thread (processor worker or archiver)
/// right after it starts and right before it exits.
#[derive(Clone, Default)]
pub struct ThreadHooks {
    initialize: Option<Hook>,
    cleanup: Option<Hook>,
}

impl ThreadHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_initialize(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.initialize = Some(Arc::new(hook));
        self
    }

    pub fn on_cleanup(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.cleanup = Some(Arc::new(hook));
        self
    }

    pub(crate) fn initialize(&self) {
        if let Some(initialize) = self.initialize.as_ref() {
            initialize();
        }
    }

    pub(crate) fn cleanup(&self) {
        if let Some(cleanup) = self.cleanup.as_ref() {
            cleanup();
        }
    }
}

impl fmt::Debug for ThreadHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadHooks")
            .field("initialize", &self.initialize.is_some())
            .field("cleanup", &self.cleanup.is_some())
            .finish()
    }
}

/// Spawns the thread that drains `receiver` into `inner`.
pub(super) fn spawn(
    name: &str,
    inner: Arc<DefaultProcessor>,
    receiver: Receiver<Message>,
    hooks: ThreadHooks,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name(name.into())
        .spawn(move || run(&inner, receiver, &hooks))?;
    Ok(handle)
}

fn run(inner: &DefaultProcessor, receiver: Receiver<Message>, hooks: &ThreadHooks) {
    hooks.initialize();

    let period = FLUSH_PERIOD.as_nanos() as u64;
    let mut last_flush: Option<u64> = None;

    loop {
        match receiver.recv_timeout(FLUSH_PERIOD) {
            Ok(Message::Record(mut record)) => {
                inner.process_record(&mut record);
                match last_flush {
                    Some(flushed) if record.timestamp < flushed.saturating_add(period) => {}
                    Some(_) => {
                        inner.flush();
                        last_flush = Some(record.timestamp);
                    }
                    None => last_flush = Some(record.timestamp),
                }
            }
            Ok(Message::Flush) | Err(RecvTimeoutError::Timeout) => inner.flush(),
            Ok(Message::Stop) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    inner.flush();
    hooks.cleanup();
}

/// Joins a worker, reporting a panic instead of propagating it.
pub(super) fn join(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        eprintln!("Logging error: background processor thread panicked");
    }
}
