use std::{
    sync::{
        mpsc::{channel, Sender},
        Arc, PoisonError, RwLock,
    },
    thread::JoinHandle,
};

use crate::{element::Element, error::Result, record::Record};

use super::{
    worker::{self, Message, ThreadHooks},
    DefaultProcessor, Processor,
};

struct Worker {
    sender: Sender<Message>,
    handle: JoinHandle<()>,
}

/// Hands records to a background thread through an unbounded queue.
/// Producers never block.
///
/// The thread flushes on request, when idle and at least once per second
/// of record time. Stopping drains the queue first.
pub struct AsyncWaitProcessor {
    inner: Arc<DefaultProcessor>,
    hooks: ThreadHooks,
    worker: RwLock<Option<Worker>>,
}

impl AsyncWaitProcessor {
    pub fn new(inner: DefaultProcessor, auto_start: bool) -> Result<Self> {
        Self::with_hooks(inner, ThreadHooks::default(), auto_start)
    }

    pub fn with_hooks(inner: DefaultProcessor, hooks: ThreadHooks, auto_start: bool) -> Result<Self> {
        let processor = Self {
            inner: Arc::new(inner),
            hooks,
            worker: RwLock::new(None),
        };
        if auto_start {
            processor.spawn()?;
        }
        Ok(processor)
    }

    fn spawn(&self) -> Result<bool> {
        let mut worker = self.worker.write().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            return Ok(false);
        }

        self.inner.start();
        let (sender, receiver) = channel();
        let handle = worker::spawn(
            "lumber-async",
            self.inner.clone(),
            receiver,
            self.hooks.clone(),
        )?;
        *worker = Some(Worker { sender, handle });
        Ok(true)
    }
}

impl Element for AsyncWaitProcessor {
    fn is_started(&self) -> bool {
        self.worker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn start(&self) -> bool {
        self.spawn().unwrap_or_else(|e| {
            eprintln!("Logging error: {}", e.report());
            false
        })
    }

    fn stop(&self) -> bool {
        let Some(worker) = self
            .worker
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return false;
        };

        let _ = worker.sender.send(Message::Stop);
        worker::join(worker.handle);
        self.inner.stop();
        true
    }
}

impl Processor for AsyncWaitProcessor {
    fn filter_record(&self, record: &Record) -> bool {
        self.inner.filter_record(record)
    }

    fn process_record(&self, record: &mut Record) -> bool {
        let worker = self.worker.read().unwrap_or_else(PoisonError::into_inner);
        let Some(worker) = worker.as_ref() else {
            return true;
        };

        if !self.inner.filter_record(record) {
            return true;
        }

        let _ = worker
            .sender
            .send(Message::Record(Box::new(record.clone())));
        true
    }

    fn flush(&self) {
        if let Some(worker) = self
            .worker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            let _ = worker.sender.send(Message::Flush);
        }
    }
}

impl Drop for AsyncWaitProcessor {
    fn drop(&mut self) {
        self.stop();
    }
}
