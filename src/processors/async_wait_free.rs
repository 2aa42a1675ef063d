use std::{
    sync::{
        mpsc::{sync_channel, SyncSender, TrySendError},
        Arc, PoisonError, RwLock,
    },
    thread::JoinHandle,
};

use crate::{
    element::Element,
    error::{LoggingError, Result},
    record::Record,
};

use super::{
    worker::{self, Message, ThreadHooks},
    DefaultProcessor, Processor,
};

struct Worker {
    sender: SyncSender<Message>,
    handle: JoinHandle<()>,
}

/// Background processor with a bounded queue of `capacity` records.
///
/// When the queue is full a producer either waits for room or, with
/// `discard` set, drops the record and gets `false` back.
pub struct AsyncWaitFreeProcessor {
    inner: Arc<DefaultProcessor>,
    capacity: usize,
    discard: bool,
    hooks: ThreadHooks,
    worker: RwLock<Option<Worker>>,
}

impl AsyncWaitFreeProcessor {
    pub const DEFAULT_CAPACITY: usize = 8192;

    pub fn new(
        inner: DefaultProcessor,
        capacity: usize,
        discard: bool,
        auto_start: bool,
    ) -> Result<Self> {
        Self::with_hooks(inner, capacity, discard, ThreadHooks::default(), auto_start)
    }

    pub fn with_hooks(
        inner: DefaultProcessor,
        capacity: usize,
        discard: bool,
        hooks: ThreadHooks,
        auto_start: bool,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(LoggingError::InvalidArgument(
                "queue capacity must be greater than zero",
            ));
        }

        let processor = Self {
            inner: Arc::new(inner),
            capacity,
            discard,
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
        let (sender, receiver) = sync_channel(self.capacity);
        let handle = worker::spawn(
            "lumber-async-bounded",
            self.inner.clone(),
            receiver,
            self.hooks.clone(),
        )?;
        *worker = Some(Worker { sender, handle });
        Ok(true)
    }
}

impl Element for AsyncWaitFreeProcessor {
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

impl Processor for AsyncWaitFreeProcessor {
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

        let message = Message::Record(Box::new(record.clone()));
        if self.discard {
            match worker.sender.try_send(message) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
            }
        } else {
            worker.sender.send(message).is_ok()
        }
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

impl Drop for AsyncWaitFreeProcessor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Condvar, Mutex};

    use crate::{
        appenders::Appender, element::Element, level::Level, processors::testing::collecting,
    };

    /// Appender that blocks until released, so the queue can fill up.
    #[derive(Default)]
    struct Gate {
        open: Mutex<bool>,
        changed: Condvar,
    }

    impl Gate {
        fn release(&self) {
            *self.open.lock().unwrap() = true;
            self.changed.notify_all();
        }
    }

    impl Element for Gate {}

    impl Appender for Gate {
        fn append_record(&self, _record: &Record) {
            let mut open = self.open.lock().unwrap();
            while !*open {
                open = self.changed.wait(open).unwrap();
            }
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let (inner, _) = collecting();
        assert!(AsyncWaitFreeProcessor::new(inner, 0, true, false).is_err());
    }

    #[test]
    fn test_discard_when_full() {
        let gate = Arc::new(Gate::default());
        let (inner, appender) = collecting();
        let inner = inner.with_shared_appender(gate.clone());
        let processor = AsyncWaitFreeProcessor::new(inner, 2, true, true).unwrap();

        let mut accepted = 0;
        let mut dropped = 0;
        for i in 0..20 {
            let mut record = Record::new(Level::Info, "app", i.to_string());
            if processor.process_record(&mut record) {
                accepted += 1;
            } else {
                dropped += 1;
            }
        }
        assert!(dropped > 0, "A blocked worker should make the queue overflow");

        gate.release();
        processor.stop();
        assert_eq!(appender.lines().len(), accepted);
    }

    #[test]
    fn test_blocking_mode_keeps_everything() {
        let (inner, appender) = collecting();
        let processor = AsyncWaitFreeProcessor::new(inner, 4, false, true).unwrap();
        for i in 0..100 {
            assert!(processor.process_record(&mut Record::new(Level::Info, "app", i.to_string())));
        }
        processor.stop();
        assert_eq!(appender.lines().len(), 100);
    }
}
