use std::sync::{Mutex, PoisonError};

use crate::{element::Element, record::Record};

use super::{DefaultProcessor, Processor};

/// Serializes access to the wrapped processor, so appenders that are not
/// safe to call concurrently see one record at a time.
pub struct SyncProcessor {
    inner: DefaultProcessor,
    lock: Mutex<()>,
}

impl SyncProcessor {
    pub fn new(inner: DefaultProcessor) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }

    pub fn inner(&self) -> &DefaultProcessor {
        &self.inner
    }
}

impl Element for SyncProcessor {
    fn is_started(&self) -> bool {
        self.inner.is_started()
    }

    fn start(&self) -> bool {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.start()
    }

    fn stop(&self) -> bool {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.stop()
    }
}

impl Processor for SyncProcessor {
    fn filter_record(&self, record: &Record) -> bool {
        self.inner.filter_record(record)
    }

    fn process_record(&self, record: &mut Record) -> bool {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.process_record(record)
    }

    fn flush(&self) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{sync::Arc, thread};

    use crate::{level::Level, processors::testing::collecting};

    #[test]
    fn test_concurrent_producers() {
        let (inner, appender) = collecting();
        let processor = Arc::new(SyncProcessor::new(inner));
        processor.start();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let processor = processor.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let mut record =
                            Record::new(Level::Info, "app", format!("{}-{}", t, i));
                        processor.process_record(&mut record);
                    }
                })
            })
            .collect();
        handles.into_iter().for_each(|h| h.join().unwrap());

        assert_eq!(appender.lines().len(), 200);
    }
}
