use std::sync::{Mutex, PoisonError};

use crate::{element::Element, record::Record};

use super::{DefaultProcessor, Processor};

#[derive(Default)]
struct Buffer {
    records: Vec<Record>,
    size: usize,
}

/// Holds records back until `flush` or until buffering one more would go
/// over `limit` bytes, then replays them through the wrapped processor.
pub struct BufferedProcessor {
    inner: DefaultProcessor,
    limit: usize,
    buffer: Mutex<Buffer>,
}

impl BufferedProcessor {
    pub const DEFAULT_LIMIT: usize = 1024 * 1024;

    pub fn new(inner: DefaultProcessor, limit: usize) -> Self {
        Self {
            inner,
            limit,
            buffer: Mutex::new(Buffer::default()),
        }
    }

    fn replay(&self, buffer: &mut Buffer) {
        for mut record in buffer.records.drain(..) {
            self.inner.process_record(&mut record);
        }
        buffer.size = 0;
    }
}

impl Element for BufferedProcessor {
    fn is_started(&self) -> bool {
        self.inner.is_started()
    }

    fn start(&self) -> bool {
        self.inner.start()
    }

    fn stop(&self) -> bool {
        if !self.inner.is_started() {
            return false;
        }
        self.flush();
        self.inner.stop()
    }
}

impl Processor for BufferedProcessor {
    fn filter_record(&self, record: &Record) -> bool {
        self.inner.filter_record(record)
    }

    fn process_record(&self, record: &mut Record) -> bool {
        if !self.inner.is_started() {
            return true;
        }

        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        let size = record.size();
        if !buffer.records.is_empty() && buffer.size + size > self.limit {
            self.replay(&mut buffer);
        }
        buffer.records.push(record.clone());
        buffer.size += size;
        true
    }

    fn flush(&self) {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        self.replay(&mut buffer);
        self.inner.flush();
    }
}

impl Drop for BufferedProcessor {
    fn drop(&mut self) {
        let buffer = self.buffer.get_mut().unwrap_or_else(PoisonError::into_inner);
        for mut record in buffer.records.drain(..) {
            self.inner.process_record(&mut record);
        }
    }
}
