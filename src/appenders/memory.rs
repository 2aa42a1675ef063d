use std::sync::{Mutex, PoisonError};

use crate::{element::Element, record::Record};

use super::Appender;

/// Collects the raw bytes of every record in memory.
#[derive(Debug, Default)]
pub struct MemoryAppender {
    buffer: Mutex<Vec<u8>>,
}

impl MemoryAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything appended so far.
    pub fn buffer(&self) -> Vec<u8> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the collected bytes and leaves the appender empty.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buffer.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn clear(&self) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Element for MemoryAppender {}

impl Appender for MemoryAppender {
    fn append_record(&self, record: &Record) {
        if record.raw.is_empty() {
            return;
        }
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(&record.raw);
    }
}
