use std::{
    io::Write,
    sync::{Mutex, PoisonError},
};

use crate::{element::Element, record::Record};

use super::Appender;

/// Forwards records to any writer, e.g. a socket or an in-memory cursor.
pub struct WriterAppender<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterAppender<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Element for WriterAppender<W> {}

impl<W: Write + Send> Appender for WriterAppender<W> {
    fn append_record(&self, record: &Record) {
        if record.raw.is_empty() {
            return;
        }
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writer.write_all(&record.raw) {
            eprintln!("Logging error: failed to write record: {}", e);
        }
    }

    fn flush(&self) {
        let _ = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_appender() {
        let appender = WriterAppender::new(Vec::new());
        let mut record = Record::default();
        record.raw.extend_from_slice(b"line\n");
        appender.append_record(&record);
        appender.flush();
        assert_eq!(appender.into_inner(), b"line\n");
    }
}
