use crate::{element::Element, record::Record};

use super::{DefaultProcessor, Processor};

/// Consumes every record it accepts: after processing, sibling processors
/// do not see the record. Records its filters reject still propagate.
pub struct ExclusiveProcessor {
    inner: DefaultProcessor,
}

impl ExclusiveProcessor {
    pub fn new(inner: DefaultProcessor) -> Self {
        Self { inner }
    }
}

impl Element for ExclusiveProcessor {
    fn is_started(&self) -> bool {
        self.inner.is_started()
    }

    fn start(&self) -> bool {
        self.inner.start()
    }

    fn stop(&self) -> bool {
        self.inner.stop()
    }
}

impl Processor for ExclusiveProcessor {
    fn filter_record(&self, record: &Record) -> bool {
        self.inner.filter_record(record)
    }

    fn process_record(&self, record: &mut Record) -> bool {
        if !self.inner.is_started() || !self.inner.filter_record(record) {
            return true;
        }
        self.inner.process_record(record);
        false
    }

    fn flush(&self) {
        self.inner.flush()
    }
}
