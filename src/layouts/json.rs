use serde::{Deserialize, Serialize};

use crate::{element::Element, level::Level, record::Record};

use super::{text::utc_time, Layout};

/// One line of a JSON log.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonEntry {
    pub timestamp: String,
    pub thread: u64,
    pub level: Level,
    pub logger: String,
    pub message: String,
}

impl From<&Record> for JsonEntry {
    fn from(value: &Record) -> Self {
        Self {
            timestamp: utc_time(value.timestamp)
                .format("%Y-%m-%dT%H:%M:%S%.9fZ")
                .to_string(),
            thread: value.thread,
            level: value.level,
            logger: value.logger.clone(),
            message: value.restore_format(),
        }
    }
}

/// Newline-delimited JSON, one object per record.
#[derive(Debug, Default)]
pub struct JsonLayout;

impl Element for JsonLayout {}

impl Layout for JsonLayout {
    fn layout_record(&self, record: &mut Record) {
        let entry = JsonEntry::from(&*record);
        record.raw.clear();
        match serde_json::to_writer(&mut record.raw, &entry) {
            Ok(()) => record.raw.push(b'\n'),
            Err(e) => {
                eprintln!("Logging error: failed to serialize record: {:?}", e);
                record.raw.clear();
            }
        }
    }
}
