//! Appenders write a laid out record (`Record::raw`) somewhere. Records
//! with an empty `raw` are skipped by every appender.

pub(crate) mod archive;
mod console;
mod file;
mod memory;
mod rolling_file;
#[cfg(unix)]
mod syslog;
mod writer;

pub use console::{ConsoleAppender, DebugAppender, ErrorAppender};
pub use file::FileAppender;
pub use memory::MemoryAppender;
pub use rolling_file::{RollingFileAppender, TimeRollingPolicy};
#[cfg(unix)]
pub use syslog::SyslogAppender;
pub use writer::WriterAppender;

use crate::{element::Element, record::Record};

pub trait Appender: Element + Send + Sync {
    fn append_record(&self, record: &Record);

    fn flush(&self) {}
}

/// Swallows every record.
#[derive(Debug, Default)]
pub struct NullAppender;

impl Element for NullAppender {}

impl Appender for NullAppender {
    fn append_record(&self, _record: &Record) {}
}
