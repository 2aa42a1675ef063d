mod argument;
mod restore;

pub use argument::{named, store_arguments, store_custom, Argument, ListWriter, NamedArg};

use crate::level::Level;

/// A single logging event as it travels through a processor tree.
///
/// `message` holds either rendered text or, for deferred formatting, the
/// format pattern whose arguments live serialized in `buffer`. Layouts fill
/// `raw` with the bytes appenders write out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// UTC nanoseconds since the Unix epoch.
    pub timestamp: u64,
    /// OS thread id of the producer.
    pub thread: u64,
    pub level: Level,
    pub logger: String,
    pub message: String,
    pub buffer: Vec<u8>,
    pub raw: Vec<u8>,
}

impl Record {
    pub fn new(level: Level, logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            logger: logger.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn clear(&mut self) {
        self.timestamp = 0;
        self.thread = 0;
        self.level = Level::None;
        self.logger.clear();
        self.message.clear();
        self.buffer.clear();
        self.raw.clear();
    }

    /// Approximate memory footprint, used by the buffered processor.
    pub fn size(&self) -> usize {
        8 + 8
            + 1
            + self.logger.len()
            + self.message.len()
            + self.buffer.len()
            + self.raw.len()
    }

    /// Keeps `pattern` as the message and serializes `args` for later
    /// rendering.
    pub fn store_format(&mut self, pattern: &str, args: &[&dyn Argument]) -> &mut Self {
        self.message.clear();
        self.message.push_str(pattern);
        self.buffer.clear();
        store_arguments(&mut self.buffer, args);
        self
    }

    /// Renders `pattern` right away and keeps the result as the message.
    pub fn format(&mut self, pattern: &str, args: &[&dyn Argument]) -> &mut Self {
        self.buffer.clear();
        store_arguments(&mut self.buffer, args);
        self.message = restore::restore_format(pattern, &self.buffer);
        self.buffer.clear();
        self
    }

    /// Appends a nested custom value to the argument buffer.
    pub fn store_custom_format(&mut self, pattern: &str, args: &[&dyn Argument]) -> &mut Self {
        store_custom(&mut self.buffer, pattern, args);
        self
    }

    /// Starts a nested list value in the argument buffer.
    pub fn store_list(&mut self) -> ListWriter<'_> {
        ListWriter::new(&mut self.buffer)
    }

    /// Message with the deferred arguments substituted.
    pub fn restore_format(&self) -> String {
        if self.buffer.is_empty() {
            return self.message.clone();
        }
        restore::restore_format(&self.message, &self.buffer)
    }
}

/// Renders `pattern` with an already serialized argument buffer.
pub fn restore_format(pattern: &str, buffer: &[u8]) -> String {
    restore::restore_format(pattern, buffer)
}
