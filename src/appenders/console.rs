use std::io::{self, Write};

use crate::{element::Element, level::Level, record::Record};

use super::Appender;

const RESET: &str = "\x1b[0m";

fn color(level: Level) -> &'static str {
    match level {
        Level::None => "\x1b[90m",
        Level::Fatal => "\x1b[97;41m",
        Level::Error => "\x1b[91m",
        Level::Warn => "\x1b[93m",
        Level::Info => "\x1b[97m",
        Level::Debug => "\x1b[95m",
        Level::All => "\x1b[37m",
    }
}

fn write_colored(out: &mut impl Write, record: &Record) -> io::Result<()> {
    out.write_all(color(record.level).as_bytes())?;
    out.write_all(&record.raw)?;
    out.write_all(RESET.as_bytes())
}

/// Writes records to stdout, colored by level.
#[derive(Debug, Default)]
pub struct ConsoleAppender;

impl Element for ConsoleAppender {}

impl Appender for ConsoleAppender {
    fn append_record(&self, record: &Record) {
        if record.raw.is_empty() {
            return;
        }
        let _ = write_colored(&mut io::stdout().lock(), record);
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

/// Writes records to stderr.
#[derive(Debug, Default)]
pub struct ErrorAppender;

impl Element for ErrorAppender {}

impl Appender for ErrorAppender {
    fn append_record(&self, record: &Record) {
        if record.raw.is_empty() {
            return;
        }
        let _ = io::stderr().lock().write_all(&record.raw);
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

/// Plain, uncolored stdout output for debugging sessions.
#[derive(Debug, Default)]
pub struct DebugAppender;

impl Element for DebugAppender {}

impl Appender for DebugAppender {
    fn append_record(&self, record: &Record) {
        if record.raw.is_empty() {
            return;
        }
        let _ = io::stdout().lock().write_all(&record.raw);
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colored_output() {
        let mut record = Record::new(Level::Error, "app", "boom");
        record.raw.extend_from_slice(b"boom\n");

        let mut out = Vec::new();
        write_colored(&mut out, &record).unwrap();
        assert_eq!(out, b"\x1b[91mboom\n\x1b[0m");
    }
}
