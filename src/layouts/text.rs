use std::fmt::Write as _;

use chrono::{DateTime, Datelike, FixedOffset, Local, Timelike, Utc};

use crate::{element::Element, record::Record};

use super::Layout;

pub const DEFAULT_PATTERN: &str = "{UtcDateTime} [{Thread}] {Level} {Logger} - {Message}{EndLine}";

#[cfg(windows)]
const END_LINE: &str = "\r\n";
#[cfg(not(windows))]
const END_LINE: &str = "\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    DateTime,
    Date,
    Time,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Timezone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Placeholder {
    Text(String),
    Local(Field),
    Utc(Field),
    Millisecond,
    Microsecond,
    Nanosecond,
    Thread,
    Level,
    Logger,
    Message,
}

fn field(name: &str) -> Option<Field> {
    let field = match name {
        "DateTime" => Field::DateTime,
        "Date" => Field::Date,
        "Time" => Field::Time,
        "Year" => Field::Year,
        "Month" => Field::Month,
        "Day" => Field::Day,
        "Hour" => Field::Hour,
        "Minute" => Field::Minute,
        "Second" => Field::Second,
        "Timezone" | "TimeZone" => Field::Timezone,
        _ => return None,
    };
    Some(field)
}

fn placeholder(name: &str) -> Option<Placeholder> {
    let placeholder = match name {
        "Millisecond" | "Milli" | "UtcMillisecond" | "UtcMilli" => Placeholder::Millisecond,
        "Microsecond" | "Micro" | "UtcMicrosecond" | "UtcMicro" => Placeholder::Microsecond,
        "Nanosecond" | "Nano" | "UtcNanosecond" | "UtcNano" => Placeholder::Nanosecond,
        "Thread" => Placeholder::Thread,
        "Level" => Placeholder::Level,
        "Logger" => Placeholder::Logger,
        "Message" => Placeholder::Message,
        "EndLine" => Placeholder::Text(END_LINE.to_string()),
        _ => match name.strip_prefix("Utc") {
            Some(rest) => Placeholder::Utc(field(rest)?),
            None => Placeholder::Local(field(name)?),
        },
    };
    Some(placeholder)
}

fn push_text(pattern: &mut Vec<Placeholder>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Placeholder::Text(last)) = pattern.last_mut() {
        last.push_str(text);
    } else {
        pattern.push(Placeholder::Text(text.to_string()));
    }
}

fn parse(layout: &str) -> Vec<Placeholder> {
    let mut pattern = Vec::new();
    let mut rest = layout;

    while let Some(open) = rest.find('{') {
        push_text(&mut pattern, &rest[..open]);
        let after = &rest[open + 1..];
        // A second '{' before the closing brace restarts the placeholder
        let close = after.find('}');
        let reopen = after.find('{');
        match (close, reopen) {
            (Some(close), reopen) if reopen.map_or(true, |r| close < r) => {
                let name = &after[..close];
                match placeholder(name) {
                    Some(Placeholder::Text(text)) => push_text(&mut pattern, &text),
                    Some(p) => pattern.push(p),
                    None => push_text(&mut pattern, &rest[open..open + close + 2]),
                }
                rest = &after[close + 1..];
            }
            (_, Some(reopen)) => {
                push_text(&mut pattern, &rest[open..open + 1 + reopen]);
                rest = &after[reopen..];
            }
            _ => {
                push_text(&mut pattern, &rest[open..]);
                rest = "";
            }
        }
    }
    push_text(&mut pattern, rest);
    pattern
}

fn write_field<Tz: chrono::TimeZone>(out: &mut String, time: &DateTime<Tz>, field: Field, utc: bool)
where
    Tz::Offset: std::fmt::Display,
{
    let zone = |out: &mut String| {
        if utc {
            out.push('Z');
        } else {
            let _ = write!(out, "{}", time.format("%:z"));
        }
    };
    let millis = time.nanosecond() % 1_000_000_000 / 1_000_000;

    let _ = match field {
        Field::DateTime => {
            let _ = write!(
                out,
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}",
                time.year(),
                time.month(),
                time.day(),
                time.hour(),
                time.minute(),
                time.second(),
                millis
            );
            zone(out);
            Ok(())
        }
        Field::Date => write!(out, "{:04}-{:02}-{:02}", time.year(), time.month(), time.day()),
        Field::Time => {
            let _ = write!(
                out,
                "{:02}:{:02}:{:02}.{:03}",
                time.hour(),
                time.minute(),
                time.second(),
                millis
            );
            zone(out);
            Ok(())
        }
        Field::Year => write!(out, "{:04}", time.year()),
        Field::Month => write!(out, "{:02}", time.month()),
        Field::Day => write!(out, "{:02}", time.day()),
        Field::Hour => write!(out, "{:02}", time.hour()),
        Field::Minute => write!(out, "{:02}", time.minute()),
        Field::Second => write!(out, "{:02}", time.second()),
        Field::Timezone => {
            zone(out);
            Ok(())
        }
    };
}

/// Converts nanoseconds since the epoch to a UTC date-time.
pub(crate) fn utc_time(timestamp: u64) -> DateTime<Utc> {
    let secs = (timestamp / 1_000_000_000) as i64;
    let nanos = (timestamp % 1_000_000_000) as u32;
    DateTime::from_timestamp(secs, nanos).unwrap_or_default()
}

pub(crate) fn local_time(timestamp: u64) -> DateTime<FixedOffset> {
    utc_time(timestamp).with_timezone(&Local).fixed_offset()
}

/// Renders records as text using a pattern of `{Placeholder}`s.
///
/// Unknown placeholders are copied verbatim. Deferred messages are rendered
/// with their arguments.
#[derive(Debug, Clone)]
pub struct TextLayout {
    pattern: Vec<Placeholder>,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}

impl TextLayout {
    pub fn new(layout: &str) -> Self {
        Self {
            pattern: parse(layout),
        }
    }

    /// Renders a record as a string without touching its `raw` field.
    pub fn render(&self, record: &Record) -> String {
        let mut out = String::with_capacity(128);
        let mut utc = None;
        let mut local = None;
        let nanos = record.timestamp % 1_000_000_000;

        for placeholder in &self.pattern {
            match placeholder {
                Placeholder::Text(text) => out.push_str(text),
                Placeholder::Utc(field) => {
                    let time = utc.get_or_insert_with(|| utc_time(record.timestamp));
                    write_field(&mut out, time, *field, true);
                }
                Placeholder::Local(field) => {
                    let time = local.get_or_insert_with(|| local_time(record.timestamp));
                    write_field(&mut out, time, *field, false);
                }
                Placeholder::Millisecond => {
                    let _ = write!(out, "{:03}", nanos / 1_000_000);
                }
                Placeholder::Microsecond => {
                    let _ = write!(out, "{:03}", nanos / 1_000 % 1_000);
                }
                Placeholder::Nanosecond => {
                    let _ = write!(out, "{:03}", nanos % 1_000);
                }
                Placeholder::Thread => {
                    let _ = write!(out, "0x{:08X}", record.thread);
                }
                Placeholder::Level => out.push_str(record.level.padded()),
                Placeholder::Logger => out.push_str(&record.logger),
                Placeholder::Message => out.push_str(&record.restore_format()),
            }
        }
        out
    }
}

impl Element for TextLayout {}

impl Layout for TextLayout {
    fn layout_record(&self, record: &mut Record) {
        let text = self.render(record);
        record.raw.clear();
        record.raw.extend_from_slice(text.as_bytes());
    }
}
