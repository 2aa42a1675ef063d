//! Record filters. A filter returns `true` to keep a record.

mod level;
mod logger;
mod message;
mod switch;

pub use level::LevelFilter;
pub use logger::LoggerFilter;
pub use message::MessageFilter;
pub use switch::SwitchFilter;

use crate::{element::Element, record::Record};

pub trait Filter: Element + Send + Sync {
    fn filter_record(&self, record: &Record) -> bool;
}

/// Compiles `pattern` so that it only matches whole strings.
pub(crate) fn anchored(pattern: &str) -> Result<regex::Regex, regex::Error> {
    regex::Regex::new(&format!("^(?:{})$", pattern))
}
