use std::sync::{PoisonError, RwLock};

use regex::Regex;

use crate::{element::Element, error::Result, record::Record};

use super::{anchored, Filter};

/// Matches the whole message against a regular expression.
///
/// For deferred records the message is the format pattern, not the
/// rendered text.
#[derive(Debug)]
pub struct MessageFilter {
    state: RwLock<(Regex, bool)>,
}

impl MessageFilter {
    pub fn new(pattern: &str, positive: bool) -> Result<Self> {
        Ok(Self {
            state: RwLock::new((anchored(pattern)?, positive)),
        })
    }

    pub fn update(&self, pattern: &str, positive: bool) -> Result<()> {
        let regex = anchored(pattern)?;
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = (regex, positive);
        Ok(())
    }
}

impl Element for MessageFilter {}

impl Filter for MessageFilter {
    fn filter_record(&self, record: &Record) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.0.is_match(&record.message) == state.1
    }
}
