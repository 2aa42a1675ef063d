use std::sync::{PoisonError, RwLock};

use regex::Regex;

use crate::{element::Element, error::Result, record::Record};

use super::{anchored, Filter};

/// Matches the whole logger name against a regular expression.
#[derive(Debug)]
pub struct LoggerFilter {
    state: RwLock<(Regex, bool)>,
}

impl LoggerFilter {
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

impl Element for LoggerFilter {}

impl Filter for LoggerFilter {
    fn filter_record(&self, record: &Record) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.0.is_match(&record.logger) == state.1
    }
}
