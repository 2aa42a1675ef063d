use std::sync::{PoisonError, RwLock};

use crate::{element::Element, level::Level, record::Record};

use super::Filter;

#[derive(Debug, Clone, Copy)]
struct Range {
    from: Level,
    to: Level,
    positive: bool,
}

/// Keeps records whose level falls inside `[from, to]`, or outside it when
/// the filter is negative.
#[derive(Debug)]
pub struct LevelFilter {
    range: RwLock<Range>,
}

impl LevelFilter {
    /// Accepts every level up to and including `level`.
    pub fn new(level: Level) -> Self {
        Self::with_range(Level::None, level, true)
    }

    pub fn with_range(from: Level, to: Level, positive: bool) -> Self {
        Self {
            range: RwLock::new(Range { from, to, positive }),
        }
    }

    pub fn negative(self) -> Self {
        self.range
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .positive = false;
        self
    }

    pub fn update(&self, level: Level) {
        self.update_range(Level::None, level, true)
    }

    pub fn update_range(&self, from: Level, to: Level, positive: bool) {
        *self.range.write().unwrap_or_else(PoisonError::into_inner) =
            Range { from, to, positive };
    }

    pub fn range(&self) -> (Level, Level, bool) {
        let range = *self.range.read().unwrap_or_else(PoisonError::into_inner);
        (range.from, range.to, range.positive)
    }
}

impl Element for LevelFilter {}

impl Filter for LevelFilter {
    fn filter_record(&self, record: &Record) -> bool {
        let range = *self.range.read().unwrap_or_else(PoisonError::into_inner);
        let inside = record.level >= range.from && record.level <= range.to;
        inside == range.positive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: Level) -> Record {
        Record::new(level, "test", "message")
    }

    #[test]
    fn test_single_level() {
        let filter = LevelFilter::new(Level::Warn);
        assert!(filter.filter_record(&record(Level::Fatal)));
        assert!(filter.filter_record(&record(Level::Warn)));
        assert!(
            !filter.filter_record(&record(Level::Info)),
            "Info is more verbose than Warn and should be dropped"
        );
    }

    #[test]
    fn test_negative_range() {
        let filter = LevelFilter::with_range(Level::Error, Level::Warn, false);
        assert!(filter.filter_record(&record(Level::Fatal)));
        assert!(!filter.filter_record(&record(Level::Error)));
        assert!(!filter.filter_record(&record(Level::Warn)));
        assert!(filter.filter_record(&record(Level::Debug)));

        let filter = LevelFilter::new(Level::Error).negative();
        assert!(!filter.filter_record(&record(Level::Fatal)));
        assert!(filter.filter_record(&record(Level::Info)));
    }

    #[test]
    fn test_update() {
        let filter = LevelFilter::new(Level::Error);
        assert!(!filter.filter_record(&record(Level::Debug)));
        filter.update(Level::All);
        assert!(filter.filter_record(&record(Level::Debug)));
        assert_eq!(filter.range(), (Level::None, Level::All, true));
    }
}
