use std::sync::atomic::{AtomicBool, Ordering};

use crate::{element::Element, record::Record};

use super::Filter;

/// Passes everything while enabled and nothing while disabled.
#[derive(Debug)]
pub struct SwitchFilter {
    enabled: AtomicBool,
}

impl SwitchFilter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn enable(&self) {
        self.update(true)
    }

    pub fn disable(&self) {
        self.update(false)
    }

    pub fn toggle(&self) {
        self.enabled.fetch_xor(true, Ordering::AcqRel);
    }

    pub fn update(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

impl Element for SwitchFilter {}

impl Filter for SwitchFilter {
    fn filter_record(&self, _record: &Record) -> bool {
        self.is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch() {
        let record = Record::default();
        let filter = SwitchFilter::new(true);
        assert!(filter.filter_record(&record));

        filter.toggle();
        assert!(!filter.is_enabled());
        assert!(!filter.filter_record(&record));

        filter.enable();
        assert!(filter.filter_record(&record));
        filter.disable();
        assert!(!filter.filter_record(&record));
    }
}
