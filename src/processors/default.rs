use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    appenders::Appender, element::Element, filters::Filter, layouts::Layout, record::Record,
};

use super::Processor;

/// Runs records through filters, layout, appenders and then child
/// processors, in that order, on the caller's thread.
///
/// A new processor is stopped; records pass through a stopped processor
/// untouched.
pub struct DefaultProcessor {
    started: AtomicBool,
    layout: Option<Arc<dyn Layout>>,
    filters: Vec<Arc<dyn Filter>>,
    appenders: Vec<Arc<dyn Appender>>,
    processors: Vec<Arc<dyn Processor>>,
}

impl Default for DefaultProcessor {
    fn default() -> Self {
        Self::without_layout()
    }
}

impl DefaultProcessor {
    pub fn new(layout: impl Layout + 'static) -> Self {
        Self::with_shared_layout(Arc::new(layout))
    }

    pub fn with_shared_layout(layout: Arc<dyn Layout>) -> Self {
        let mut processor = Self::without_layout();
        processor.layout = Some(layout);
        processor
    }

    /// Processor that leaves `raw` alone, e.g. to route records already
    /// laid out by a parent.
    pub fn without_layout() -> Self {
        Self {
            started: AtomicBool::new(false),
            layout: None,
            filters: Vec::new(),
            appenders: Vec::new(),
            processors: Vec::new(),
        }
    }

    pub fn with_filter(self, filter: impl Filter + 'static) -> Self {
        self.with_shared_filter(Arc::new(filter))
    }

    pub fn with_shared_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_appender(self, appender: impl Appender + 'static) -> Self {
        self.with_shared_appender(Arc::new(appender))
    }

    pub fn with_shared_appender(mut self, appender: Arc<dyn Appender>) -> Self {
        self.appenders.push(appender);
        self
    }

    pub fn with_processor(self, processor: impl Processor + 'static) -> Self {
        self.with_shared_processor(Arc::new(processor))
    }

    pub fn with_shared_processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn layout(&self) -> Option<&Arc<dyn Layout>> {
        self.layout.as_ref()
    }

    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    pub fn appenders(&self) -> &[Arc<dyn Appender>] {
        &self.appenders
    }

    pub fn processors(&self) -> &[Arc<dyn Processor>] {
        &self.processors
    }

    /// Starts or stops every child that is not already in that state.
    fn cascade(&self, start: bool) {
        fn toggle<E: Element + ?Sized>(element: &E, start: bool) {
            if start && !element.is_started() {
                element.start();
            } else if !start && element.is_started() {
                element.stop();
            }
        }

        if let Some(layout) = self.layout.as_ref() {
            toggle(layout.as_ref(), start);
        }
        self.filters.iter().for_each(|f| toggle(f.as_ref(), start));
        self.appenders.iter().for_each(|a| toggle(a.as_ref(), start));
        self.processors.iter().for_each(|p| toggle(p.as_ref(), start));
    }
}

impl Element for DefaultProcessor {
    fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    fn start(&self) -> bool {
        if self.is_started() {
            return false;
        }
        self.cascade(true);
        self.started.store(true, Ordering::Release);
        true
    }

    fn stop(&self) -> bool {
        if !self.is_started() {
            return false;
        }
        self.cascade(false);
        self.started.store(false, Ordering::Release);
        true
    }
}

impl Processor for DefaultProcessor {
    fn filter_record(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.filter_record(record))
    }

    fn process_record(&self, record: &mut Record) -> bool {
        if !self.is_started() {
            return true;
        }

        if !self.filter_record(record) {
            return true;
        }

        if let Some(layout) = self.layout.as_ref() {
            layout.layout_record(record);
        }

        for appender in &self.appenders {
            appender.append_record(record);
        }

        for processor in &self.processors {
            if !processor.process_record(record) {
                return false;
            }
        }

        true
    }

    fn flush(&self) {
        if !self.is_started() {
            return;
        }
        self.appenders.iter().for_each(|a| a.flush());
        self.processors.iter().for_each(|p| p.flush());
    }
}

impl Drop for DefaultProcessor {
    fn drop(&mut self) {
        self.appenders.iter().for_each(|a| a.flush());
        self.processors.iter().for_each(|p| p.flush());
        if self.is_started() {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        filters::{LevelFilter, SwitchFilter},
        layouts::TextLayout,
        level::Level,
        processors::{testing::collecting, ExclusiveProcessor},
    };

    #[test]
    fn test_stopped_processor_passes_records() {
        let (processor, appender) = collecting();
        let mut record = Record::new(Level::Info, "app", "hello");
        assert!(processor.process_record(&mut record));
        assert!(appender.lines().is_empty(), "Stopped processor should not append");

        assert!(processor.start());
        assert!(!processor.start(), "Second start should fail");
        processor.process_record(&mut record);
        assert_eq!(appender.lines(), ["hello"]);

        assert!(processor.stop());
        assert!(!processor.is_started());
    }

    #[test]
    fn test_filters_drop_records() {
        let (processor, appender) = collecting();
        let processor = processor.with_filter(LevelFilter::new(Level::Warn));
        processor.start();

        processor.process_record(&mut Record::new(Level::Error, "app", "kept"));
        assert!(processor.process_record(&mut Record::new(Level::Debug, "app", "dropped")));
        assert_eq!(appender.lines(), ["kept"]);
    }

    #[test]
    fn test_child_processors_and_exclusive() {
        let (first, first_out) = collecting();
        let (second, second_out) = collecting();
        let switch = Arc::new(SwitchFilter::new(true));

        let exclusive =
            ExclusiveProcessor::new(first.with_shared_filter(switch.clone()));
        let root = DefaultProcessor::new(TextLayout::new("{Message}"))
            .with_processor(exclusive)
            .with_processor(second);
        root.start();

        let mut record = Record::new(Level::Info, "app", "one");
        assert!(!root.process_record(&mut record));
        assert_eq!(first_out.lines(), ["one"]);
        assert!(
            second_out.lines().is_empty(),
            "Exclusive processor should stop propagation"
        );

        switch.disable();
        let mut record = Record::new(Level::Info, "app", "two");
        assert!(root.process_record(&mut record));
        assert_eq!(second_out.lines(), ["two"]);
    }

    #[test]
    fn test_flush_and_drop() {
        let (processor, appender) = collecting();
        processor.flush();
        assert_eq!(appender.flushes(), 0, "Stopped processor should not flush");

        processor.start();
        processor.flush();
        assert_eq!(appender.flushes(), 1);

        drop(processor);
        assert_eq!(appender.flushes(), 2, "Drop should flush appenders");
    }

    #[test]
    fn test_shared_layout() {
        let layout: Arc<dyn Layout> = Arc::new(TextLayout::new("[{Logger}] {Message}"));
        let (_, appender) = collecting();
        let first = DefaultProcessor::with_shared_layout(layout.clone())
            .with_shared_appender(Arc::new(appender.clone()));
        let second = DefaultProcessor::with_shared_layout(layout.clone())
            .with_shared_appender(Arc::new(appender.clone()));
        assert!(first.layout().is_some_and(|own| Arc::ptr_eq(own, &layout)));
        assert!(!first.is_started(), "Shared layout processor should start stopped");

        first.start();
        second.start();
        first.process_record(&mut Record::new(Level::Info, "one", "a"));
        second.process_record(&mut Record::new(Level::Info, "two", "b"));
        assert_eq!(appender.lines(), ["[one] a", "[two] b"]);
    }
}
