//! Process-wide registry of named logger sinks.
//!
//! Sinks are staged with [`configure_logger`] and become visible to
//! [`Logger`](crate::Logger)s once [`startup`] runs. The empty name is the
//! default sink used for every logger without a dedicated one.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    appenders::ConsoleAppender,
    layouts::TextLayout,
    processors::{DefaultProcessor, Processor},
};

#[derive(Default)]
struct Registry {
    pending: HashMap<String, Arc<dyn Processor>>,
    active: HashMap<String, Arc<dyn Processor>>,
}

lazy_static::lazy_static! {
    static ref REGISTRY: Mutex<Registry> = Mutex::new(Registry::default());
}

fn registry() -> MutexGuard<'static, Registry> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stages `processor` as the sink for `name` (the default sink when `name`
/// is empty). It takes effect on the next [`startup`].
pub fn configure_logger(name: impl Into<String>, processor: impl Processor + 'static) {
    configure_shared_logger(name, Arc::new(processor))
}

pub fn configure_shared_logger(name: impl Into<String>, processor: Arc<dyn Processor>) {
    registry().pending.insert(name.into(), processor);
}

/// Activates and starts every staged sink.
pub fn startup() {
    let mut registry = registry();
    let pending = std::mem::take(&mut registry.pending);
    for (name, processor) in pending {
        if !processor.is_started() {
            processor.start();
        }
        if let Some(previous) = registry.active.insert(name, processor) {
            previous.flush();
        }
    }
}

/// Active sink for `name`, falling back to the default sink. If there is no
/// default sink either, a console sink with the default text layout is
/// created and registered as the default.
pub fn create_logger(name: &str) -> Arc<dyn Processor> {
    let mut registry = registry();
    if let Some(sink) = registry.active.get(name).or_else(|| registry.active.get("")) {
        return sink.clone();
    }

    let sink: Arc<dyn Processor> = Arc::new(
        DefaultProcessor::new(TextLayout::default()).with_appender(ConsoleAppender),
    );
    sink.start();
    registry.active.insert(String::new(), sink.clone());
    sink
}

/// Flushes and stops every active sink and forgets all sinks. Loggers that
/// still hold a sink keep it, but it no longer processes records.
pub fn shutdown() {
    let mut registry = registry();
    registry.pending.clear();
    for (_, processor) in registry.active.drain() {
        processor.flush();
        if processor.is_started() {
            processor.stop();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use crate::{level::Level, processors::testing::collecting, record::Record};

    lazy_static::lazy_static! {
        /// Serializes tests that touch the global registry.
        pub(crate) static ref TEST_LOCK: Mutex<()> = Mutex::new(());
    }

    pub(crate) fn lock() -> MutexGuard<'static, ()> {
        TEST_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[test]
    fn test_staged_until_startup() {
        let _guard = lock();
        shutdown();

        let (fallback, fallback_out) = collecting();
        configure_logger("", fallback);
        startup();

        let (processor, appender) = collecting();
        configure_logger("staged", processor);

        let sink = create_logger("staged");
        let mut record = Record::new(Level::Info, "staged", "hidden");
        sink.process_record(&mut record);
        assert!(appender.lines().is_empty(), "Staged sink should not be active yet");
        assert_eq!(fallback_out.lines(), ["hidden"]);

        startup();
        let sink = create_logger("staged");
        assert!(sink.is_started());
        sink.process_record(&mut record);
        assert_eq!(appender.lines(), ["hidden"]);

        shutdown();
        assert!(!sink.is_started());
    }

    #[test]
    fn test_default_fallback() {
        let _guard = lock();
        shutdown();

        let (processor, appender) = collecting();
        configure_logger("", processor);
        startup();

        let sink = create_logger("anything");
        sink.process_record(&mut Record::new(Level::Info, "anything", "to default"));
        assert_eq!(appender.lines(), ["to default"]);

        shutdown();
    }

    #[test]
    fn test_console_default_created_once() {
        let _guard = lock();
        shutdown();

        let first = create_logger("a");
        let second = create_logger("b");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_started());

        shutdown();
    }
}
