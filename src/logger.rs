use std::sync::Arc;

use chrono::Utc;

use crate::{config, level::Level, processors::Processor, record::Argument, record::Record};

/// OS id of the calling thread.
#[cfg(target_os = "linux")]
pub(crate) fn thread_id() -> u64 {
    // SAFETY: gettid has no preconditions and cannot fail.
    unsafe { libc::syscall(libc::SYS_gettid) as u64 }
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn thread_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};

    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static ID: u64 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    ID.with(|id| *id)
}

/// Current UTC time in nanoseconds since the epoch.
pub(crate) fn timestamp() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .map_or(0, |nanos| nanos.max(0) as u64)
}

/// Named entry point for producing records.
///
/// The sink is resolved through the [`config`] registry when the logger is
/// created; call [`Logger::update`] to pick up a reconfiguration.
#[derive(Clone)]
pub struct Logger {
    name: String,
    sink: Arc<dyn Processor>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("")
    }
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let sink = config::create_logger(&name);
        Self { name, sink }
    }

    /// Logger bound to an explicit sink, bypassing the registry.
    pub fn with_sink(name: impl Into<String>, sink: Arc<dyn Processor>) -> Self {
        Self {
            name: name.into(),
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Re-resolves the sink from the registry.
    pub fn update(&mut self) {
        self.sink = config::create_logger(&self.name);
    }

    fn record(&self, level: Level) -> Record {
        Record {
            timestamp: timestamp(),
            thread: thread_id(),
            level,
            logger: self.name.clone(),
            ..Default::default()
        }
    }

    pub fn log(&self, level: Level, message: &str) {
        let mut record = self.record(level);
        record.message.push_str(message);
        self.sink.process_record(&mut record);
    }

    /// Logs `pattern` with `args` stored for deferred formatting.
    pub fn log_format(&self, level: Level, pattern: &str, args: &[&dyn Argument]) {
        let mut record = self.record(level);
        record.store_format(pattern, args);
        self.sink.process_record(&mut record);
    }

    /// Only logs in debug builds.
    pub fn debug(&self, message: &str) {
        #[cfg(debug_assertions)]
        self.log(Level::Debug, message);
        #[cfg(not(debug_assertions))]
        let _ = message;
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message)
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message)
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message)
    }

    pub fn fatal(&self, message: &str) {
        self.log(Level::Fatal, message)
    }

    pub fn flush(&self) {
        self.sink.flush()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.sink.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{element::Element, processors::testing::collecting};

    fn logger() -> (Logger, crate::processors::testing::CollectingAppender) {
        let (processor, appender) = collecting();
        processor.start();
        (Logger::with_sink("test", Arc::new(processor)), appender)
    }

    #[test]
    fn test_level_methods() {
        let (logger, appender) = logger();
        logger.info("info");
        logger.warn("warn");
        logger.error("error");
        logger.fatal("fatal");
        logger.debug("debug");

        let mut expected = vec!["info", "warn", "error", "fatal"];
        if cfg!(debug_assertions) {
            expected.push("debug");
        }
        assert_eq!(appender.lines(), expected);
    }

    #[test]
    fn test_record_metadata() {
        let (logger, _) = logger();
        let before = timestamp();
        let record = logger.record(Level::Warn);
        assert!(record.timestamp >= before);
        assert_eq!(record.thread, thread_id());
        assert_eq!(record.logger, "test");
        assert_eq!(record.level, Level::Warn);
    }

    #[test]
    fn test_thread_ids_differ() {
        let main = thread_id();
        let other = std::thread::spawn(thread_id).join().unwrap();
        assert_ne!(main, other);
    }

    #[test]
    fn test_deferred_macros() {
        let (logger, appender) = logger();
        crate::info!(logger, "{} + {} = {}", 1, 2, 1 + 2);
        crate::warn!(logger, "plain");
        crate::error!(logger, "{name}!", crate::named("name", &"boom"));
        assert_eq!(appender.lines(), ["1 + 2 = 3", "plain", "boom!"]);
    }

    #[test]
    fn test_update_follows_registry() {
        let _guard = crate::config::tests::lock();
        crate::config::shutdown();

        let (first, first_out) = collecting();
        crate::config::configure_logger("updating", first);
        crate::config::startup();
        let mut logger = Logger::new("updating");
        logger.info("one");

        let (second, second_out) = collecting();
        crate::config::configure_logger("updating", second);
        crate::config::startup();
        logger.info("two");
        logger.update();
        logger.info("three");

        assert_eq!(first_out.lines(), ["one", "two"]);
        assert_eq!(second_out.lines(), ["three"]);
        crate::config::shutdown();
    }
}
