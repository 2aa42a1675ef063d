//! Routes records from the `log` facade into lumber sinks.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use log::{LevelFilter, Log, Metadata};

use crate::{level::Level, logger::Logger};

/// `log::Log` implementation that forwards every record to a lumber
/// [`Logger`] named after the record target.
pub struct LogBridge {
    loggers: RwLock<HashMap<String, Logger>>,
    max_level: LevelFilter,
}

impl Default for LogBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBridge {
    pub fn new() -> Self {
        Self {
            loggers: RwLock::new(HashMap::new()),
            max_level: LevelFilter::Trace,
        }
    }

    pub fn with_max_level(mut self, max_level: LevelFilter) -> Self {
        self.max_level = max_level;
        self
    }

    /// Installs the bridge as the global `log` logger.
    pub fn init(self) -> Result<(), log::SetLoggerError> {
        log::set_max_level(self.max_level);
        log::set_boxed_logger(Box::new(self))
    }

    fn with_logger(&self, target: &str, f: impl FnOnce(&Logger)) {
        if let Some(logger) = self
            .loggers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(target)
        {
            return f(logger);
        }

        let mut loggers = self.loggers.write().unwrap_or_else(PoisonError::into_inner);
        let logger = loggers
            .entry(target.to_string())
            .or_insert_with(|| Logger::new(target));
        f(logger)
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = Level::from(record.level());
        self.with_logger(record.target(), |logger| match record.args().as_str() {
            Some(message) => logger.log(level, message),
            None => logger.log(level, &record.args().to_string()),
        });
    }

    fn flush(&self) {
        self.loggers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .for_each(Logger::flush);
    }
}
