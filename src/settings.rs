//! Declarative logging configuration.
//!
//! ```yaml
//! loggers:
//!   - name: ""
//!     processor:
//!       type: async-wait
//!       layout:
//!         type: text
//!         pattern: "{UtcDateTime} {Level} {Message}{EndLine}"
//!       filters:
//!         - type: level
//!           level: info
//!       appenders:
//!         - type: console
//!         - type: rolling-size
//!           directory: /var/log/app
//!           filename: app
//!           extension: log
//!           size: 1048576
//!           backups: 5
//! ```

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::{
    appenders::{
        Appender, ConsoleAppender, DebugAppender, ErrorAppender, FileAppender, NullAppender,
        RollingFileAppender, TimeRollingPolicy,
    },
    config,
    error::{IoResultExt, LoggingError, Result},
    filters::{Filter, LevelFilter, LoggerFilter, MessageFilter, SwitchFilter},
    layouts::{
        text::DEFAULT_PATTERN, BinaryLayout, EmptyLayout, HashLayout, JsonLayout, Layout,
        NullLayout, TextLayout,
    },
    level::Level,
    processors::{
        AsyncWaitFreeProcessor, AsyncWaitProcessor, BufferedProcessor, DefaultProcessor,
        ExclusiveProcessor, Processor, SyncProcessor,
    },
};

fn yes() -> bool {
    true
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub loggers: Vec<LoggerSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LoggerSettings {
    /// Logger name; empty for the default sink.
    #[serde(default)]
    pub name: String,

    pub processor: ProcessorSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessorKind {
    #[default]
    Default,
    Sync,
    Exclusive,
    Buffered,
    AsyncWait,
    AsyncWaitFree,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProcessorSettings {
    #[serde(rename = "type", default)]
    pub kind: ProcessorKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutSettings>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterSettings>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub appenders: Vec<AppenderSettings>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processors: Vec<ProcessorSettings>,

    /// Buffer limit in bytes, `buffered` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Queue capacity in records, `async-wait-free` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,

    /// Drop records when the queue is full, `async-wait-free` only.
    #[serde(default)]
    pub discard: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", deny_unknown_fields)]
pub enum LayoutSettings {
    Null,
    Empty,
    Binary,
    Hash,
    Json,
    Text {
        #[serde(default = "default_pattern")]
        pattern: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", deny_unknown_fields)]
pub enum FilterSettings {
    /// Either a single `level` (everything up to it passes) or a
    /// `from`/`to` range.
    Level {
        #[serde(default)]
        level: Option<Level>,
        #[serde(default)]
        from: Option<Level>,
        #[serde(default)]
        to: Option<Level>,
        #[serde(default = "yes")]
        positive: bool,
    },
    Logger {
        pattern: String,
        #[serde(default = "yes")]
        positive: bool,
    },
    Message {
        pattern: String,
        #[serde(default = "yes")]
        positive: bool,
    },
    Switch {
        #[serde(default = "yes")]
        enabled: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", deny_unknown_fields)]
pub enum AppenderSettings {
    Null,
    Console,
    Error,
    Debug,
    Syslog,
    #[serde(rename_all = "kebab-case")]
    File {
        path: PathBuf,
        #[serde(default)]
        truncate: bool,
        #[serde(default = "yes")]
        auto_flush: bool,
    },
    #[serde(rename_all = "kebab-case")]
    RollingTime {
        directory: PathBuf,
        policy: TimeRollingPolicy,
        pattern: String,
        #[serde(default)]
        archive: bool,
        #[serde(default)]
        truncate: bool,
        #[serde(default = "yes")]
        auto_flush: bool,
    },
    #[serde(rename_all = "kebab-case")]
    RollingSize {
        directory: PathBuf,
        filename: String,
        #[serde(default)]
        extension: String,
        size: u64,
        backups: usize,
        #[serde(default)]
        archive: bool,
        #[serde(default)]
        truncate: bool,
        #[serde(default = "yes")]
        auto_flush: bool,
    },
}

impl Settings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path).with_path(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Builds every processor tree. Nothing is registered or started.
    pub fn build(&self) -> Result<Vec<(String, Arc<dyn Processor>)>> {
        let mut names = HashSet::new();
        self.loggers
            .iter()
            .map(|logger| {
                if !names.insert(logger.name.as_str()) {
                    return Err(LoggingError::InvalidArgument(
                        "logger configured more than once",
                    ));
                }
                Ok((logger.name.clone(), logger.processor.build()?))
            })
            .collect()
    }

    /// Builds, registers and starts every configured logger sink.
    pub fn apply(&self) -> Result<()> {
        for (name, processor) in self.build()? {
            config::configure_shared_logger(name, processor);
        }
        config::startup();
        Ok(())
    }
}

impl ProcessorSettings {
    pub fn build(&self) -> Result<Arc<dyn Processor>> {
        if self.limit.is_some() && self.kind != ProcessorKind::Buffered {
            return Err(LoggingError::InvalidArgument(
                "'limit' is only valid for buffered processors",
            ));
        }
        if (self.capacity.is_some() || self.discard) && self.kind != ProcessorKind::AsyncWaitFree {
            return Err(LoggingError::InvalidArgument(
                "'capacity' and 'discard' are only valid for async-wait-free processors",
            ));
        }

        let inner = self.build_inner()?;
        Ok(match self.kind {
            ProcessorKind::Default => Arc::new(inner),
            ProcessorKind::Sync => Arc::new(SyncProcessor::new(inner)),
            ProcessorKind::Exclusive => Arc::new(ExclusiveProcessor::new(inner)),
            ProcessorKind::Buffered => Arc::new(BufferedProcessor::new(
                inner,
                self.limit.unwrap_or(BufferedProcessor::DEFAULT_LIMIT),
            )),
            ProcessorKind::AsyncWait => Arc::new(AsyncWaitProcessor::new(inner, false)?),
            ProcessorKind::AsyncWaitFree => Arc::new(AsyncWaitFreeProcessor::new(
                inner,
                self.capacity
                    .unwrap_or(AsyncWaitFreeProcessor::DEFAULT_CAPACITY),
                self.discard,
                false,
            )?),
        })
    }

    fn build_inner(&self) -> Result<DefaultProcessor> {
        let mut processor = match self.layout.as_ref() {
            Some(layout) => DefaultProcessor::with_shared_layout(layout.build()),
            None => DefaultProcessor::without_layout(),
        };
        for filter in &self.filters {
            processor = processor.with_shared_filter(filter.build()?);
        }
        for appender in &self.appenders {
            processor = processor.with_shared_appender(appender.build()?);
        }
        for child in &self.processors {
            processor = processor.with_shared_processor(child.build()?);
        }
        Ok(processor)
    }
}

impl LayoutSettings {
    pub fn build(&self) -> Arc<dyn Layout> {
        match self {
            LayoutSettings::Null => Arc::new(NullLayout),
            LayoutSettings::Empty => Arc::new(EmptyLayout),
            LayoutSettings::Binary => Arc::new(BinaryLayout),
            LayoutSettings::Hash => Arc::new(HashLayout),
            LayoutSettings::Json => Arc::new(JsonLayout),
            LayoutSettings::Text { pattern } => Arc::new(TextLayout::new(pattern)),
        }
    }
}

impl FilterSettings {
    pub fn build(&self) -> Result<Arc<dyn Filter>> {
        Ok(match self {
            FilterSettings::Level {
                level,
                from,
                to,
                positive,
            } => {
                let filter = match (level, from, to) {
                    (Some(level), None, None) => LevelFilter::new(*level),
                    (None, Some(from), Some(to)) => LevelFilter::with_range(*from, *to, true),
                    _ => {
                        return Err(LoggingError::InvalidArgument(
                            "level filter needs either 'level' or both 'from' and 'to'",
                        ))
                    }
                };
                Arc::new(if *positive { filter } else { filter.negative() })
            }
            FilterSettings::Logger { pattern, positive } => {
                Arc::new(LoggerFilter::new(pattern, *positive)?)
            }
            FilterSettings::Message { pattern, positive } => {
                Arc::new(MessageFilter::new(pattern, *positive)?)
            }
            FilterSettings::Switch { enabled } => Arc::new(SwitchFilter::new(*enabled)),
        })
    }
}

impl AppenderSettings {
    pub fn build(&self) -> Result<Arc<dyn Appender>> {
        Ok(match self {
            AppenderSettings::Null => Arc::new(NullAppender),
            AppenderSettings::Console => Arc::new(ConsoleAppender),
            AppenderSettings::Error => Arc::new(ErrorAppender),
            AppenderSettings::Debug => Arc::new(DebugAppender),
            #[cfg(unix)]
            AppenderSettings::Syslog => Arc::new(crate::appenders::SyslogAppender::new()),
            #[cfg(not(unix))]
            AppenderSettings::Syslog => {
                return Err(LoggingError::InvalidArgument(
                    "syslog is not available on this platform",
                ))
            }
            AppenderSettings::File {
                path,
                truncate,
                auto_flush,
            } => Arc::new(FileAppender::new(path, *truncate, *auto_flush)),
            AppenderSettings::RollingTime {
                directory,
                policy,
                pattern,
                archive,
                truncate,
                auto_flush,
            } => Arc::new(RollingFileAppender::with_time_policy(
                directory,
                *policy,
                pattern,
                *archive,
                *truncate,
                *auto_flush,
            )?),
            AppenderSettings::RollingSize {
                directory,
                filename,
                extension,
                size,
                backups,
                archive,
                truncate,
                auto_flush,
            } => Arc::new(RollingFileAppender::with_size_policy(
                directory,
                filename,
                extension,
                *size,
                *backups,
                *archive,
                *truncate,
                *auto_flush,
            )?),
        })
    }
}
