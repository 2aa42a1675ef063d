use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::LoggingError;

/// Severity of a logging record.
///
/// The numeric values are part of the binary and hash layouts, so they must
/// not change. Higher values are more verbose.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum Level {
    /// Log nothing
    #[default]
    None = 0x00,
    /// Log fatal errors
    Fatal = 0x1F,
    /// Log errors
    Error = 0x3F,
    /// Log warnings
    Warn = 0x7F,
    /// Log information
    Info = 0x9F,
    /// Log debug
    Debug = 0xBF,
    /// Log everything
    All = 0xFF,
}

impl Level {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Level::None),
            0x1F => Some(Level::Fatal),
            0x3F => Some(Level::Error),
            0x7F => Some(Level::Warn),
            0x9F => Some(Level::Info),
            0xBF => Some(Level::Debug),
            0xFF => Some(Level::All),
            _ => None,
        }
    }

    /// Upper-case name padded to five columns, as used by text layouts.
    pub fn padded(self) -> &'static str {
        match self {
            Level::None => "NONE ",
            Level::Fatal => "FATAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN ",
            Level::Info => "INFO ",
            Level::Debug => "DEBUG",
            Level::All => "ALL  ",
        }
    }

    pub fn parse(value: &str) -> Result<Self, LoggingError> {
        value
            .parse()
            .map_err(|_| LoggingError::UnknownLevel(value.to_string()))
    }
}

impl From<log::Level> for Level {
    fn from(value: log::Level) -> Self {
        match value {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug => Level::Debug,
            log::Level::Trace => Level::All,
        }
    }
}
