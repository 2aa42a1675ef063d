//! Structured logging with deferred formatting.
//!
//! A [`Logger`] produces [`Record`]s and hands them to a tree of
//! [`Processor`]s resolved through the process-wide [`config`] registry.
//! Each processor runs its filters, then its layout, then its appenders and
//! finally its child processors.
//!
//! ```no_run
//! use lumber::{
//!     appenders::ConsoleAppender, config, layouts::TextLayout,
//!     processors::{AsyncWaitProcessor, DefaultProcessor},
//! };
//!
//! let sink = DefaultProcessor::new(TextLayout::default()).with_appender(ConsoleAppender);
//! config::configure_logger("", AsyncWaitProcessor::new(sink, false).unwrap());
//! config::startup();
//!
//! let logger = lumber::Logger::new("app");
//! lumber::info!(logger, "{} jobs finished in {:.1}s", 12, 3.25);
//!
//! config::shutdown();
//! ```

pub mod appenders;
pub mod bridge;
mod codec;
pub mod config;
pub mod element;
pub mod error;
pub mod filters;
pub mod hashlog;
pub mod layouts;
pub mod level;
pub mod logger;
mod macros;
pub mod processors;
pub mod reader;
pub mod record;
pub mod settings;
pub mod symbols;

pub use appenders::Appender;
pub use element::Element;
pub use error::{LoggingError, Result};
pub use filters::Filter;
pub use layouts::Layout;
pub use level::Level;
pub use logger::Logger;
pub use processors::Processor;
pub use record::{named, store_custom, Argument, ListWriter, Record};
