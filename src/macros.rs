/// Logs a deferred-format record at an explicit level.
///
/// ```no_run
/// let logger = lumber::Logger::new("app");
/// lumber::log!(logger, lumber::Level::Info, "{} items in {:.2}s", 42, 0.5);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $pattern:expr $(, $arg:expr)* $(,)?) => {
        $logger.log_format(
            $level,
            $pattern,
            &[$(&$arg as &dyn $crate::Argument),*],
        )
    };
}

/// Debug records are only produced in debug builds.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($rest:tt)+) => {
        if cfg!(debug_assertions) {
            $crate::log!($logger, $crate::Level::Debug, $($rest)+)
        }
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($rest)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $($rest)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($rest)+)
    };
}

#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Fatal, $($rest)+)
    };
}
