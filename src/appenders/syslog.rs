use std::ffi::c_int;

use crate::{element::Element, level::Level, record::Record};

use super::Appender;

fn priority(level: Level) -> c_int {
    match level {
        Level::Fatal => libc::LOG_CRIT,
        Level::Error => libc::LOG_ERR,
        Level::Warn => libc::LOG_WARNING,
        Level::Info => libc::LOG_INFO,
        Level::Debug => libc::LOG_DEBUG,
        Level::None | Level::All => libc::LOG_INFO,
    }
}

/// Sends records to the system logger.
///
/// The connection is opened on construction and closed on drop; the
/// identity is the program name.
#[derive(Debug)]
pub struct SyslogAppender {
    _private: (),
}

impl SyslogAppender {
    pub fn new() -> Self {
        // SAFETY: a null ident makes syslog use the program name, so no
        // pointer has to outlive this call.
        unsafe { libc::openlog(std::ptr::null(), libc::LOG_PID, libc::LOG_USER) };
        Self { _private: () }
    }
}

impl Default for SyslogAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for SyslogAppender {}

impl Appender for SyslogAppender {
    fn append_record(&self, record: &Record) {
        if record.raw.is_empty() {
            return;
        }

        let len = c_int::try_from(record.raw.len()).unwrap_or(c_int::MAX);
        // SAFETY: "%.*s" reads at most `len` bytes from `raw`, which is
        // alive for the duration of the call.
        unsafe {
            libc::syslog(
                priority(record.level),
                b"%.*s\0".as_ptr() as *const libc::c_char,
                len,
                record.raw.as_ptr() as *const libc::c_char,
            )
        };
    }
}

impl Drop for SyslogAppender {
    fn drop(&mut self) {
        // SAFETY: closelog has no preconditions.
        unsafe { libc::closelog() };
    }
}
