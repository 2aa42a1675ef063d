use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{
    element::Element,
    error::{LoggingError, Result},
    layouts::text::{local_time, utc_time},
    processors::ThreadHooks,
    record::Record,
};

use super::{
    archive::{archive_path, Archiver},
    file::LogFile,
    Appender,
};

/// How long one file covers under time based rolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum TimeRollingPolicy {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl TimeRollingPolicy {
    /// Start of the period containing `time`.
    fn period(self, time: NaiveDateTime) -> Option<NaiveDateTime> {
        let (month, day) = match self {
            TimeRollingPolicy::Year => (1, 1),
            TimeRollingPolicy::Month => (time.month(), 1),
            _ => (time.month(), time.day()),
        };
        let (hour, minute, second) = match self {
            TimeRollingPolicy::Year | TimeRollingPolicy::Month | TimeRollingPolicy::Day => {
                (0, 0, 0)
            }
            TimeRollingPolicy::Hour => (time.hour(), 0, 0),
            TimeRollingPolicy::Minute => (time.hour(), time.minute(), 0),
            TimeRollingPolicy::Second => (time.hour(), time.minute(), time.second()),
        };
        NaiveDate::from_ymd_opt(time.year(), month, day)?.and_hms_opt(hour, minute, second)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    DateTime,
    Date,
    Time,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Timezone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Text(String),
    Utc(Field),
    Local(Field),
}

fn parse_field(name: &str) -> Option<Field> {
    let field = match name {
        "DateTime" => Field::DateTime,
        "Date" => Field::Date,
        "Time" => Field::Time,
        "Year" => Field::Year,
        "Month" => Field::Month,
        "Day" => Field::Day,
        "Hour" => Field::Hour,
        "Minute" => Field::Minute,
        "Second" => Field::Second,
        "Timezone" | "TimeZone" => Field::Timezone,
        _ => return None,
    };
    Some(field)
}

fn parse_pattern(pattern: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            text.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let name = &after[..close];
        let part = match name.strip_prefix("Utc") {
            Some(utc) => parse_field(utc).map(Part::Utc),
            None => parse_field(name).map(Part::Local),
        };
        match part {
            Some(part) => {
                if !text.is_empty() {
                    parts.push(Part::Text(std::mem::take(&mut text)));
                }
                parts.push(part);
            }
            None => text.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }

    text.push_str(rest);
    if !text.is_empty() {
        parts.push(Part::Text(text));
    }
    parts
}

fn render_field(out: &mut String, time: &NaiveDateTime, zone: &str, field: Field) {
    let formatted = match field {
        Field::DateTime => format!("{}{}", time.format("%Y-%m-%dT%H%M%S"), zone),
        Field::Date => time.format("%Y-%m-%d").to_string(),
        Field::Time => format!("{}{}", time.format("%H%M%S"), zone),
        Field::Year => time.format("%Y").to_string(),
        Field::Month => time.format("%m").to_string(),
        Field::Day => time.format("%d").to_string(),
        Field::Hour => time.format("%H").to_string(),
        Field::Minute => time.format("%M").to_string(),
        Field::Second => time.format("%S").to_string(),
        Field::Timezone => zone.to_string(),
    };
    out.push_str(&formatted);
}

struct TimePolicy {
    policy: TimeRollingPolicy,
    pattern: Vec<Part>,
    local: bool,
}

impl TimePolicy {
    /// Period key and file name for a record timestamp.
    fn resolve(&self, timestamp: u64) -> Option<(NaiveDateTime, String)> {
        let utc = utc_time(timestamp);
        let local = local_time(timestamp);

        let utc_period = self.policy.period(utc.naive_utc())?;
        let local_period = self.policy.period(local.naive_local())?;
        let local_zone = local.format("%z").to_string();

        let mut name = String::new();
        for part in &self.pattern {
            match part {
                Part::Text(text) => name.push_str(text),
                Part::Utc(field) => render_field(&mut name, &utc_period, "Z", *field),
                Part::Local(field) => render_field(&mut name, &local_period, &local_zone, *field),
            }
        }

        let key = if self.local { local_period } else { utc_period };
        Some((key, name))
    }
}

struct SizePolicy {
    filename: String,
    extension: String,
    size: u64,
    backups: usize,
}

impl SizePolicy {
    fn name(&self, index: Option<usize>) -> String {
        let mut name = self.filename.clone();
        if let Some(index) = index {
            name.push_str(&format!(".{}", index));
        }
        if !self.extension.is_empty() {
            name.push('.');
            name.push_str(&self.extension);
        }
        name
    }
}

enum Policy {
    Time(TimePolicy),
    Size(SizePolicy),
}

struct State {
    file: LogFile,
    period: Option<NaiveDateTime>,
}

/// File appender that switches to a new file per time period or once the
/// current file grows past a size limit. Finished files can be compressed
/// on a background thread.
pub struct RollingFileAppender {
    directory: PathBuf,
    policy: Policy,
    auto_flush: bool,
    state: Mutex<State>,
    archiver: Option<Archiver>,
}

impl RollingFileAppender {
    /// Rolls over whenever a record falls into a new `policy` period. The
    /// file name is built from `pattern`, e.g. `{UtcDateTime}.log` or
    /// `{Year}/{Month}/{Day}.log`.
    pub fn with_time_policy(
        directory: impl Into<PathBuf>,
        policy: TimeRollingPolicy,
        pattern: &str,
        archive: bool,
        truncate: bool,
        auto_flush: bool,
    ) -> Result<Self> {
        if pattern.is_empty() {
            return Err(LoggingError::InvalidArgument(
                "rolling file name pattern must not be empty",
            ));
        }

        let pattern = parse_pattern(pattern);
        let local = pattern.iter().any(|part| matches!(part, Part::Local(_)));
        let policy = Policy::Time(TimePolicy {
            policy,
            pattern,
            local,
        });

        Self::build(directory.into(), policy, PathBuf::new(), archive, truncate, auto_flush)
    }

    /// Writes to `filename.extension` and shifts it to `filename.1.extension`
    /// (and older files one further) once it would exceed `size` bytes.
    /// At most `backups` old files are kept.
    #[allow(clippy::too_many_arguments)]
    pub fn with_size_policy(
        directory: impl Into<PathBuf>,
        filename: &str,
        extension: &str,
        size: u64,
        backups: usize,
        archive: bool,
        truncate: bool,
        auto_flush: bool,
    ) -> Result<Self> {
        if filename.is_empty() {
            return Err(LoggingError::InvalidArgument(
                "rolling file name must not be empty",
            ));
        }
        if size == 0 {
            return Err(LoggingError::InvalidArgument(
                "rolling size must be greater than zero",
            ));
        }
        if backups == 0 {
            return Err(LoggingError::InvalidArgument(
                "backups count must be greater than zero",
            ));
        }

        let directory = directory.into();
        let policy = SizePolicy {
            filename: filename.to_string(),
            extension: extension.to_string(),
            size,
            backups,
        };
        let path = directory.join(policy.name(None));

        Self::build(directory, Policy::Size(policy), path, archive, truncate, auto_flush)
    }

    fn build(
        directory: PathBuf,
        policy: Policy,
        path: PathBuf,
        archive: bool,
        truncate: bool,
        auto_flush: bool,
    ) -> Result<Self> {
        let archiver = if archive {
            Some(Archiver::new(ThreadHooks::default())?)
        } else {
            None
        };

        Ok(Self {
            directory,
            policy,
            auto_flush,
            state: Mutex::new(State {
                file: LogFile::new(path, truncate),
                period: None,
            }),
            archiver,
        })
    }

    /// Runs `hooks` on the archive thread. Has no effect unless archiving
    /// is enabled.
    pub fn with_archive_hooks(mut self, hooks: ThreadHooks) -> Result<Self> {
        if self.archiver.is_some() {
            self.archiver = Some(Archiver::new(hooks)?);
        }
        Ok(self)
    }

    /// Path of the file currently written to, if any record arrived yet.
    pub fn current_path(&self) -> Option<PathBuf> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match self.policy {
            Policy::Time(_) if state.period.is_none() => None,
            _ => Some(state.file.path().to_path_buf()),
        }
    }

    /// Blocks until the background archiver has compressed every finished
    /// file.
    pub fn wait_archived(&self) {
        if let Some(archiver) = self.archiver.as_ref() {
            archiver.wait_idle();
        }
    }

    fn archive(&self, path: &Path) {
        if let Some(archiver) = self.archiver.as_ref() {
            if path.exists() {
                archiver.archive(path.to_path_buf());
            }
        }
    }

    fn roll_time(&self, state: &mut State, policy: &TimePolicy, timestamp: u64) {
        let Some((period, name)) = policy.resolve(timestamp) else {
            return;
        };
        if state.period == Some(period) {
            return;
        }

        // The previous file may already be closed by a stop or a write error
        let finished = state.period.map(|_| state.file.path().to_path_buf());
        state.file.set_path(self.directory.join(name));
        state.period = Some(period);

        if let Some(finished) = finished {
            if finished != state.file.path() {
                self.archive(&finished);
            }
        }
    }

    fn roll_size(&self, state: &mut State, policy: &SizePolicy, incoming: usize) {
        if !state.file.prepare() {
            return;
        }
        if state.file.size == 0 || state.file.size + incoming as u64 <= policy.size {
            return;
        }

        state.file.close();

        // The newest backup must be compressed before it is shifted
        if let Some(archiver) = self.archiver.as_ref() {
            archiver.wait_idle();
        }

        let backup = |index: usize| {
            let path = self.directory.join(policy.name(Some(index)));
            if self.archiver.is_some() {
                archive_path(&path)
            } else {
                path
            }
        };

        let oldest = backup(policy.backups);
        if oldest.exists() {
            if let Err(e) = std::fs::remove_file(&oldest) {
                eprintln!(
                    "Logging error: failed to remove '{}': {}",
                    oldest.display(),
                    e
                );
            }
        }

        for index in (1..policy.backups).rev() {
            let from = backup(index);
            if from.exists() {
                let to = backup(index + 1);
                if let Err(e) = std::fs::rename(&from, &to) {
                    eprintln!(
                        "Logging error: failed to rename '{}': {}",
                        from.display(),
                        e
                    );
                }
            }
        }

        let first = self.directory.join(policy.name(Some(1)));
        match std::fs::rename(state.file.path(), &first) {
            Ok(()) => self.archive(&first),
            Err(e) => eprintln!(
                "Logging error: failed to rename '{}': {}",
                state.file.path().display(),
                e
            ),
        }
    }
}

impl Element for RollingFileAppender {
    fn stop(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .file
            .close();
        true
    }
}

impl Appender for RollingFileAppender {
    fn append_record(&self, record: &Record) {
        if record.raw.is_empty() {
            return;
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &self.policy {
            Policy::Time(policy) => self.roll_time(&mut state, policy, record.timestamp),
            Policy::Size(policy) => self.roll_size(&mut state, policy, record.raw.len()),
        }
        state.file.write(&record.raw, self.auto_flush);
    }

    fn flush(&self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .file
            .flush();
    }
}

impl Drop for RollingFileAppender {
    fn drop(&mut self) {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .file
            .close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        fs,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
    };

    use tempfile::tempdir;

    const SECOND: u64 = 1_000_000_000;
    // 1997-07-16T19:20:30Z
    const T0: u64 = 869_080_830 * SECOND;

    fn record(timestamp: u64, text: &str) -> Record {
        let mut record = Record {
            timestamp,
            ..Default::default()
        };
        record.raw.extend_from_slice(text.as_bytes());
        record
    }

    #[test]
    fn test_pattern_rendering() {
        let policy = TimePolicy {
            policy: TimeRollingPolicy::Second,
            pattern: parse_pattern("{UtcDateTime}.log"),
            local: false,
        };
        let (_, name) = policy.resolve(T0).unwrap();
        assert_eq!(name, "1997-07-16T192030Z.log");

        let policy = TimePolicy {
            policy: TimeRollingPolicy::Hour,
            pattern: parse_pattern("{UtcYear}/{UtcMonth}/{UtcDay}/{UtcTime}-{Unknown}.log"),
            local: false,
        };
        let (_, name) = policy.resolve(T0).unwrap();
        assert_eq!(name, "1997/07/16/190000Z-{Unknown}.log");
    }

    #[test]
    fn test_invalid_arguments() {
        let test_dir = tempdir().unwrap();
        let dir = test_dir.path();
        assert!(RollingFileAppender::with_time_policy(
            dir,
            TimeRollingPolicy::Day,
            "",
            false,
            false,
            false
        )
        .is_err());
        assert!(
            RollingFileAppender::with_size_policy(dir, "app", "log", 0, 5, false, false, false)
                .is_err()
        );
        assert!(
            RollingFileAppender::with_size_policy(dir, "app", "log", 10, 0, false, false, false)
                .is_err()
        );
    }

    #[test]
    fn test_time_rolling() {
        let test_dir = tempdir().unwrap();
        let appender = RollingFileAppender::with_time_policy(
            test_dir.path(),
            TimeRollingPolicy::Minute,
            "{UtcDateTime}.log",
            false,
            false,
            true,
        )
        .unwrap();
        assert_eq!(appender.current_path(), None);

        appender.append_record(&record(T0, "a\n"));
        appender.append_record(&record(T0 + 10 * SECOND, "b\n"));
        appender.append_record(&record(T0 + 60 * SECOND, "c\n"));

        let first = test_dir.path().join("1997-07-16T192000Z.log");
        let second = test_dir.path().join("1997-07-16T192100Z.log");
        assert_eq!(fs::read_to_string(first).unwrap(), "a\nb\n");
        assert_eq!(fs::read_to_string(&second).unwrap(), "c\n");
        assert_eq!(appender.current_path(), Some(second));
    }

    #[test]
    fn test_time_rolling_archives_finished_files() {
        let test_dir = tempdir().unwrap();
        let appender = RollingFileAppender::with_time_policy(
            test_dir.path(),
            TimeRollingPolicy::Hour,
            "{UtcDate}-{UtcHour}.log",
            true,
            false,
            true,
        )
        .unwrap();

        appender.append_record(&record(T0, "a\n"));
        appender.append_record(&record(T0 + 3600 * SECOND, "b\n"));
        appender.wait_archived();

        assert!(test_dir.path().join("1997-07-16-19.log.zst").exists());
        assert!(!test_dir.path().join("1997-07-16-19.log").exists());
        assert!(test_dir.path().join("1997-07-16-20.log").exists());
    }

    #[test]
    fn test_time_rolling_archives_after_restart() {
        let test_dir = tempdir().unwrap();
        let appender = RollingFileAppender::with_time_policy(
            test_dir.path(),
            TimeRollingPolicy::Hour,
            "{UtcDate}-{UtcHour}.log",
            true,
            false,
            true,
        )
        .unwrap();

        appender.append_record(&record(T0, "a\n"));
        assert!(appender.stop());
        assert!(appender.start());
        appender.append_record(&record(T0 + 3600 * SECOND, "b\n"));
        appender.wait_archived();

        assert!(
            test_dir.path().join("1997-07-16-19.log.zst").exists(),
            "Closed file of the finished hour should be archived"
        );
        assert!(!test_dir.path().join("1997-07-16-19.log").exists());
        assert_eq!(
            fs::read_to_string(test_dir.path().join("1997-07-16-20.log")).unwrap(),
            "b\n"
        );
    }

    #[test]
    fn test_archive_hooks() {
        let test_dir = tempdir().unwrap();
        let started = Arc::new(AtomicBool::new(false));
        let flag = started.clone();
        let appender = RollingFileAppender::with_time_policy(
            test_dir.path(),
            TimeRollingPolicy::Hour,
            "{UtcDate}-{UtcHour}.log",
            true,
            false,
            true,
        )
        .unwrap()
        .with_archive_hooks(ThreadHooks::new().on_initialize(move || {
            flag.store(true, Ordering::SeqCst);
        }))
        .unwrap();

        appender.append_record(&record(T0, "a\n"));
        appender.append_record(&record(T0 + 3600 * SECOND, "b\n"));
        appender.wait_archived();

        assert!(started.load(Ordering::SeqCst));
        assert!(test_dir.path().join("1997-07-16-19.log.zst").exists());
    }

    #[test]
    fn test_size_rolling() {
        let test_dir = tempdir().unwrap();
        let appender = RollingFileAppender::with_size_policy(
            test_dir.path(),
            "app",
            "log",
            4,
            2,
            false,
            false,
            true,
        )
        .unwrap();

        for text in ["111\n", "222\n", "333\n", "444\n"] {
            appender.append_record(&record(T0, text));
        }
        appender.flush();

        let read = |name: &str| fs::read_to_string(test_dir.path().join(name)).unwrap();
        assert_eq!(read("app.log"), "444\n");
        assert_eq!(read("app.1.log"), "333\n");
        assert_eq!(read("app.2.log"), "222\n");
        assert!(
            !test_dir.path().join("app.3.log").exists(),
            "Only two backups should be kept"
        );
    }

    #[test]
    fn test_size_rolling_with_archive() {
        let test_dir = tempdir().unwrap();
        let appender = RollingFileAppender::with_size_policy(
            test_dir.path(),
            "app",
            "",
            4,
            3,
            true,
            false,
            true,
        )
        .unwrap();

        for text in ["111\n", "222\n", "333\n"] {
            appender.append_record(&record(T0, text));
        }
        appender.wait_archived();

        assert!(test_dir.path().join("app").exists());
        assert!(test_dir.path().join("app.1.zst").exists());
        assert!(test_dir.path().join("app.2.zst").exists());
        assert!(!test_dir.path().join("app.1").exists());
    }

    #[test]
    fn test_local_pattern_has_offset() {
        let policy = TimePolicy {
            policy: TimeRollingPolicy::Second,
            pattern: parse_pattern("{Timezone}"),
            local: true,
        };
        let (_, name) = policy.resolve(T0).unwrap();
        assert_eq!(name, local_time(T0).format("%z").to_string());
        assert_eq!(name.len(), 5);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "hour".parse::<TimeRollingPolicy>().unwrap(),
            TimeRollingPolicy::Hour
        );
    }
}
