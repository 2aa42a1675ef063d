use std::path::{Path, PathBuf};

/// Errors surfaced by the lumber API.
///
/// Failures that happen while a record is flowing through a processor tree
/// are not returned to the caller; appenders report them on stderr and keep
/// going. This type covers construction, configuration and decoding.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("I/O error on '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error")]
    Stream(#[from] std::io::Error),

    #[error("Invalid regular expression")]
    Regex(#[from] regex::Error),

    #[error("Failed to parse logging settings")]
    Settings(#[from] serde_yaml::Error),

    #[error("Unknown logging level '{0}'")]
    UnknownLevel(String),

    #[error("Malformed logging record: {0}")]
    Decode(&'static str),

    #[error(
        "Hash collision 0x{hash:08X}: '{previous}' conflicts with '{conflict}'"
    )]
    HashCollision {
        hash: u32,
        previous: String,
        conflict: String,
    },
}

impl LoggingError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// The error and all of its sources on one line, for stderr diagnostics.
    pub(crate) fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

pub type Result<T, E = LoggingError> = std::result::Result<T, E>;

/// Extension used to attach a path to raw `std::io` results.
pub(crate) trait IoResultExt<T> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| LoggingError::io(path, e))
    }
}
