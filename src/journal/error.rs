//! Error types for journal operations

use std::fmt;

/// Result type alias for journal operations
pub type JournalResult<T> = Result<T, JournalError>;

/// Errors that can occur while journaling comments
#[derive(Debug)]
pub enum JournalError {
    /// Opening the journal failed
    ConnectionFailed(String),

    /// A journal query failed
    QueryFailed(String),

    /// Schema migration failed
    MigrationFailed(String),

    /// A stored row does not reassemble into a valid comment
    CorruptRecord(String),

    /// I/O error (file access, etc.)
    IoError(std::io::Error),
}

impl fmt::Display for JournalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JournalError::ConnectionFailed(msg) => {
                write!(f, "failed to open comment journal: {}", msg)
            }
            JournalError::QueryFailed(msg) => write!(f, "journal query failed: {}", msg),
            JournalError::MigrationFailed(msg) => {
                write!(f, "journal migration failed: {}", msg)
            }
            JournalError::CorruptRecord(msg) => {
                write!(f, "corrupt journal record: {}", msg)
            }
            JournalError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for JournalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JournalError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for JournalError {
    fn from(err: std::io::Error) -> Self {
        JournalError::IoError(err)
    }
}

#[cfg(feature = "journal-sqlite")]
impl From<sqlx::Error> for JournalError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(io_err) => JournalError::IoError(io_err),
            _ => JournalError::QueryFailed(err.to_string()),
        }
    }
}

#[cfg(feature = "journal-sqlite")]
impl From<sqlx::migrate::MigrateError> for JournalError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        JournalError::MigrationFailed(err.to_string())
    }
}
