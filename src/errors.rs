//! Error hierarchy for the counter service.
//!
//! Errors are grouped by how the caller is expected to react:
//! storage and task failures are operational (logged, retried on the next
//! cycle), configuration errors and [`Error::Fatal`] abort startup.

use std::path::PathBuf;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (storage, serialization, background tasks)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),

    #[error("Failed to send shutdown signal: {0}")]
    SignalSendFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Disk I/O failures while preparing directories or backups
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// I/O failure bound to a concrete location
    #[error("Error occurred at path: {path}")]
    PathError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Embedded database errors
    #[error(transparent)]
    Sled(#[from] sled::Error),

    /// Serialization failures for persisted rows
    #[error(transparent)]
    BincodeError(#[from] bincode::Error),

    /// Stored schema cannot be reconciled with the configured counters
    #[error("Schema error: {0}")]
    Schema(String),

    /// A row key or value does not match the expected layout
    #[error("Data corruption detected at {location}")]
    DataCorruption { location: String },

    /// Backup creation failures
    #[error("Backup failed: {0}")]
    Backup(String),
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::System(SystemError::Storage(e))
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        StorageError::Sled(e).into()
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        StorageError::IoError(e).into()
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        StorageError::BincodeError(e).into()
    }
}

impl From<JoinError> for Error {
    fn from(e: JoinError) -> Self {
        Error::System(SystemError::TaskFailed(e))
    }
}

impl Error {
    /// Wraps a startup failure so `main` can tell it apart from operational errors.
    pub fn fatal(context: &str, e: impl std::fmt::Display) -> Self {
        Error::Fatal(format!("{context}: {e}"))
    }
}
