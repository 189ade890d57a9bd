//! Error types for the migration pipeline

use thiserror::Error;

/// Result type alias for migration operations
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Everything that can go wrong during a run.
///
/// Variants fall into three classes, see [`MigrateError::severity`]:
/// run-fatal (`Config`, `Connection`, `Enumeration`, `Worker`), item-terminal
/// (`NotFound`, `Open`) and retryable (`Transfer`).
#[derive(Error, Debug)]
pub enum MigrateError {
    /// A required setting is missing or out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source or destination backend could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The source listing could not be queried or fully read
    #[error("Enumeration error: {0}")]
    Enumeration(String),

    /// The object vanished between listing and open
    #[error("Object not found in source store: {0}")]
    NotFound(String),

    /// The object exists but its content could not be read
    #[error("Failed to open {name}: {message}")]
    Open { name: String, message: String },

    /// The destination rejected or failed the upload
    #[error("Transfer of {key} failed: {message}")]
    Transfer { key: String, message: String },

    /// A worker task panicked or was cancelled
    #[error("Worker error: {0}")]
    Worker(String),
}

/// How far an error propagates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Stops the whole run
    Fatal,
    /// Abandons the current item without further attempts
    ItemTerminal,
    /// Worth another attempt on the same item
    Retryable,
}

impl MigrateError {
    pub fn open(name: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Open {
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub fn transfer(key: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Transfer {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            MigrateError::Transfer { .. } => Severity::Retryable,
            MigrateError::NotFound(_) | MigrateError::Open { .. } => Severity::ItemTerminal,
            MigrateError::Config(_)
            | MigrateError::Connection(_)
            | MigrateError::Enumeration(_)
            | MigrateError::Worker(_) => Severity::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.severity() == Severity::Retryable
    }
}
