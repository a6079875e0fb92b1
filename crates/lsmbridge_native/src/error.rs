//! Error types for native engine operations.

use std::io;
use thiserror::Error;

/// Result type for native engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors reported by the native engine.
///
/// The adapter surfaces every variant to the host as a single
/// "storage engine error" carrying the rendered message.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The environment has not been opened yet.
    #[error("environment is not open")]
    NotOpen,

    /// The environment is already fully open.
    #[error("environment is already open")]
    AlreadyOpen,

    /// A control key was set to a value the engine cannot accept.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// The control key.
        key: String,
        /// The rejected value.
        value: String,
    },

    /// A control key is not known to the engine.
    #[error("unknown control key: {0}")]
    UnknownKey(String),

    /// The configuration is fixed once the environment is open.
    #[error("control key {0} is read-only after open")]
    ReadOnly(String),

    /// A write transaction is already active.
    #[error("a write transaction is already active")]
    TransactionActive,

    /// The transaction handle does not match the active transaction.
    #[error("unknown transaction {0}")]
    UnknownTransaction(u64),

    /// The transaction must be prepared before commit.
    #[error("transaction {0} is not prepared")]
    NotPrepared(u64),

    /// The table does not exist.
    #[error("unknown table {0}")]
    UnknownTable(u32),

    /// Any other failure, carrying the engine's message.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Creates an error carrying an engine message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
