//! Error types for lsmbridge core.

use crate::types::{IndexId, Lsn, SpaceId};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in adapter operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Any failure reported by the wrapped storage engine.
    #[error("storage engine error: {0}")]
    Engine(#[from] lsmbridge_native::EngineError),

    /// An index definition violates an engine constraint.
    #[error("can't modify index {index_id} in space {space_id}: {reason}")]
    ModifyIndex {
        /// The offending index.
        index_id: IndexId,
        /// The space the index belongs to.
        space_id: SpaceId,
        /// Human-readable reason.
        reason: String,
    },

    /// The requested index type is not supported by this engine.
    #[error("unsupported index type supplied for index {index_id} in space {space_id}")]
    UnsupportedIndexType {
        /// The offending index.
        index_id: IndexId,
        /// The space the index belongs to.
        space_id: SpaceId,
    },

    /// A native transaction is already open on this handle.
    #[error("a native transaction is already open")]
    TransactionAlreadyOpen,

    /// A follow-up statement found no open native transaction.
    #[error("no native transaction is open")]
    NoActiveTransaction,

    /// The space has no bound primary index.
    #[error("space {space_id} has no primary index")]
    NoPrimaryIndex {
        /// The space.
        space_id: SpaceId,
    },

    /// The host commit signature is not a valid commit LSN.
    #[error("invalid commit signature: {0}")]
    InvalidSignature(i64),

    /// The checkpoint LSN is negative.
    #[error("invalid checkpoint LSN: {0}")]
    InvalidLsn(Lsn),

    /// A checkpoint is already in flight.
    #[error("checkpoint {pending} is already in progress")]
    CheckpointInProgress {
        /// The in-flight checkpoint.
        pending: Lsn,
    },

    /// The operation needs an in-flight checkpoint.
    #[error("no checkpoint is in progress")]
    NoPendingCheckpoint,

    /// Waiting for a checkpoint hit its deadline or was cancelled.
    #[error("wait for checkpoint {lsn} aborted after {polls} polls")]
    CheckpointWaitAborted {
        /// The checkpoint being waited for.
        lsn: Lsn,
        /// Number of readiness polls performed.
        polls: u64,
    },

    /// A tuple does not carry a usable key.
    #[error("bad key in space {space_id}: {message}")]
    TupleKey {
        /// The space.
        space_id: SpaceId,
        /// Description of the problem.
        message: String,
    },

    /// A tuple could not be encoded or decoded.
    #[error("tuple encoding error: {message}")]
    TupleEncoding {
        /// Description of the failure.
        message: String,
    },

    /// Configuration rejected by validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an index modification error.
    pub fn modify_index(index_id: IndexId, space_id: SpaceId, reason: impl Into<String>) -> Self {
        Self::ModifyIndex {
            index_id,
            space_id,
            reason: reason.into(),
        }
    }

    /// Creates an engine error from a message produced by the adapter while
    /// interpreting engine output.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(lsmbridge_native::EngineError::other(message))
    }

    /// Creates a tuple key error.
    pub fn tuple_key(space_id: SpaceId, message: impl Into<String>) -> Self {
        Self::TupleKey {
            space_id,
            message: message.into(),
        }
    }

    /// Creates a tuple encoding error.
    pub fn tuple_encoding(message: impl Into<String>) -> Self {
        Self::TupleEncoding {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Aborts on a state the adapter has no defined recovery from.
///
/// Logs at `error` first so the cause reaches the log even when the host
/// runs with `panic = "abort"`.
#[track_caller]
pub(crate) fn fatal(message: impl std::fmt::Display) -> ! {
    tracing::error!(%message, "fatal storage engine inconsistency");
    panic!("{message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_render_as_storage_engine_error() {
        let err = CoreError::engine("disk full");
        assert_eq!(err.to_string(), "storage engine error: disk full");
    }

    #[test]
    fn modify_index_carries_identifiers() {
        let err = CoreError::modify_index(IndexId::new(1), SpaceId::new(512), "must be unique");
        assert_eq!(
            err.to_string(),
            "can't modify index 1 in space 512: must be unique"
        );
    }
}
