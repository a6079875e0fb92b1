//! Host-facing storage engine interface.

use crate::checkpoint::CheckpointStatus;
use crate::error::CoreResult;
use crate::index::{Index, KeyDef};
use crate::space::Space;
use crate::transaction::HostTxn;
use crate::tuple::Tuple;
use crate::types::{Lsn, SpaceId};
use std::future::Future;
use std::sync::Arc;

/// The operations a host database drives on one of its storage backends.
///
/// Startup runs `begin_recover_snapshot`, `end_recover_snapshot` and
/// `end_recovery` in that order. Steady-state traffic goes through
/// `begin`, `replace`, `commit` and `rollback`. The host checkpoints with
/// `begin_checkpoint`, `wait_checkpoint`, then either `commit_checkpoint`
/// or `abort_checkpoint`.
pub trait StorageEngine: Send + Sync {
    /// Backend name.
    fn name(&self) -> &'static str;

    /// Whether the backend takes part in host transactions.
    fn is_transactional(&self) -> bool;

    /// Creates the handler of a space.
    fn open_space(&self, space_id: SpaceId) -> Space;

    /// Checks that an index definition can be served.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedIndexType` or `ModifyIndex`.
    fn keydef_check(&self, key_def: &KeyDef) -> CoreResult<()>;

    /// Creates an index.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedIndexType` or an engine error.
    fn create_index(&self, key_def: KeyDef) -> CoreResult<Index>;

    /// Drops an index and its on-disk data.
    ///
    /// # Errors
    ///
    /// Returns an engine error; the index is consumed either way.
    fn drop_index(&self, index: Index) -> CoreResult<()>;

    /// Called at the start of every statement.
    ///
    /// # Errors
    ///
    /// See [`TransactionBridge::begin`](crate::TransactionBridge::begin).
    fn begin(&self, txn: &HostTxn, space: &Space) -> CoreResult<()>;

    /// Writes a tuple.
    ///
    /// # Errors
    ///
    /// See [`TransactionBridge::replace`](crate::TransactionBridge::replace).
    fn replace(&self, space: &Space, txn: &mut HostTxn, tuple: Arc<Tuple>) -> CoreResult<()>;

    /// Commits the host transaction.
    ///
    /// # Errors
    ///
    /// See [`TransactionBridge::commit`](crate::TransactionBridge::commit).
    fn commit(&self, txn: &mut HostTxn) -> CoreResult<()>;

    /// Rolls back the host transaction.
    fn rollback(&self, txn: &mut HostTxn);

    /// Starts recovery from the snapshot taken at `lsn`.
    ///
    /// # Errors
    ///
    /// Returns an engine error if the snapshot markers cannot be written.
    fn begin_recover_snapshot(&self, lsn: Lsn) -> CoreResult<()>;

    /// Finishes snapshot recovery; log replay follows.
    fn end_recover_snapshot(&self);

    /// Finishes log replay and brings the engine online.
    ///
    /// # Errors
    ///
    /// Returns an engine error if the engine cannot go online.
    fn end_recovery(&self) -> CoreResult<()>;

    /// Requests a checkpoint covering `lsn`.
    ///
    /// # Errors
    ///
    /// See [`CheckpointCoordinator::begin`](crate::CheckpointCoordinator::begin).
    fn begin_checkpoint(&self, lsn: Lsn) -> CoreResult<CheckpointStatus>;

    /// Waits for the requested checkpoint to complete.
    fn wait_checkpoint(&self) -> impl Future<Output = CoreResult<()>> + Send;

    /// Commits the requested checkpoint.
    ///
    /// # Errors
    ///
    /// See [`CheckpointCoordinator::commit`](crate::CheckpointCoordinator::commit).
    fn commit_checkpoint(&self) -> CoreResult<()>;

    /// Abandons the requested checkpoint.
    ///
    /// # Errors
    ///
    /// See [`CheckpointCoordinator::abort`](crate::CheckpointCoordinator::abort).
    fn abort_checkpoint(&self) -> CoreResult<()>;
}
