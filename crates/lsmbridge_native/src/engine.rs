//! Native engine trait definition.

use crate::error::EngineResult;
use std::fmt;

/// Well-known keys of the engine control namespace.
pub mod keys {
    /// Root directory of the engine.
    pub const PATH: &str = "engine.path";
    /// Whether the engine may create its root directory ("0" or "1").
    pub const PATH_CREATE: &str = "engine.path_create";
    /// Number of background scheduler threads.
    pub const SCHEDULER_THREADS: &str = "scheduler.threads";
    /// Memory budget in bytes (0 = unlimited).
    pub const MEMORY_LIMIT: &str = "memory.limit";
    /// Compaction node size in bytes.
    pub const NODE_SIZE: &str = "compaction.node_size";
    /// Compaction page size in bytes.
    pub const PAGE_SIZE: &str = "compaction.page_size";
    /// Whether the engine keeps its own write-ahead log.
    pub const LOG_ENABLE: &str = "log.enable";
    /// Whether the first `open` stops in recovery mode.
    pub const LOG_TWO_PHASE_RECOVER: &str = "log.two_phase_recover";
    /// Whether transactions commit at a caller supplied LSN.
    pub const LOG_COMMIT_LSN: &str = "log.commit_lsn";
    /// Command: start an asynchronous checkpoint.
    pub const SCHEDULER_CHECKPOINT: &str = "scheduler.checkpoint";
    /// Engine LSN of the last completed checkpoint.
    pub const CHECKPOINT_LSN_LAST: &str = "scheduler.checkpoint_lsn_last";
    /// Setting this key to an LSN creates the snapshot marker for it.
    pub const SNAPSHOT: &str = "snapshot";
    /// Current engine LSN.
    pub const METRIC_LSN: &str = "metric.lsn";

    /// Name of the snapshot marker for `lsn` (`snapshot.<lsn>`).
    #[must_use]
    pub fn snapshot(lsn: i64) -> String {
        format!("snapshot.{lsn}")
    }

    /// Name of the start-LSN entry of the snapshot for `lsn`
    /// (`snapshot.<lsn>.lsn`).
    #[must_use]
    pub fn snapshot_lsn(lsn: i64) -> String {
        format!("snapshot.{lsn}.lsn")
    }
}

/// Identifier of a native table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table:{}", self.0)
    }
}

/// Handle to the engine's in-flight write transaction.
///
/// The handle is neither `Clone` nor `Copy`: [`NativeEngine::commit`] and
/// [`NativeEngine::rollback`] consume it, so a finished transaction cannot
/// be reused.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a native transaction must be committed or rolled back"]
pub struct NativeTxn {
    id: u64,
}

impl NativeTxn {
    /// Wraps a raw transaction id. Only engines create handles.
    pub fn from_raw(id: u64) -> Self {
        Self { id }
    }

    /// Returns the raw transaction id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Cursor over the control namespace.
#[derive(Debug)]
pub struct ControlCursor {
    entries: std::vec::IntoIter<(String, String)>,
}

impl ControlCursor {
    /// Creates a cursor over a materialized list of entries.
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl Iterator for ControlCursor {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }
}

/// An opaque LSM key-value engine.
///
/// # Control namespace
///
/// Configuration, snapshot markers and scheduler state live in a flat
/// string namespace (see [`keys`]). `ctl_get` distinguishes "missing"
/// (`Ok(None)`) from "the engine failed" (`Err`).
///
/// # Lifecycle
///
/// With `log.two_phase_recover` enabled the first `open` leaves the engine
/// in recovery mode and a second `open` brings it online.
///
/// # Transactions
///
/// At most one write transaction is active at a time. `commit` and
/// `rollback` destroy the transaction whatever their outcome.
pub trait NativeEngine: Send + Sync {
    /// Sets a control key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, read-only, or the value is
    /// rejected.
    fn ctl_set(&self, key: &str, value: &str) -> EngineResult<()>;

    /// Issues a value-less control command such as
    /// [`keys::SCHEDULER_CHECKPOINT`].
    ///
    /// # Errors
    ///
    /// Returns an error if the command is unknown or fails.
    fn ctl_command(&self, key: &str) -> EngineResult<()>;

    /// Reads a control key. `Ok(None)` means the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to resolve the key.
    fn ctl_get(&self, key: &str) -> EngineResult<Option<String>>;

    /// Destroys a control object (a snapshot marker).
    ///
    /// Returns `false` if the object does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the object exists but cannot be destroyed.
    fn ctl_delete(&self, key: &str) -> EngineResult<bool>;

    /// Opens a cursor over every entry of the control namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor cannot be created.
    fn ctl_cursor(&self) -> EngineResult<ControlCursor>;

    /// Opens the environment (one phase of a two-phase open).
    ///
    /// # Errors
    ///
    /// Returns an error if the environment cannot be opened.
    fn open(&self) -> EngineResult<()>;

    /// Creates a table, or opens it if it already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be created.
    fn create_table(&self, name: &str) -> EngineResult<TableId>;

    /// Destroys a table and its data.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist or cannot be destroyed.
    fn destroy_table(&self, table: TableId) -> EngineResult<()>;

    /// Starts the write transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a transaction is already active.
    fn begin(&self) -> EngineResult<NativeTxn>;

    /// Writes a key within the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction or table is unknown.
    fn set(&self, txn: &NativeTxn, table: TableId, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Prepares the transaction for commit at `lsn`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be prepared.
    fn prepare(&self, txn: &NativeTxn, lsn: i64) -> EngineResult<()>;

    /// Commits and destroys the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails. The transaction is gone
    /// either way.
    fn commit(&self, txn: NativeTxn) -> EngineResult<()>;

    /// Rolls back and destroys the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails. The transaction is gone
    /// either way.
    fn rollback(&self, txn: NativeTxn) -> EngineResult<()>;

    /// Writes a key outside any transaction while replaying the host log.
    ///
    /// Writes at or below the table's durable LSN are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is unknown.
    fn recover_set(&self, table: TableId, key: &[u8], value: &[u8], lsn: i64)
        -> EngineResult<()>;

    /// Reads the committed value of a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is unknown.
    fn get(&self, table: TableId, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_key_names() {
        assert_eq!(keys::snapshot(100), "snapshot.100");
        assert_eq!(keys::snapshot_lsn(100), "snapshot.100.lsn");
    }

    #[test]
    fn control_cursor_yields_in_order() {
        let cursor = ControlCursor::new(vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ]);
        let keys: Vec<String> = cursor.map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
