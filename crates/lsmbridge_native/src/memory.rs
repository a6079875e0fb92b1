//! In-process reference engine.

use crate::engine::{keys, ControlCursor, NativeEngine, NativeTxn, TableId};
use crate::error::{EngineError, EngineResult};
use fs2::FileExt;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use tracing::{debug, info};

/// Lock file held in the root directory while the environment is open.
const LOCK_FILE: &str = "LOCK";
/// Placeholder data file created in every table directory.
const TABLE_FILE: &str = "00000000000000000001.db";

/// Open state of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenState {
    /// `open` has not been called yet; configuration is writable.
    Closed,
    /// First phase of a two-phase open: replaying the host log.
    Recovering,
    /// Fully open and serving.
    Online,
}

#[derive(Debug)]
struct Settings {
    path: Option<PathBuf>,
    path_create: bool,
    threads: u64,
    memory_limit: u64,
    node_size: u64,
    page_size: u64,
    log_enable: bool,
    two_phase_recover: bool,
    commit_lsn: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            path: None,
            path_create: true,
            threads: 4,
            memory_limit: 0,
            node_size: 128 * 1024 * 1024,
            page_size: 128 * 1024,
            log_enable: true,
            two_phase_recover: false,
            commit_lsn: false,
        }
    }
}

#[derive(Debug)]
struct Table {
    name: String,
    rows: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Highest LSN applied to this table.
    lsn: i64,
}

#[derive(Debug)]
struct ActiveTxn {
    id: u64,
    writes: Vec<(TableId, Vec<u8>, Vec<u8>)>,
    prepared_lsn: Option<i64>,
}

#[derive(Debug)]
struct State {
    open: OpenState,
    settings: Settings,
    tables: BTreeMap<TableId, Table>,
    next_table: u32,
    txn: Option<ActiveTxn>,
    next_txn: u64,
    lsn: i64,
    checkpoint_lsn_last: i64,
    /// Engine LSN the running checkpoint will publish when it completes.
    checkpoint_target: Option<i64>,
    polls_remaining: u32,
    checkpoint_latency: u32,
    /// Host LSN -> engine LSN at which the snapshot was taken.
    snapshots: BTreeMap<i64, i64>,
    _lock: Option<File>,
}

/// An in-process engine modelling the observable control protocol of an
/// LSM engine.
///
/// Rows are kept in memory. When `engine.path` is set the engine locks the
/// root directory and creates one directory per table, so on-disk cleanup
/// can be exercised.
///
/// # Checkpoints
///
/// `scheduler.checkpoint` starts a checkpoint of the current engine LSN. It
/// completes after `checkpoint_latency` reads of
/// `scheduler.checkpoint_lsn_last`, standing in for the background
/// scheduler, or immediately via [`MemoryEngine::run_scheduler`].
///
/// # Example
///
/// ```rust
/// use lsmbridge_native::{keys, MemoryEngine, NativeEngine};
///
/// let engine = MemoryEngine::new().with_checkpoint_latency(2);
/// engine.open().unwrap();
/// engine.ctl_command(keys::SCHEDULER_CHECKPOINT).unwrap();
/// assert_eq!(engine.pending_checkpoint(), Some(0));
/// engine.ctl_get(keys::CHECKPOINT_LSN_LAST).unwrap();
/// engine.ctl_get(keys::CHECKPOINT_LSN_LAST).unwrap();
/// assert_eq!(engine.pending_checkpoint(), None);
/// ```
#[derive(Debug)]
pub struct MemoryEngine {
    state: Mutex<State>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// Creates a closed engine with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                open: OpenState::Closed,
                settings: Settings::default(),
                tables: BTreeMap::new(),
                next_table: 1,
                txn: None,
                next_txn: 1,
                lsn: 0,
                checkpoint_lsn_last: 0,
                checkpoint_target: None,
                polls_remaining: 0,
                checkpoint_latency: 0,
                snapshots: BTreeMap::new(),
                _lock: None,
            }),
        }
    }

    /// Sets how many readiness polls a checkpoint takes to complete.
    #[must_use]
    pub fn with_checkpoint_latency(self, polls: u32) -> Self {
        self.state.lock().checkpoint_latency = polls;
        self
    }

    /// Returns the open state.
    #[must_use]
    pub fn open_state(&self) -> OpenState {
        self.state.lock().open
    }

    /// Returns the current engine LSN.
    #[must_use]
    pub fn lsn(&self) -> i64 {
        self.state.lock().lsn
    }

    /// Returns the engine LSN of the running checkpoint, if any.
    #[must_use]
    pub fn pending_checkpoint(&self) -> Option<i64> {
        self.state.lock().checkpoint_target
    }

    /// Completes the running checkpoint immediately.
    pub fn run_scheduler(&self) {
        complete_checkpoint(&mut self.state.lock());
    }

    /// Returns the host LSNs of all existing snapshot markers.
    #[must_use]
    pub fn snapshots(&self) -> Vec<i64> {
        self.state.lock().snapshots.keys().copied().collect()
    }

    /// Returns whether a write transaction is active.
    #[must_use]
    pub fn has_active_transaction(&self) -> bool {
        self.state.lock().txn.is_some()
    }

    /// Returns the number of tables.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.state.lock().tables.len()
    }
}

fn complete_checkpoint(state: &mut State) {
    if let Some(target) = state.checkpoint_target.take() {
        state.checkpoint_lsn_last = state.checkpoint_lsn_last.max(target);
        state.polls_remaining = 0;
        debug!(lsn = target, "checkpoint complete");
    }
}

fn parse_flag(key: &str, value: &str) -> EngineResult<bool> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(invalid(key, value)),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> EngineResult<T> {
    value.parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> EngineError {
    EngineError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Splits `snapshot.<lsn>` / `snapshot.<lsn>.lsn` into the LSN and whether
/// the key names the start-LSN entry.
fn parse_snapshot_key(key: &str) -> Option<(i64, bool)> {
    let rest = key.strip_prefix("snapshot.")?;
    match rest.strip_suffix(".lsn") {
        Some(lsn) => lsn.parse().ok().map(|lsn| (lsn, true)),
        None => rest.parse().ok().map(|lsn| (lsn, false)),
    }
}

fn flag(value: bool) -> String {
    let value = if value { "1" } else { "0" };
    value.to_string()
}

impl State {
    fn ensure_configurable(&self, key: &str) -> EngineResult<()> {
        if self.open == OpenState::Closed {
            Ok(())
        } else {
            Err(EngineError::ReadOnly(key.to_string()))
        }
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.open == OpenState::Closed {
            Err(EngineError::NotOpen)
        } else {
            Ok(())
        }
    }

    fn settings_entries(&self) -> Vec<(String, String)> {
        let s = &self.settings;
        let mut entries = Vec::new();
        if let Some(path) = &s.path {
            entries.push((keys::PATH.to_string(), path.display().to_string()));
        }
        entries.extend([
            (keys::PATH_CREATE.to_string(), flag(s.path_create)),
            (keys::SCHEDULER_THREADS.to_string(), s.threads.to_string()),
            (keys::MEMORY_LIMIT.to_string(), s.memory_limit.to_string()),
            (keys::NODE_SIZE.to_string(), s.node_size.to_string()),
            (keys::PAGE_SIZE.to_string(), s.page_size.to_string()),
            (keys::LOG_ENABLE.to_string(), flag(s.log_enable)),
            (keys::LOG_TWO_PHASE_RECOVER.to_string(), flag(s.two_phase_recover)),
            (keys::LOG_COMMIT_LSN.to_string(), flag(s.commit_lsn)),
        ]);
        entries
    }

    fn active_txn(&mut self, txn: &NativeTxn) -> EngineResult<&mut ActiveTxn> {
        match self.txn.as_mut() {
            Some(active) if active.id == txn.id() => Ok(active),
            _ => Err(EngineError::UnknownTransaction(txn.id())),
        }
    }

    fn take_txn(&mut self, txn: &NativeTxn) -> EngineResult<ActiveTxn> {
        match self.txn.take() {
            Some(active) if active.id == txn.id() => Ok(active),
            other => {
                self.txn = other;
                Err(EngineError::UnknownTransaction(txn.id()))
            }
        }
    }

    fn table_mut(&mut self, table: TableId) -> EngineResult<&mut Table> {
        self.tables
            .get_mut(&table)
            .ok_or(EngineError::UnknownTable(table.0))
    }
}

impl NativeEngine for MemoryEngine {
    fn ctl_set(&self, key: &str, value: &str) -> EngineResult<()> {
        let mut state = self.state.lock();
        match key {
            keys::PATH => {
                state.ensure_configurable(key)?;
                state.settings.path = Some(PathBuf::from(value));
            }
            keys::PATH_CREATE => {
                state.ensure_configurable(key)?;
                state.settings.path_create = parse_flag(key, value)?;
            }
            keys::SCHEDULER_THREADS => {
                state.ensure_configurable(key)?;
                state.settings.threads = parse_num(key, value)?;
            }
            keys::MEMORY_LIMIT => {
                state.ensure_configurable(key)?;
                state.settings.memory_limit = parse_num(key, value)?;
            }
            keys::NODE_SIZE => {
                state.ensure_configurable(key)?;
                state.settings.node_size = parse_num(key, value)?;
            }
            keys::PAGE_SIZE => {
                state.ensure_configurable(key)?;
                state.settings.page_size = parse_num(key, value)?;
            }
            keys::LOG_ENABLE => {
                state.ensure_configurable(key)?;
                state.settings.log_enable = parse_flag(key, value)?;
            }
            keys::LOG_TWO_PHASE_RECOVER => {
                state.ensure_configurable(key)?;
                state.settings.two_phase_recover = parse_flag(key, value)?;
            }
            keys::LOG_COMMIT_LSN => {
                state.ensure_configurable(key)?;
                state.settings.commit_lsn = parse_flag(key, value)?;
            }
            keys::SNAPSHOT => {
                state.ensure_open()?;
                let lsn: i64 = parse_num(key, value)?;
                let start = state.lsn;
                state.snapshots.entry(lsn).or_insert(start);
                debug!(lsn, start, "snapshot marker created");
            }
            _ => match parse_snapshot_key(key) {
                Some((lsn, true)) => {
                    state.ensure_open()?;
                    let start: i64 = parse_num(key, value)?;
                    state.snapshots.insert(lsn, start);
                }
                _ => return Err(EngineError::UnknownKey(key.to_string())),
            },
        }
        Ok(())
    }

    fn ctl_command(&self, key: &str) -> EngineResult<()> {
        let mut state = self.state.lock();
        match key {
            keys::SCHEDULER_CHECKPOINT => {
                state.ensure_open()?;
                let target = state.lsn;
                state.checkpoint_target = Some(target);
                state.polls_remaining = state.checkpoint_latency;
                debug!(lsn = target, "checkpoint scheduled");
                if state.checkpoint_latency == 0 {
                    complete_checkpoint(&mut state);
                }
                Ok(())
            }
            _ => Err(EngineError::UnknownKey(key.to_string())),
        }
    }

    fn ctl_get(&self, key: &str) -> EngineResult<Option<String>> {
        let mut state = self.state.lock();
        match key {
            keys::CHECKPOINT_LSN_LAST => {
                if state.checkpoint_target.is_some() {
                    if state.polls_remaining <= 1 {
                        complete_checkpoint(&mut state);
                    } else {
                        state.polls_remaining -= 1;
                    }
                }
                Ok(Some(state.checkpoint_lsn_last.to_string()))
            }
            keys::METRIC_LSN => Ok(Some(state.lsn.to_string())),
            _ => {
                if let Some((lsn, is_start)) = parse_snapshot_key(key) {
                    return Ok(state.snapshots.get(&lsn).map(|start| {
                        if is_start {
                            start.to_string()
                        } else {
                            lsn.to_string()
                        }
                    }));
                }
                let value = state
                    .settings_entries()
                    .into_iter()
                    .find_map(|(k, v)| (k == key).then_some(v));
                match value {
                    Some(v) => Ok(Some(v)),
                    None if key == keys::PATH => Ok(None),
                    None => Err(EngineError::UnknownKey(key.to_string())),
                }
            }
        }
    }

    fn ctl_delete(&self, key: &str) -> EngineResult<bool> {
        let mut state = self.state.lock();
        match parse_snapshot_key(key) {
            Some((lsn, false)) => {
                let removed = state.snapshots.remove(&lsn).is_some();
                if removed {
                    debug!(lsn, "snapshot marker destroyed");
                }
                Ok(removed)
            }
            _ => Err(EngineError::UnknownKey(key.to_string())),
        }
    }

    fn ctl_cursor(&self) -> EngineResult<ControlCursor> {
        let state = self.state.lock();
        let mut entries = state.settings_entries();
        entries.push((
            keys::CHECKPOINT_LSN_LAST.to_string(),
            state.checkpoint_lsn_last.to_string(),
        ));
        entries.push((keys::METRIC_LSN.to_string(), state.lsn.to_string()));
        for (lsn, start) in &state.snapshots {
            entries.push((keys::snapshot(*lsn), lsn.to_string()));
            entries.push((keys::snapshot_lsn(*lsn), start.to_string()));
        }
        Ok(ControlCursor::new(entries))
    }

    fn open(&self) -> EngineResult<()> {
        let mut state = self.state.lock();
        match state.open {
            OpenState::Closed => {
                if let Some(path) = state.settings.path.clone() {
                    if !path.is_dir() {
                        if state.settings.path_create {
                            fs::create_dir_all(&path)?;
                        } else {
                            return Err(EngineError::other(format!(
                                "storage path does not exist: {}",
                                path.display()
                            )));
                        }
                    }
                    let lock = OpenOptions::new()
                        .read(true)
                        .write(true)
                        .create(true)
                        .truncate(false)
                        .open(path.join(LOCK_FILE))?;
                    if lock.try_lock_exclusive().is_err() {
                        return Err(EngineError::other(format!(
                            "environment is locked by another process: {}",
                            path.display()
                        )));
                    }
                    state._lock = Some(lock);
                }
                state.open = if state.settings.two_phase_recover {
                    OpenState::Recovering
                } else {
                    OpenState::Online
                };
                info!(state = ?state.open, "environment opened");
                Ok(())
            }
            OpenState::Recovering => {
                state.open = OpenState::Online;
                info!("environment online");
                Ok(())
            }
            OpenState::Online => Err(EngineError::AlreadyOpen),
        }
    }

    fn create_table(&self, name: &str) -> EngineResult<TableId> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        if let Some((id, _)) = state.tables.iter().find(|(_, t)| t.name == name) {
            return Ok(*id);
        }
        if let Some(root) = &state.settings.path {
            let dir = root.join(name);
            fs::create_dir_all(&dir)?;
            File::create(dir.join(TABLE_FILE))?;
        }
        let id = TableId(state.next_table);
        state.next_table += 1;
        state.tables.insert(
            id,
            Table {
                name: name.to_string(),
                rows: BTreeMap::new(),
                lsn: 0,
            },
        );
        debug!(table = %id, name, "table created");
        Ok(id)
    }

    fn destroy_table(&self, table: TableId) -> EngineResult<()> {
        let mut state = self.state.lock();
        if state.tables.remove(&table).is_none() {
            return Err(EngineError::UnknownTable(table.0));
        }
        if let Some(active) = state.txn.as_mut() {
            active.writes.retain(|(t, _, _)| *t != table);
        }
        debug!(table = %table, "table destroyed");
        Ok(())
    }

    fn begin(&self) -> EngineResult<NativeTxn> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        if state.txn.is_some() {
            return Err(EngineError::TransactionActive);
        }
        let id = state.next_txn;
        state.next_txn += 1;
        state.txn = Some(ActiveTxn {
            id,
            writes: Vec::new(),
            prepared_lsn: None,
        });
        Ok(NativeTxn::from_raw(id))
    }

    fn set(&self, txn: &NativeTxn, table: TableId, key: &[u8], value: &[u8]) -> EngineResult<()> {
        let mut state = self.state.lock();
        if !state.tables.contains_key(&table) {
            return Err(EngineError::UnknownTable(table.0));
        }
        state
            .active_txn(txn)?
            .writes
            .push((table, key.to_vec(), value.to_vec()));
        Ok(())
    }

    fn prepare(&self, txn: &NativeTxn, lsn: i64) -> EngineResult<()> {
        let mut state = self.state.lock();
        if lsn < 0 {
            return Err(invalid("prepare", &lsn.to_string()));
        }
        state.active_txn(txn)?.prepared_lsn = Some(lsn);
        Ok(())
    }

    fn commit(&self, txn: NativeTxn) -> EngineResult<()> {
        let mut state = self.state.lock();
        let active = state.take_txn(&txn)?;
        let lsn = match active.prepared_lsn {
            Some(lsn) => lsn,
            None if state.settings.commit_lsn => return Err(EngineError::NotPrepared(active.id)),
            None => state.lsn + 1,
        };
        for (table, key, value) in active.writes {
            let table = state.table_mut(table)?;
            table.rows.insert(key, value);
            table.lsn = table.lsn.max(lsn);
        }
        state.lsn = state.lsn.max(lsn);
        Ok(())
    }

    fn rollback(&self, txn: NativeTxn) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.take_txn(&txn)?;
        Ok(())
    }

    fn recover_set(
        &self,
        table: TableId,
        key: &[u8],
        value: &[u8],
        lsn: i64,
    ) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        let entry = state.table_mut(table)?;
        if lsn <= entry.lsn {
            debug!(table = %table, lsn, durable = entry.lsn, "skipping replayed write");
            return Ok(());
        }
        entry.rows.insert(key.to_vec(), value.to_vec());
        entry.lsn = lsn;
        state.lsn = state.lsn.max(lsn);
        Ok(())
    }

    fn get(&self, table: TableId, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        let mut state = self.state.lock();
        Ok(state.table_mut(table)?.rows.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_engine() -> MemoryEngine {
        let engine = MemoryEngine::new();
        engine.ctl_set(keys::LOG_COMMIT_LSN, "1").unwrap();
        engine.open().unwrap();
        engine
    }

    #[test]
    fn two_phase_open() {
        let engine = MemoryEngine::new();
        engine.ctl_set(keys::LOG_TWO_PHASE_RECOVER, "1").unwrap();
        engine.open().unwrap();
        assert_eq!(engine.open_state(), OpenState::Recovering);
        engine.open().unwrap();
        assert_eq!(engine.open_state(), OpenState::Online);
        assert!(matches!(engine.open(), Err(EngineError::AlreadyOpen)));
    }

    #[test]
    fn config_is_read_only_after_open() {
        let engine = open_engine();
        let result = engine.ctl_set(keys::SCHEDULER_THREADS, "8");
        assert!(matches!(result, Err(EngineError::ReadOnly(_))));
    }

    #[test]
    fn rejects_malformed_values() {
        let engine = MemoryEngine::new();
        assert!(matches!(
            engine.ctl_set(keys::LOG_ENABLE, "yes"),
            Err(EngineError::InvalidValue { .. })
        ));
        assert!(matches!(
            engine.ctl_set(keys::MEMORY_LIMIT, "-1"),
            Err(EngineError::InvalidValue { .. })
        ));
        assert!(matches!(
            engine.ctl_set("no.such.key", "1"),
            Err(EngineError::UnknownKey(_))
        ));
    }

    #[test]
    fn missing_root_without_autocreate_fails() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("missing");
        let engine = MemoryEngine::new();
        engine.ctl_set(keys::PATH, root.to_str().unwrap()).unwrap();
        engine.ctl_set(keys::PATH_CREATE, "0").unwrap();
        assert!(engine.open().is_err());
        assert!(!root.exists());
    }

    #[test]
    fn second_environment_on_same_root_is_locked() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_str().unwrap();

        let first = MemoryEngine::new();
        first.ctl_set(keys::PATH, root).unwrap();
        first.open().unwrap();

        let second = MemoryEngine::new();
        second.ctl_set(keys::PATH, root).unwrap();
        assert!(second.open().is_err());

        drop(first);
        let third = MemoryEngine::new();
        third.ctl_set(keys::PATH, root).unwrap();
        third.open().unwrap();
    }

    #[test]
    fn table_directory_created() {
        let dir = tempdir().unwrap();
        let engine = MemoryEngine::new();
        engine
            .ctl_set(keys::PATH, dir.path().to_str().unwrap())
            .unwrap();
        engine.open().unwrap();
        engine.create_table("512").unwrap();
        assert!(dir.path().join("512").join(TABLE_FILE).exists());
    }

    #[test]
    fn create_table_twice_opens_existing() {
        let engine = open_engine();
        let a = engine.create_table("1").unwrap();
        let b = engine.create_table("1").unwrap();
        assert_eq!(a, b);
        assert_eq!(engine.table_count(), 1);
    }

    #[test]
    fn single_write_transaction() {
        let engine = open_engine();
        let txn = engine.begin().unwrap();
        assert!(matches!(engine.begin(), Err(EngineError::TransactionActive)));
        engine.rollback(txn).unwrap();
        assert!(!engine.has_active_transaction());
    }

    #[test]
    fn commit_at_prepared_lsn() {
        let engine = open_engine();
        let table = engine.create_table("1").unwrap();
        let txn = engine.begin().unwrap();
        engine.set(&txn, table, b"k", b"v").unwrap();
        engine.prepare(&txn, 42).unwrap();
        engine.commit(txn).unwrap();
        assert_eq!(engine.lsn(), 42);
        assert_eq!(engine.get(table, b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn commit_without_prepare_fails_and_destroys_txn() {
        let engine = open_engine();
        let txn = engine.begin().unwrap();
        assert!(matches!(engine.commit(txn), Err(EngineError::NotPrepared(_))));
        assert!(!engine.has_active_transaction());
    }

    #[test]
    fn rollback_discards_writes() {
        let engine = open_engine();
        let table = engine.create_table("1").unwrap();
        let txn = engine.begin().unwrap();
        engine.set(&txn, table, b"k", b"v").unwrap();
        engine.rollback(txn).unwrap();
        assert_eq!(engine.get(table, b"k").unwrap(), None);
    }

    #[test]
    fn stale_transaction_handle_rejected() {
        let engine = open_engine();
        let txn = engine.begin().unwrap();
        let forged = NativeTxn::from_raw(txn.id() + 1);
        assert!(matches!(
            engine.rollback(forged),
            Err(EngineError::UnknownTransaction(_))
        ));
        assert!(engine.has_active_transaction());
        engine.rollback(txn).unwrap();
    }

    #[test]
    fn recover_set_skips_durable_writes() {
        let engine = open_engine();
        let table = engine.create_table("1").unwrap();
        engine.recover_set(table, b"k", b"new", 10).unwrap();
        engine.recover_set(table, b"k", b"old", 5).unwrap();
        assert_eq!(engine.get(table, b"k").unwrap(), Some(b"new".to_vec()));
        assert_eq!(engine.lsn(), 10);
    }

    #[test]
    fn snapshot_markers() {
        let engine = open_engine();
        engine.ctl_set(keys::SNAPSHOT, "7").unwrap();
        assert_eq!(engine.ctl_get("snapshot.7").unwrap(), Some("7".into()));
        assert_eq!(engine.ctl_get("snapshot.7.lsn").unwrap(), Some("0".into()));
        assert_eq!(engine.ctl_get("snapshot.8").unwrap(), None);

        engine.ctl_set("snapshot.7.lsn", "99").unwrap();
        assert_eq!(engine.ctl_get("snapshot.7.lsn").unwrap(), Some("99".into()));

        assert!(engine.ctl_delete("snapshot.7").unwrap());
        assert!(!engine.ctl_delete("snapshot.7").unwrap());
    }

    #[test]
    fn checkpoint_completes_after_latency() {
        let engine = MemoryEngine::new().with_checkpoint_latency(3);
        engine.ctl_set(keys::LOG_COMMIT_LSN, "1").unwrap();
        engine.open().unwrap();
        let table = engine.create_table("1").unwrap();
        let txn = engine.begin().unwrap();
        engine.set(&txn, table, b"k", b"v").unwrap();
        engine.prepare(&txn, 100).unwrap();
        engine.commit(txn).unwrap();

        engine.ctl_command(keys::SCHEDULER_CHECKPOINT).unwrap();
        let read = || engine.ctl_get(keys::CHECKPOINT_LSN_LAST).unwrap().unwrap();
        assert_eq!(read(), "0");
        assert_eq!(read(), "0");
        assert_eq!(read(), "100");
        assert_eq!(engine.pending_checkpoint(), None);
    }

    #[test]
    fn cursor_lists_control_namespace() {
        let engine = open_engine();
        engine.ctl_set(keys::SNAPSHOT, "3").unwrap();
        let entries: Vec<(String, String)> = engine.ctl_cursor().unwrap().collect();
        assert!(entries.iter().any(|(k, v)| k == "log.commit_lsn" && v == "1"));
        assert!(entries.iter().any(|(k, _)| k == "snapshot.3"));
        assert!(entries.iter().any(|(k, _)| k == "snapshot.3.lsn"));
        assert!(entries.iter().any(|(k, _)| k == keys::CHECKPOINT_LSN_LAST));
    }

    #[test]
    fn operations_require_open_environment() {
        let engine = MemoryEngine::new();
        assert!(matches!(engine.begin(), Err(EngineError::NotOpen)));
        assert!(matches!(
            engine.ctl_command(keys::SCHEDULER_CHECKPOINT),
            Err(EngineError::NotOpen)
        ));
        assert!(matches!(engine.create_table("1"), Err(EngineError::NotOpen)));
    }
}
