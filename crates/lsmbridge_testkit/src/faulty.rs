//! Failure injection for engine tests.
//!
//! [`FaultyEngine`] wraps any [`NativeEngine`] and makes selected calls fail
//! on demand, so error paths of the adapter can be driven without a broken
//! engine.
//!
//! ## Usage
//!
//! ```rust
//! use lsmbridge_native::{MemoryEngine, NativeEngine};
//! use lsmbridge_testkit::{FaultPoint, FaultyEngine};
//! use std::sync::Arc;
//!
//! let engine = FaultyEngine::new(Arc::new(MemoryEngine::new()));
//! engine.fail(FaultPoint::Open);
//! assert!(engine.open().is_err());
//! engine.heal(FaultPoint::Open);
//! assert!(engine.open().is_ok());
//! ```

use lsmbridge_native::{ControlCursor, EngineError, EngineResult, NativeEngine, NativeTxn, TableId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Engine calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// `ctl_set`.
    CtlSet,
    /// `ctl_command`.
    CtlCommand,
    /// `ctl_get`.
    CtlGet,
    /// `ctl_delete`.
    CtlDelete,
    /// `ctl_cursor`.
    CtlCursor,
    /// `open`.
    Open,
    /// `create_table`.
    CreateTable,
    /// `destroy_table`.
    DestroyTable,
    /// `begin`.
    Begin,
    /// `set`.
    Set,
    /// `prepare`.
    Prepare,
    /// `commit`. The transaction is still destroyed.
    Commit,
    /// `rollback`. The transaction is still destroyed.
    Rollback,
    /// `recover_set`.
    RecoverSet,
}

/// An engine wrapper that injects failures.
pub struct FaultyEngine {
    inner: Arc<dyn NativeEngine>,
    faults: Mutex<HashSet<FaultPoint>>,
    /// Control keys reported as missing by `ctl_get`.
    hidden: Mutex<HashSet<String>>,
    injected: AtomicUsize,
}

impl FaultyEngine {
    /// Wraps `inner` with no faults armed.
    pub fn new(inner: Arc<dyn NativeEngine>) -> Self {
        Self {
            inner,
            faults: Mutex::new(HashSet::new()),
            hidden: Mutex::new(HashSet::new()),
            injected: AtomicUsize::new(0),
        }
    }

    /// Makes every call at `point` fail until healed.
    pub fn fail(&self, point: FaultPoint) {
        self.faults.lock().insert(point);
    }

    /// Stops failing calls at `point`.
    pub fn heal(&self, point: FaultPoint) {
        self.faults.lock().remove(&point);
    }

    /// Makes `ctl_get` report `key` as missing.
    pub fn hide(&self, key: impl Into<String>) {
        self.hidden.lock().insert(key.into());
    }

    /// Clears all faults and hidden keys.
    pub fn reset(&self) {
        self.faults.lock().clear();
        self.hidden.lock().clear();
    }

    /// Returns how many failures have been injected.
    pub fn injected(&self) -> usize {
        self.injected.load(Ordering::SeqCst)
    }

    fn check(&self, point: FaultPoint) -> EngineResult<()> {
        if self.faults.lock().contains(&point) {
            self.injected.fetch_add(1, Ordering::SeqCst);
            return Err(EngineError::other(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

impl NativeEngine for FaultyEngine {
    fn ctl_set(&self, key: &str, value: &str) -> EngineResult<()> {
        self.check(FaultPoint::CtlSet)?;
        self.inner.ctl_set(key, value)
    }

    fn ctl_command(&self, key: &str) -> EngineResult<()> {
        self.check(FaultPoint::CtlCommand)?;
        self.inner.ctl_command(key)
    }

    fn ctl_get(&self, key: &str) -> EngineResult<Option<String>> {
        self.check(FaultPoint::CtlGet)?;
        if self.hidden.lock().contains(key) {
            return Ok(None);
        }
        self.inner.ctl_get(key)
    }

    fn ctl_delete(&self, key: &str) -> EngineResult<bool> {
        self.check(FaultPoint::CtlDelete)?;
        self.inner.ctl_delete(key)
    }

    fn ctl_cursor(&self) -> EngineResult<ControlCursor> {
        self.check(FaultPoint::CtlCursor)?;
        self.inner.ctl_cursor()
    }

    fn open(&self) -> EngineResult<()> {
        self.check(FaultPoint::Open)?;
        self.inner.open()
    }

    fn create_table(&self, name: &str) -> EngineResult<TableId> {
        self.check(FaultPoint::CreateTable)?;
        self.inner.create_table(name)
    }

    fn destroy_table(&self, table: TableId) -> EngineResult<()> {
        self.check(FaultPoint::DestroyTable)?;
        self.inner.destroy_table(table)
    }

    fn begin(&self) -> EngineResult<NativeTxn> {
        self.check(FaultPoint::Begin)?;
        self.inner.begin()
    }

    fn set(&self, txn: &NativeTxn, table: TableId, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.check(FaultPoint::Set)?;
        self.inner.set(txn, table, key, value)
    }

    fn prepare(&self, txn: &NativeTxn, lsn: i64) -> EngineResult<()> {
        self.check(FaultPoint::Prepare)?;
        self.inner.prepare(txn, lsn)
    }

    fn commit(&self, txn: NativeTxn) -> EngineResult<()> {
        if let Err(e) = self.check(FaultPoint::Commit) {
            let _ = self.inner.rollback(txn);
            return Err(e);
        }
        self.inner.commit(txn)
    }

    fn rollback(&self, txn: NativeTxn) -> EngineResult<()> {
        let result = self.inner.rollback(txn);
        self.check(FaultPoint::Rollback)?;
        result
    }

    fn recover_set(
        &self,
        table: TableId,
        key: &[u8],
        value: &[u8],
        lsn: i64,
    ) -> EngineResult<()> {
        self.check(FaultPoint::RecoverSet)?;
        self.inner.recover_set(table, key, value, lsn)
    }

    fn get(&self, table: TableId, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        self.inner.get(table, key)
    }
}
