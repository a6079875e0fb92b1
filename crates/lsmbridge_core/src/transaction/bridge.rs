//! Mapping of host transactions onto the native transaction.

use super::host::HostTxn;
use crate::error::{CoreError, CoreResult};
use crate::recovery::ReplaceMode;
use crate::space::Space;
use crate::tuple::Tuple;
use lsmbridge_native::{NativeEngine, NativeTxn};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Owns the single native transaction slot of an engine handle.
///
/// All statements of a host transaction share one native transaction. It
/// is started with the first statement and destroyed by `commit` or
/// `rollback` whatever their outcome.
#[derive(Debug, Default)]
pub struct TransactionBridge {
    slot: Mutex<Option<NativeTxn>>,
}

impl TransactionBridge {
    /// Creates a bridge with an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a native transaction is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Called at the start of every statement of `txn` against `space`.
    ///
    /// On the first statement a native transaction is started; on later
    /// statements the open one is reused.
    ///
    /// # Errors
    ///
    /// - `TransactionAlreadyOpen` if the first statement finds the slot taken
    /// - `NoPrimaryIndex` if the space has no bound primary index
    /// - `NoActiveTransaction` if a later statement finds the slot empty
    /// - the engine error if the native transaction cannot be started
    pub fn begin(&self, env: &dyn NativeEngine, txn: &HostTxn, space: &Space) -> CoreResult<()> {
        let mut slot = self.slot.lock();
        if !txn.is_first_statement() {
            return match *slot {
                Some(_) => Ok(()),
                None => Err(CoreError::NoActiveTransaction),
            };
        }
        if slot.is_some() {
            return Err(CoreError::TransactionAlreadyOpen);
        }
        space.bound_primary()?;
        let native = env.begin()?;
        debug!(space_id = %space.id(), native = native.id(), "native transaction started");
        *slot = Some(native);
        Ok(())
    }

    /// Writes `tuple` into `space` as part of `txn`'s current statement.
    ///
    /// Live spaces write into the open native transaction. Spaces still
    /// replaying the log write straight into the table at the transaction's
    /// signature; the engine skips writes it already has. Either way the
    /// statement keeps an extra reference to the tuple until the
    /// transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `NoPrimaryIndex`, `TupleKey`, `NoActiveTransaction` for a
    /// live write without a native transaction, `InvalidSignature` for a
    /// replayed write without a signature, or an engine error.
    pub fn replace(
        &self,
        env: &dyn NativeEngine,
        space: &Space,
        txn: &mut HostTxn,
        tuple: Arc<Tuple>,
    ) -> CoreResult<()> {
        let index = space.bound_primary()?;
        let table = index.table().ok_or(CoreError::NoPrimaryIndex {
            space_id: space.id(),
        })?;
        let key = index.key_of(&tuple)?;
        let value = tuple.encode()?;

        match space.replace_mode() {
            ReplaceMode::Live => {
                let slot = self.slot.lock();
                let native = slot.as_ref().ok_or(CoreError::NoActiveTransaction)?;
                env.set(native, table, &key, &value)?;
            }
            ReplaceMode::Recovery => {
                let signature = txn.signature().as_i64();
                if signature < 0 {
                    return Err(CoreError::InvalidSignature(signature));
                }
                env.recover_set(table, &key, &value, signature)?;
            }
        }

        let stmt = txn.current_statement();
        stmt.set_new_tuple(tuple);
        stmt.pin();
        Ok(())
    }

    /// Commits the native transaction at `txn`'s signature.
    ///
    /// The pinned tuples are released on every path, including when no
    /// native transaction is open. Otherwise the slot is cleared.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSignature` for a negative signature, or the engine
    /// error from prepare or commit. The native transaction is rolled back
    /// when prepare is not reached or fails.
    pub fn commit(&self, env: &dyn NativeEngine, txn: &mut HostTxn) -> CoreResult<()> {
        let Some(native) = self.slot.lock().take() else {
            txn.release_pins();
            return Ok(());
        };
        let signature = txn.signature().as_i64();
        let _release = ReleaseGuard(txn);

        if signature < 0 {
            rollback_quietly(env, native);
            return Err(CoreError::InvalidSignature(signature));
        }
        if let Err(e) = env.prepare(&native, signature) {
            rollback_quietly(env, native);
            return Err(e.into());
        }
        let id = native.id();
        env.commit(native)?;
        debug!(native = id, signature, "native transaction committed");
        Ok(())
    }

    /// Rolls back the native transaction, if one is open, and releases the
    /// pinned tuples.
    ///
    /// A failing native rollback is logged and otherwise ignored: the
    /// transaction is gone either way.
    pub fn rollback(&self, env: &dyn NativeEngine, txn: &mut HostTxn) {
        let Some(native) = self.slot.lock().take() else {
            txn.release_pins();
            return;
        };
        let _release = ReleaseGuard(txn);
        let id = native.id();
        rollback_quietly(env, native);
        debug!(native = id, "native transaction rolled back");
    }
}

fn rollback_quietly(env: &dyn NativeEngine, native: NativeTxn) {
    let id = native.id();
    if let Err(e) = env.rollback(native) {
        warn!(native = id, error = %e, "native rollback failed");
    }
}

/// Releases the pinned tuples of a host transaction when dropped.
struct ReleaseGuard<'a>(&'a mut HostTxn);

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        self.0.release_pins();
    }
}
