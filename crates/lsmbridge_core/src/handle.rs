//! Engine handle.

use crate::checkpoint::{CheckpointCoordinator, CheckpointStatus, WaitOptions};
use crate::config::EngineConfig;
use crate::engine::StorageEngine;
use crate::error::{fatal, CoreError, CoreResult};
use crate::index::{self, Index, KeyDef};
use crate::recovery::SpaceRecovery;
use crate::space::Space;
use crate::transaction::{HostTxn, TransactionBridge};
use crate::tuple::{FieldValue, Tuple};
use crate::types::{Lsn, SpaceId};
use lsmbridge_native::{keys, MemoryEngine, NativeEngine};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Process-wide connection to the LSM engine.
///
/// Owns the native environment, the single native transaction slot, the
/// checkpoint state and the recovery state new spaces start from. Dropping
/// the handle closes the environment.
///
/// # Example
///
/// ```rust,no_run
/// use lsmbridge_core::{EngineConfig, EngineHandle, StorageEngine};
///
/// let handle = EngineHandle::init(EngineConfig::new().path("/var/lib/db/lsm"))?;
/// handle.begin_recover_snapshot(lsmbridge_core::Lsn::new(0))?;
/// handle.end_recover_snapshot();
/// handle.end_recovery()?;
/// # Ok::<(), lsmbridge_core::CoreError>(())
/// ```
pub struct EngineHandle {
    env: Arc<dyn NativeEngine>,
    config: EngineConfig,
    bridge: TransactionBridge,
    checkpoints: CheckpointCoordinator,
    recovery: Mutex<SpaceRecovery>,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("config", &self.config)
            .field("bridge", &self.bridge)
            .field("checkpoints", &self.checkpoints)
            .field("recovery", &self.recovery)
            .finish_non_exhaustive()
    }
}

impl EngineHandle {
    /// Backend name reported to the host.
    pub const NAME: &'static str = "lsm";

    /// Initializes the engine with the in-process [`MemoryEngine`].
    ///
    /// # Errors
    ///
    /// See [`EngineHandle::init_with`].
    pub fn init(config: EngineConfig) -> CoreResult<Self> {
        Self::init_with(config, |_| {
            let env: Arc<dyn NativeEngine> = Arc::new(MemoryEngine::new());
            Some(env)
        })
    }

    /// Initializes the engine with an environment built by `create_env`.
    ///
    /// The configuration is applied to the environment, which is then
    /// opened in recovery mode. Recovery must be completed with
    /// [`StorageEngine::end_recovery`] before live writes are accepted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration is rejected, or the
    /// engine error if an option cannot be applied or open fails.
    ///
    /// # Panics
    ///
    /// Panics if `create_env` cannot allocate an environment.
    pub fn init_with<F>(config: EngineConfig, create_env: F) -> CoreResult<Self>
    where
        F: FnOnce(&EngineConfig) -> Option<Arc<dyn NativeEngine>>,
    {
        config.validate()?;
        let Some(env) = create_env(&config) else {
            fatal("failed to create engine environment");
        };

        for (key, value) in config.control_options() {
            env.ctl_set(key, &value)?;
        }
        env.open()?;

        info!(
            path = %config.path.display(),
            threads = config.threads,
            "storage engine initialized"
        );

        Ok(Self {
            env,
            checkpoints: CheckpointCoordinator::new(config.poll_interval),
            config,
            bridge: TransactionBridge::new(),
            recovery: Mutex::new(SpaceRecovery::initial()),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the native environment.
    #[must_use]
    pub fn env(&self) -> &Arc<dyn NativeEngine> {
        &self.env
    }

    /// Returns the checkpoint coordinator.
    #[must_use]
    pub fn checkpoints(&self) -> &CheckpointCoordinator {
        &self.checkpoints
    }

    /// Returns the recovery state new spaces start from.
    #[must_use]
    pub fn default_recovery(&self) -> SpaceRecovery {
        *self.recovery.lock()
    }

    /// Returns true while a native transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.bridge.is_active()
    }

    /// Waits for the requested checkpoint with a deadline or cancellation.
    ///
    /// # Errors
    ///
    /// See [`CheckpointCoordinator::wait`].
    pub async fn wait_checkpoint_with(&self, options: WaitOptions) -> CoreResult<()> {
        self.checkpoints.wait(self.env.as_ref(), options).await
    }

    /// Calls `f` with every entry of the engine control namespace.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the namespace cannot be enumerated.
    pub fn for_each_entry<F>(&self, mut f: F) -> CoreResult<()>
    where
        F: FnMut(&str, &str),
    {
        for (key, value) in self.env.ctl_cursor()? {
            f(&key, &value);
        }
        Ok(())
    }

    /// Reads the committed tuple stored under `key` in `space`.
    ///
    /// # Errors
    ///
    /// Returns `NoPrimaryIndex`, `TupleKey`, or an engine or decoding error.
    pub fn get(&self, space: &Space, key: &FieldValue) -> CoreResult<Option<Tuple>> {
        space
            .primary()
            .ok_or(CoreError::NoPrimaryIndex {
                space_id: space.id(),
            })?
            .get(self.env.as_ref(), key)
    }
}

impl StorageEngine for EngineHandle {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn is_transactional(&self) -> bool {
        true
    }

    fn open_space(&self, space_id: SpaceId) -> Space {
        Space::new(space_id, self.default_recovery())
    }

    fn keydef_check(&self, key_def: &KeyDef) -> CoreResult<()> {
        index::validate(key_def)
    }

    fn create_index(&self, key_def: KeyDef) -> CoreResult<Index> {
        index::create(self.env.as_ref(), key_def)
    }

    fn drop_index(&self, index: Index) -> CoreResult<()> {
        index::drop_index(self.env.as_ref(), &self.config.path, index)
    }

    fn begin(&self, txn: &HostTxn, space: &Space) -> CoreResult<()> {
        self.bridge.begin(self.env.as_ref(), txn, space)
    }

    fn replace(&self, space: &Space, txn: &mut HostTxn, tuple: Arc<Tuple>) -> CoreResult<()> {
        self.bridge.replace(self.env.as_ref(), space, txn, tuple)
    }

    fn commit(&self, txn: &mut HostTxn) -> CoreResult<()> {
        self.bridge.commit(self.env.as_ref(), txn)
    }

    fn rollback(&self, txn: &mut HostTxn) {
        self.bridge.rollback(self.env.as_ref(), txn);
    }

    fn begin_recover_snapshot(&self, lsn: Lsn) -> CoreResult<()> {
        if !lsn.is_some() {
            return Err(CoreError::InvalidLsn(lsn));
        }
        // The recovered snapshot LSN is at or above the last engine LSN.
        let value = lsn.to_string();
        self.env.ctl_set(keys::SNAPSHOT, &value)?;
        self.env.ctl_set(&keys::snapshot_lsn(lsn.as_i64()), &value)?;

        let mut recovery = self.recovery.lock();
        *recovery = recovery.with_snapshot_handlers();
        info!(%lsn, "snapshot recovery started");
        Ok(())
    }

    fn end_recover_snapshot(&self) {
        let mut recovery = self.recovery.lock();
        *recovery = recovery.with_snapshot_handlers();
        debug!("snapshot recovery finished");
    }

    fn end_recovery(&self) -> CoreResult<()> {
        self.env.open()?;
        *self.recovery.lock() = SpaceRecovery::online();
        info!("recovery complete, engine online");
        Ok(())
    }

    fn begin_checkpoint(&self, lsn: Lsn) -> CoreResult<CheckpointStatus> {
        self.checkpoints.begin(self.env.as_ref(), lsn)
    }

    fn wait_checkpoint(&self) -> impl Future<Output = CoreResult<()>> + Send {
        self.wait_checkpoint_with(WaitOptions::new())
    }

    fn commit_checkpoint(&self) -> CoreResult<()> {
        self.checkpoints.commit(self.env.as_ref())
    }

    fn abort_checkpoint(&self) -> CoreResult<()> {
        self.checkpoints.abort(self.env.as_ref())
    }
}
