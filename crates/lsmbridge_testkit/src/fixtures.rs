//! Test fixtures and engine helpers.
//!
//! Provides engines rooted in temporary directories and ready-made spaces
//! for common test scenarios.

use crate::faulty::FaultyEngine;
use lsmbridge_core::{
    CommitSignature, CoreResult, EngineConfig, EngineHandle, FieldType, HostTxn, KeyDef, Space,
    SpaceId, StorageEngine, Tuple,
};
use lsmbridge_native::{MemoryEngine, NativeEngine};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Poll interval used by test engines.
pub const TEST_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Returns a configuration rooted at `path` with a fast poll interval.
pub fn test_config(path: &Path) -> EngineConfig {
    EngineConfig::new()
        .path(path)
        .poll_interval(TEST_POLL_INTERVAL)
}

/// An engine handle over a [`MemoryEngine`] rooted in a temporary
/// directory.
pub struct TestEngine {
    /// The handle under test.
    pub handle: EngineHandle,
    /// The engine behind the handle, for inspection.
    pub memory: Arc<MemoryEngine>,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestEngine {
    /// Creates an engine still in recovery mode.
    pub fn recovering() -> Self {
        Self::build(0, |memory| memory)
    }

    /// Creates an engine that has completed recovery.
    pub fn online() -> Self {
        Self::online_with_latency(0)
    }

    /// Creates an online engine whose checkpoints complete after `polls`
    /// readiness polls.
    pub fn online_with_latency(polls: u32) -> Self {
        let engine = Self::build(polls, |memory| memory);
        engine
            .handle
            .end_recovery()
            .expect("Failed to complete recovery");
        engine
    }

    /// Creates an engine still in recovery mode whose environment is
    /// wrapped by `wrap`.
    pub fn wrapped<F>(wrap: F) -> Self
    where
        F: FnOnce(Arc<dyn NativeEngine>) -> Arc<dyn NativeEngine>,
    {
        Self::build(0, wrap)
    }

    /// Creates an engine still in recovery mode behind a [`FaultyEngine`],
    /// returned alongside so faults can be armed.
    pub fn faulty() -> (Self, Arc<FaultyEngine>) {
        let mut faulty = None;
        let engine = Self::wrapped(|inner| {
            let wrapper = Arc::new(FaultyEngine::new(inner));
            faulty = Some(Arc::clone(&wrapper));
            let env: Arc<dyn NativeEngine> = wrapper;
            env
        });
        let faulty = faulty.expect("wrapper was not installed");
        (engine, faulty)
    }

    fn build<F>(polls: u32, wrap: F) -> Self
    where
        F: FnOnce(Arc<dyn NativeEngine>) -> Arc<dyn NativeEngine>,
    {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let memory = Arc::new(MemoryEngine::new().with_checkpoint_latency(polls));
        let env: Arc<dyn NativeEngine> = memory.clone();
        let env = wrap(env);
        let handle = EngineHandle::init_with(test_config(temp_dir.path()), move |_| Some(env))
            .expect("Failed to initialize engine");
        Self {
            handle,
            memory,
            temp_dir,
        }
    }

    /// Returns the engine root directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Opens a space with a primary index over field 0.
    pub fn space(&self, id: u32, field_type: FieldType) -> Space {
        let mut space = self.handle.open_space(SpaceId::new(id));
        let key_def = KeyDef::primary(space.id(), field_type);
        self.handle
            .keydef_check(&key_def)
            .expect("Invalid key definition");
        let index = self
            .handle
            .create_index(key_def)
            .expect("Failed to create index");
        space.add_index(index).expect("Failed to attach index");
        space
    }
}

impl std::ops::Deref for TestEngine {
    type Target = EngineHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

/// Builds a two-field row `(id, name)`.
pub fn row(id: u64, name: &str) -> Arc<Tuple> {
    Arc::new(Tuple::new(vec![id.into(), name.into()]))
}

/// Runs a single-statement host transaction writing `tuple` and commits it
/// at `signature`.
pub fn commit_row(
    handle: &EngineHandle,
    space: &Space,
    tuple: Arc<Tuple>,
    signature: i64,
) -> CoreResult<()> {
    let mut txn = HostTxn::new();
    txn.begin_statement();
    handle.begin(&txn, space)?;
    if let Err(e) = handle.replace(space, &mut txn, tuple) {
        handle.rollback(&mut txn);
        return Err(e);
    }
    txn.set_signature(CommitSignature::new(signature));
    handle.commit(&mut txn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsmbridge_native::OpenState;

    #[test]
    fn online_engine_accepts_writes() {
        let engine = TestEngine::online();
        assert_eq!(engine.memory.open_state(), OpenState::Online);

        let space = engine.space(512, FieldType::Num);
        commit_row(&engine, &space, row(1, "a"), 1).unwrap();
        assert!(engine.get(&space, &1u64.into()).unwrap().is_some());
        assert!(engine.root().join("512").is_dir());
    }

    #[test]
    fn recovering_engine_stays_in_first_phase() {
        let engine = TestEngine::recovering();
        assert_eq!(engine.memory.open_state(), OpenState::Recovering);
    }
}
