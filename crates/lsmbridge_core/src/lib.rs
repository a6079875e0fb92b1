//! # lsmbridge core
//!
//! Storage-engine adapter that plugs an LSM key-value engine into a
//! transactional host database.
//!
//! This crate provides:
//! - [`EngineHandle`]: engine configuration, the native transaction slot
//!   and the [`StorageEngine`] operations the host drives
//! - Index adapter: validation, creation and drop of per-space indexes
//! - Transaction lifecycle bridge: host statements onto one native
//!   transaction per host transaction
//! - Recovery state machine: snapshot recovery, log replay, online
//! - Checkpoint coordinator: asynchronous snapshots, readiness polling and
//!   retirement of superseded checkpoints
//!
//! ## Example
//!
//! ```rust
//! use lsmbridge_core::{
//!     CommitSignature, EngineConfig, EngineHandle, FieldType, HostTxn, KeyDef, SpaceId,
//!     StorageEngine, Tuple,
//! };
//! use std::sync::Arc;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let handle = EngineHandle::init(EngineConfig::new().path(dir.path())).unwrap();
//! handle.end_recovery().unwrap();
//!
//! let mut space = handle.open_space(SpaceId::new(512));
//! let key_def = KeyDef::primary(space.id(), FieldType::Num);
//! handle.keydef_check(&key_def).unwrap();
//! space.add_index(handle.create_index(key_def).unwrap()).unwrap();
//!
//! let mut txn = HostTxn::new();
//! txn.begin_statement();
//! handle.begin(&txn, &space).unwrap();
//! handle
//!     .replace(&space, &mut txn, Arc::new(Tuple::new(vec![1u64.into(), "one".into()])))
//!     .unwrap();
//! txn.set_signature(CommitSignature::new(1));
//! handle.commit(&mut txn).unwrap();
//!
//! assert!(handle.get(&space, &1u64.into()).unwrap().is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod checkpoint;
mod config;
mod dir;
mod engine;
mod error;
mod handle;
pub mod index;
mod recovery;
mod space;
mod transaction;
mod tuple;
mod types;

pub use checkpoint::{CheckpointCoordinator, CheckpointStatus, WaitOptions};
pub use config::EngineConfig;
pub use engine::StorageEngine;
pub use error::{CoreError, CoreResult};
pub use handle::EngineHandle;
pub use index::{FieldType, Index, IndexType, KeyDef, KeyPart};
pub use recovery::{RecoverStep, RecoveryPhase, ReplaceMode, SpaceRecovery};
pub use space::Space;
pub use transaction::{HostTxn, TransactionBridge, TxnStatement};
pub use tuple::{FieldValue, Tuple};
pub use types::{CommitSignature, IndexId, Lsn, SpaceId};
