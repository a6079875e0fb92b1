//! # lsmbridge native
//!
//! Interface to the wrapped LSM key-value engine.
//!
//! The adapter in `lsmbridge_core` never looks inside the engine. Everything
//! it needs goes through [`NativeEngine`]: a key/value **control namespace**
//! (configuration, snapshot markers, scheduler commands), a two-phase
//! `open`, a single write transaction, and table create/destroy.
//!
//! ## Available Engines
//!
//! - [`MemoryEngine`] - In-process reference engine with asynchronous
//!   checkpoint simulation, used by tests and embedders without a real engine
//!
//! ## Example
//!
//! ```rust
//! use lsmbridge_native::{MemoryEngine, NativeEngine};
//!
//! let engine = MemoryEngine::new();
//! engine.ctl_set("log.two_phase_recover", "0").unwrap();
//! engine.open().unwrap();
//!
//! let table = engine.create_table("512").unwrap();
//! let txn = engine.begin().unwrap();
//! engine.set(&txn, table, b"key", b"value").unwrap();
//! engine.prepare(&txn, 1).unwrap();
//! engine.commit(txn).unwrap();
//!
//! assert_eq!(engine.get(table, b"key").unwrap(), Some(b"value".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod memory;

pub use engine::{keys, ControlCursor, NativeEngine, NativeTxn, TableId};
pub use error::{EngineError, EngineResult};
pub use memory::{MemoryEngine, OpenState};
