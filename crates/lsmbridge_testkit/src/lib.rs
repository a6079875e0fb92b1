//! # lsmbridge testkit
//!
//! Test utilities for lsmbridge.
//!
//! This crate provides:
//! - Engine fixtures rooted in temporary directories
//! - Property-based test generators using proptest
//! - A failure-injecting engine wrapper
//! - Log output for tests
//!
//! ## Usage
//!
//! ```rust
//! use lsmbridge_core::FieldType;
//! use lsmbridge_testkit::prelude::*;
//!
//! let engine = TestEngine::online();
//! let space = engine.space(512, FieldType::Num);
//! commit_row(&engine, &space, row(1, "one"), 1).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod fixtures;
pub mod generators;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faulty::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
}

pub use faulty::*;
pub use fixtures::*;
pub use generators::*;
pub use logging::*;
