//! Index adapter.
//!
//! Every space is backed by exactly one native table. The only index the
//! engine can serve is therefore a unique tree primary key over a single
//! NUM or STR field; everything else is rejected at definition time.

mod adapter;
mod key_def;

pub use adapter::{create, drop_index, validate, Index};
pub use key_def::{FieldType, IndexType, KeyDef, KeyPart};
