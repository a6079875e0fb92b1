//! Transaction lifecycle bridge.

mod bridge;
mod host;

pub use bridge::TransactionBridge;
pub use host::{HostTxn, TxnStatement};
