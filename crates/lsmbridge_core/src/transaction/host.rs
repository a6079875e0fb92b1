//! Host-side transaction state.

use crate::tuple::Tuple;
use crate::types::CommitSignature;
use std::sync::Arc;

/// One statement of a host transaction.
#[derive(Debug, Default)]
pub struct TxnStatement {
    new_tuple: Option<Arc<Tuple>>,
    /// Extra reference held by this backend until the transaction ends.
    pinned: Option<Arc<Tuple>>,
}

impl TxnStatement {
    /// Returns the tuple written by this statement.
    #[must_use]
    pub fn new_tuple(&self) -> Option<&Arc<Tuple>> {
        self.new_tuple.as_ref()
    }

    /// Returns true while the backend holds a reference to the new tuple.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    pub(crate) fn set_new_tuple(&mut self, tuple: Arc<Tuple>) {
        self.new_tuple = Some(tuple);
    }

    pub(crate) fn pin(&mut self) {
        self.pinned = self.new_tuple.clone();
    }

    fn release(&mut self) {
        if let Some(pinned) = self.pinned.take() {
            // The statement must still hold the pinned tuple, so dropping
            // the pin never frees it.
            debug_assert!(
                self.new_tuple
                    .as_ref()
                    .is_some_and(|tuple| Arc::ptr_eq(tuple, &pinned))
                    && Arc::strong_count(&pinned) >= 2,
                "pinned tuple is no longer referenced by its statement"
            );
            drop(pinned);
        }
    }
}

/// A host transaction: its commit signature and its statements.
///
/// The host assigns the signature when it writes the transaction to its
/// log, before asking the engine to commit.
#[derive(Debug)]
pub struct HostTxn {
    signature: CommitSignature,
    stmts: Vec<TxnStatement>,
}

impl Default for HostTxn {
    fn default() -> Self {
        Self::new()
    }
}

impl HostTxn {
    /// Creates a transaction with no statements and no signature.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signature: CommitSignature::UNASSIGNED,
            stmts: Vec::new(),
        }
    }

    /// Creates a transaction already carrying a signature, as during log
    /// replay.
    #[must_use]
    pub fn with_signature(signature: CommitSignature) -> Self {
        Self {
            signature,
            stmts: Vec::new(),
        }
    }

    /// Returns the commit signature.
    #[must_use]
    pub fn signature(&self) -> CommitSignature {
        self.signature
    }

    /// Assigns the commit signature.
    pub fn set_signature(&mut self, signature: CommitSignature) {
        self.signature = signature;
    }

    /// Starts a new statement and returns it.
    pub fn begin_statement(&mut self) -> &mut TxnStatement {
        self.stmts.push(TxnStatement::default());
        let last = self.stmts.len() - 1;
        &mut self.stmts[last]
    }

    /// Returns the number of statements started so far.
    #[must_use]
    pub fn n_stmts(&self) -> usize {
        self.stmts.len()
    }

    /// Returns true while the transaction is on its first statement.
    #[must_use]
    pub fn is_first_statement(&self) -> bool {
        self.stmts.len() == 1
    }

    /// Returns the statements.
    #[must_use]
    pub fn statements(&self) -> &[TxnStatement] {
        &self.stmts
    }

    /// Returns the current statement, starting one if there is none.
    pub(crate) fn current_statement(&mut self) -> &mut TxnStatement {
        if self.stmts.is_empty() {
            return self.begin_statement();
        }
        let last = self.stmts.len() - 1;
        &mut self.stmts[last]
    }

    /// Drops every reference pinned by this backend.
    pub(crate) fn release_pins(&mut self) {
        for stmt in &mut self.stmts {
            stmt.release();
        }
    }
}
