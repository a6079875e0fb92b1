//! Per-space handler.

use crate::error::{CoreError, CoreResult};
use crate::index::Index;
use crate::recovery::{ReplaceMode, SpaceRecovery};
use crate::types::SpaceId;
use tracing::debug;

/// A host space as seen by this backend: its recovery state and its
/// primary index.
#[derive(Debug)]
pub struct Space {
    id: SpaceId,
    recovery: SpaceRecovery,
    primary: Option<Index>,
}

impl Space {
    /// Creates a space handler starting from `recovery`.
    #[must_use]
    pub fn new(id: SpaceId, recovery: SpaceRecovery) -> Self {
        Self {
            id,
            recovery,
            primary: None,
        }
    }

    /// Returns the space id.
    #[must_use]
    pub fn id(&self) -> SpaceId {
        self.id
    }

    /// Returns the recovery state.
    #[must_use]
    pub fn recovery(&self) -> SpaceRecovery {
        self.recovery
    }

    /// Returns how writes to this space reach the engine.
    #[must_use]
    pub fn replace_mode(&self) -> ReplaceMode {
        self.recovery.replace
    }

    /// Performs the next recovery step.
    pub fn recover(&mut self) {
        let next = self.recovery.recover();
        if next != self.recovery {
            debug!(
                space_id = %self.id,
                from = ?self.recovery.phase,
                to = ?next.phase,
                step = ?next.step,
                "space recovery step"
            );
        }
        self.recovery = next;
    }

    /// Attaches the primary index.
    ///
    /// # Errors
    ///
    /// Returns `ModifyIndex` if the index belongs to another space or the
    /// space already has a primary index.
    pub fn add_index(&mut self, index: Index) -> CoreResult<()> {
        let key_def = index.key_def();
        if key_def.space_id != self.id {
            return Err(CoreError::modify_index(
                key_def.index_id,
                self.id,
                format!("index belongs to space {}", key_def.space_id),
            ));
        }
        if self.primary.is_some() {
            return Err(CoreError::modify_index(
                key_def.index_id,
                self.id,
                "space already has a primary index",
            ));
        }
        self.primary = Some(index);
        Ok(())
    }

    /// Returns the primary index, if attached.
    #[must_use]
    pub fn primary(&self) -> Option<&Index> {
        self.primary.as_ref()
    }

    /// Detaches the primary index.
    pub fn take_primary(&mut self) -> Option<Index> {
        self.primary.take()
    }

    /// Returns the bound primary index.
    ///
    /// # Errors
    ///
    /// Returns `NoPrimaryIndex` if there is none or it has no native table.
    pub(crate) fn bound_primary(&self) -> CoreResult<&Index> {
        self.primary
            .as_ref()
            .filter(|index| index.table().is_some())
            .ok_or(CoreError::NoPrimaryIndex { space_id: self.id })
    }
}
