//! Core type definitions.

use std::fmt;

/// Log sequence number assigned by the host.
///
/// Checkpoints and recovery points are ordered by LSN. [`Lsn::NONE`] (-1)
/// marks "no checkpoint".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lsn(pub i64);

impl Lsn {
    /// Sentinel for "none".
    pub const NONE: Lsn = Lsn(-1);

    /// Creates an LSN.
    #[must_use]
    pub const fn new(lsn: i64) -> Self {
        Self(lsn)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Returns true unless this is [`Lsn::NONE`].
    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Commit signature of a host transaction: the sequence number under which
/// the host logged it. Used as the engine commit LSN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitSignature(pub i64);

impl CommitSignature {
    /// Signature of a transaction the host has not logged yet.
    pub const UNASSIGNED: CommitSignature = CommitSignature(-1);

    /// Creates a signature.
    #[must_use]
    pub const fn new(signature: i64) -> Self {
        Self(signature)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CommitSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sig:{}", self.0)
    }
}

/// Identifier of a host space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpaceId(pub u32);

impl SpaceId {
    /// Creates a space ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an index within a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexId(pub u32);

impl IndexId {
    /// The primary index.
    pub const PRIMARY: IndexId = IndexId(0);

    /// Creates an index ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns true for the primary index.
    #[must_use]
    pub const fn is_primary(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsn_none_is_not_some() {
        assert!(!Lsn::NONE.is_some());
        assert!(Lsn::new(0).is_some());
    }

    #[test]
    fn lsn_ordering() {
        assert!(Lsn::NONE < Lsn::new(0));
        assert!(Lsn::new(50) < Lsn::new(100));
    }

    #[test]
    fn primary_index() {
        assert!(IndexId::PRIMARY.is_primary());
        assert!(!IndexId::new(1).is_primary());
    }
}
