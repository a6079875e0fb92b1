//! Key definitions.

use crate::tuple::FieldValue;
use crate::types::{IndexId, SpaceId};

/// Index structure requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// Ordered tree.
    Tree,
    /// Hash table.
    Hash,
    /// Bitset.
    Bitset,
    /// R-tree.
    Rtree,
}

/// Declared type of a key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Unsigned number.
    Num,
    /// 64-bit number.
    Num64,
    /// String.
    Str,
    /// Array.
    Array,
    /// Any type.
    Any,
}

/// One part of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPart {
    /// Tuple field the part is taken from.
    pub fieldno: u32,
    /// Declared type of the field.
    pub field_type: FieldType,
}

impl KeyPart {
    /// Encodes a field value as engine key bytes.
    ///
    /// Numbers are big-endian so byte order matches numeric order. Returns
    /// `None` if the value does not match the declared type.
    #[must_use]
    pub fn encode(&self, value: &FieldValue) -> Option<Vec<u8>> {
        match (self.field_type, value) {
            (FieldType::Num | FieldType::Num64, FieldValue::Num(n)) => {
                Some(n.to_be_bytes().to_vec())
            }
            (FieldType::Str, FieldValue::Str(s)) => Some(s.as_bytes().to_vec()),
            _ => None,
        }
    }
}

/// Definition of an index, as handed over by the host.
///
/// Immutable once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDef {
    /// Space the index belongs to.
    pub space_id: SpaceId,
    /// Index identifier (0 = primary).
    pub index_id: IndexId,
    /// Requested index structure.
    pub index_type: IndexType,
    /// Whether the index enforces uniqueness.
    pub is_unique: bool,
    /// Key parts.
    pub parts: Vec<KeyPart>,
}

impl KeyDef {
    /// Creates a non-unique key definition without parts.
    pub fn new(space_id: SpaceId, index_id: IndexId, index_type: IndexType) -> Self {
        Self {
            space_id,
            index_id,
            index_type,
            is_unique: false,
            parts: Vec::new(),
        }
    }

    /// Unique tree primary key on field 0.
    pub fn primary(space_id: SpaceId, field_type: FieldType) -> Self {
        Self::new(space_id, IndexId::PRIMARY, IndexType::Tree)
            .unique(true)
            .part(0, field_type)
    }

    /// Sets uniqueness.
    #[must_use]
    pub fn unique(mut self, value: bool) -> Self {
        self.is_unique = value;
        self
    }

    /// Appends a key part.
    #[must_use]
    pub fn part(mut self, fieldno: u32, field_type: FieldType) -> Self {
        self.parts.push(KeyPart {
            fieldno,
            field_type,
        });
        self
    }
}
