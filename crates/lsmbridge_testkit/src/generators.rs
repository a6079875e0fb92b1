//! Property-based test generators using proptest.
//!
//! Provides strategies for key definitions, with and without a single known
//! defect, and for rows.

use lsmbridge_core::{FieldType, IndexId, IndexType, KeyDef, KeyPart, SpaceId, Tuple};
use proptest::prelude::*;

/// The one rule a generated key definition breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDefViolation {
    /// Index type other than tree.
    IndexType,
    /// Not unique.
    NotUnique,
    /// Secondary index.
    Secondary,
    /// Zero or several key parts.
    PartCount,
    /// Key field type other than NUM or STR.
    FieldType,
}

impl KeyDefViolation {
    /// The reason reported for this violation, or `None` for the index type
    /// violation, which has its own error variant.
    pub fn reason(self) -> Option<&'static str> {
        match self {
            Self::IndexType => None,
            Self::NotUnique => Some("index must be unique"),
            Self::Secondary => Some("secondary indexes are not supported"),
            Self::PartCount => Some("index key can not be multipart"),
            Self::FieldType => Some("index field type must be STR or NUM"),
        }
    }
}

/// Strategy for generating space IDs in the user range.
pub fn space_id_strategy() -> impl Strategy<Value = SpaceId> {
    (512u32..100_000).prop_map(SpaceId::new)
}

/// Strategy for the field types the engine can index.
pub fn supported_field_type_strategy() -> impl Strategy<Value = FieldType> {
    prop_oneof![Just(FieldType::Num), Just(FieldType::Str)]
}

/// Strategy for field types the engine cannot index.
pub fn unsupported_field_type_strategy() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::Num64),
        Just(FieldType::Array),
        Just(FieldType::Any),
    ]
}

/// Strategy for any field type.
pub fn field_type_strategy() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        supported_field_type_strategy(),
        unsupported_field_type_strategy(),
    ]
}

/// Strategy for any index type.
pub fn index_type_strategy() -> impl Strategy<Value = IndexType> {
    prop_oneof![
        Just(IndexType::Tree),
        Just(IndexType::Hash),
        Just(IndexType::Bitset),
        Just(IndexType::Rtree),
    ]
}

/// Strategy for key definitions the engine accepts.
pub fn valid_key_def_strategy() -> impl Strategy<Value = KeyDef> {
    (space_id_strategy(), supported_field_type_strategy())
        .prop_map(|(space_id, field_type)| KeyDef::primary(space_id, field_type))
}

/// Strategy for key definitions breaking exactly one rule, paired with the
/// rule broken.
pub fn invalid_key_def_strategy() -> impl Strategy<Value = (KeyDef, KeyDefViolation)> {
    let index_type = (
        valid_key_def_strategy(),
        prop_oneof![
            Just(IndexType::Hash),
            Just(IndexType::Bitset),
            Just(IndexType::Rtree),
        ],
    )
        .prop_map(|(mut def, index_type)| {
            def.index_type = index_type;
            (def, KeyDefViolation::IndexType)
        });

    let not_unique = valid_key_def_strategy()
        .prop_map(|def| (def.unique(false), KeyDefViolation::NotUnique));

    let secondary = (valid_key_def_strategy(), 1u32..16).prop_map(|(mut def, id)| {
        def.index_id = IndexId::new(id);
        (def, KeyDefViolation::Secondary)
    });

    let part_count = (
        valid_key_def_strategy(),
        prop::collection::vec((0u32..8, field_type_strategy()), 0..4)
            .prop_filter("must not be a single part", |parts| parts.len() != 1),
    )
        .prop_map(|(mut def, parts)| {
            def.parts = parts
                .into_iter()
                .map(|(fieldno, field_type)| KeyPart {
                    fieldno,
                    field_type,
                })
                .collect();
            (def, KeyDefViolation::PartCount)
        });

    let field_type = (space_id_strategy(), unsupported_field_type_strategy()).prop_map(
        |(space_id, field_type)| {
            (
                KeyDef::primary(space_id, field_type),
                KeyDefViolation::FieldType,
            )
        },
    );

    prop_oneof![index_type, not_unique, secondary, part_count, field_type]
}

/// Strategy for arbitrary key definitions.
pub fn any_key_def_strategy() -> impl Strategy<Value = KeyDef> {
    (
        space_id_strategy(),
        0u32..4,
        index_type_strategy(),
        any::<bool>(),
        prop::collection::vec((0u32..8, field_type_strategy()), 0..4),
    )
        .prop_map(|(space_id, index_id, index_type, unique, parts)| {
            let mut def = KeyDef::new(space_id, IndexId::new(index_id), index_type).unique(unique);
            for (fieldno, field_type) in parts {
                def = def.part(fieldno, field_type);
            }
            def
        })
}

/// Strategy for `(id, name)` rows.
pub fn row_strategy() -> impl Strategy<Value = Tuple> {
    (
        any::<u64>(),
        prop::string::string_regex("[a-z]{1,16}").expect("Invalid regex"),
    )
        .prop_map(|(id, name)| Tuple::new(vec![id.into(), name.into()]))
}
