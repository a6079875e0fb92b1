//! Index validation, creation and drop.

use super::key_def::{FieldType, IndexType, KeyDef};
use crate::dir;
use crate::error::{CoreError, CoreResult};
use crate::tuple::{FieldValue, Tuple};
use lsmbridge_native::{NativeEngine, TableId};
use std::path::Path;
use tracing::{debug, warn};

/// Checks that a key definition can be served by the engine.
///
/// The engine stores one ordered table per space, so only a unique tree
/// primary key over a single NUM or STR field is accepted. Checks run in a
/// fixed order and the first violation is reported.
///
/// # Errors
///
/// Returns `UnsupportedIndexType` for non-tree indexes and `ModifyIndex`
/// for every other violation.
pub fn validate(key_def: &KeyDef) -> CoreResult<()> {
    let reject = |reason: &str| {
        Err(CoreError::modify_index(
            key_def.index_id,
            key_def.space_id,
            reason,
        ))
    };

    if key_def.index_type != IndexType::Tree {
        return Err(CoreError::UnsupportedIndexType {
            index_id: key_def.index_id,
            space_id: key_def.space_id,
        });
    }
    if !key_def.is_unique {
        return reject("index must be unique");
    }
    if !key_def.index_id.is_primary() {
        return reject("secondary indexes are not supported");
    }
    if key_def.parts.len() != 1 {
        return reject("index key can not be multipart");
    }
    match key_def.parts[0].field_type {
        FieldType::Num | FieldType::Str => Ok(()),
        _ => reject("index field type must be STR or NUM"),
    }
}

/// Creates the index and binds it to the space's native table.
///
/// The table is named after the space id; an existing table is reopened.
///
/// # Errors
///
/// Returns `UnsupportedIndexType` for non-tree indexes, or the engine error
/// if the table cannot be created.
pub fn create(env: &dyn NativeEngine, key_def: KeyDef) -> CoreResult<Index> {
    if key_def.index_type != IndexType::Tree {
        return Err(CoreError::UnsupportedIndexType {
            index_id: key_def.index_id,
            space_id: key_def.space_id,
        });
    }
    let table = env.create_table(&key_def.space_id.to_string())?;
    debug!(space_id = %key_def.space_id, index_id = %key_def.index_id, %table, "index created");
    Ok(Index {
        key_def,
        table: Some(table),
    })
}

/// Drops the index: destroys its native table, then removes the space
/// directory under `root`.
///
/// The index is consumed whatever the outcome. Directory cleanup is best
/// effort; its failure is logged and does not fail the drop.
///
/// # Errors
///
/// Returns the engine error if the table cannot be destroyed.
pub fn drop_index(env: &dyn NativeEngine, root: &Path, mut index: Index) -> CoreResult<()> {
    let space_id = index.key_def.space_id;
    if let Some(table) = index.table.take() {
        env.destroy_table(table)?;
    }

    let path = dir::space_dir(root, space_id);
    match dir::remove_space_dir(&path) {
        Ok(removed) => {
            debug!(%space_id, removed, path = %path.display(), "space directory removed");
        }
        Err(e) => {
            warn!(
                %space_id,
                path = %path.display(),
                error = %e,
                "failed to remove space directory"
            );
        }
    }
    Ok(())
}

/// An index bound to a native table.
#[derive(Debug)]
pub struct Index {
    key_def: KeyDef,
    table: Option<TableId>,
}

impl Index {
    /// Returns the key definition.
    #[must_use]
    pub fn key_def(&self) -> &KeyDef {
        &self.key_def
    }

    /// Returns the native table, if bound.
    #[must_use]
    pub fn table(&self) -> Option<TableId> {
        self.table
    }

    /// Extracts the engine key of `tuple`.
    ///
    /// # Errors
    ///
    /// Returns `TupleKey` if the key field is missing or has the wrong type.
    pub fn key_of(&self, tuple: &Tuple) -> CoreResult<Vec<u8>> {
        let space_id = self.key_def.space_id;
        let part = self
            .key_def
            .parts
            .first()
            .ok_or_else(|| CoreError::tuple_key(space_id, "index has no key parts"))?;
        let value = tuple.field(part.fieldno).ok_or_else(|| {
            CoreError::tuple_key(space_id, format!("tuple has no field {}", part.fieldno))
        })?;
        self.encode_key(value)
    }

    /// Looks up the committed tuple stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `NoPrimaryIndex` if the index is not bound, `TupleKey` if the
    /// key has the wrong type, or an engine or decoding error.
    pub fn get(&self, env: &dyn NativeEngine, key: &FieldValue) -> CoreResult<Option<Tuple>> {
        let table = self.table.ok_or(CoreError::NoPrimaryIndex {
            space_id: self.key_def.space_id,
        })?;
        let key = self.encode_key(key)?;
        env.get(table, &key)?
            .map(|bytes| Tuple::decode(&bytes))
            .transpose()
    }

    fn encode_key(&self, value: &FieldValue) -> CoreResult<Vec<u8>> {
        let space_id = self.key_def.space_id;
        let part = self
            .key_def
            .parts
            .first()
            .ok_or_else(|| CoreError::tuple_key(space_id, "index has no key parts"))?;
        part.encode(value).ok_or_else(|| {
            CoreError::tuple_key(
                space_id,
                format!("key does not match field type {:?}", part.field_type),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IndexId, SpaceId};
    use lsmbridge_native::MemoryEngine;
    use tempfile::tempdir;

    const SPACE: SpaceId = SpaceId(512);

    fn reason(result: CoreResult<()>) -> String {
        match result {
            Err(CoreError::ModifyIndex { reason, .. }) => reason,
            other => panic!("expected ModifyIndex, got {other:?}"),
        }
    }

    fn open_engine(root: &Path) -> MemoryEngine {
        let engine = MemoryEngine::new();
        engine
            .ctl_set("engine.path", &root.display().to_string())
            .unwrap();
        engine.open().unwrap();
        engine
    }

    #[test]
    fn accepts_unique_tree_primary_num_or_str() {
        assert!(validate(&KeyDef::primary(SPACE, FieldType::Num)).is_ok());
        assert!(validate(&KeyDef::primary(SPACE, FieldType::Str)).is_ok());
    }

    #[test]
    fn rejects_non_tree_type() {
        let def = KeyDef::new(SPACE, IndexId::PRIMARY, IndexType::Hash)
            .unique(true)
            .part(0, FieldType::Num);
        assert!(matches!(
            validate(&def),
            Err(CoreError::UnsupportedIndexType { index_id, space_id })
                if index_id == IndexId::PRIMARY && space_id == SPACE
        ));
    }

    #[test]
    fn rejects_non_unique() {
        let def = KeyDef::primary(SPACE, FieldType::Num).unique(false);
        assert_eq!(reason(validate(&def)), "index must be unique");
    }

    #[test]
    fn rejects_secondary() {
        let def = KeyDef::new(SPACE, IndexId::new(1), IndexType::Tree)
            .unique(true)
            .part(1, FieldType::Num);
        assert_eq!(reason(validate(&def)), "secondary indexes are not supported");
    }

    #[test]
    fn rejects_multipart() {
        let def = KeyDef::primary(SPACE, FieldType::Num).part(1, FieldType::Str);
        assert_eq!(reason(validate(&def)), "index key can not be multipart");

        let empty = KeyDef::new(SPACE, IndexId::PRIMARY, IndexType::Tree).unique(true);
        assert_eq!(reason(validate(&empty)), "index key can not be multipart");
    }

    #[test]
    fn rejects_unsupported_field_type() {
        for field_type in [FieldType::Num64, FieldType::Array, FieldType::Any] {
            let def = KeyDef::primary(SPACE, field_type);
            assert_eq!(reason(validate(&def)), "index field type must be STR or NUM");
        }
    }

    #[test]
    fn first_violation_wins() {
        // Non-unique secondary multipart hash index: the type check runs first.
        let def = KeyDef::new(SPACE, IndexId::new(3), IndexType::Hash)
            .part(0, FieldType::Any)
            .part(1, FieldType::Any);
        assert!(matches!(
            validate(&def),
            Err(CoreError::UnsupportedIndexType { .. })
        ));

        let def = KeyDef::new(SPACE, IndexId::new(3), IndexType::Tree)
            .part(0, FieldType::Any)
            .part(1, FieldType::Any);
        assert_eq!(reason(validate(&def)), "index must be unique");
    }

    #[test]
    fn create_binds_table_named_after_space() {
        let root = tempdir().unwrap();
        let engine = open_engine(root.path());

        let index = create(&engine, KeyDef::primary(SPACE, FieldType::Num)).unwrap();
        assert!(index.table().is_some());
        assert!(root.path().join("512").is_dir());
    }

    #[test]
    fn create_rejects_non_tree() {
        let engine = MemoryEngine::new();
        engine.open().unwrap();
        let def = KeyDef::new(SPACE, IndexId::PRIMARY, IndexType::Bitset).unique(true);
        assert!(matches!(
            create(&engine, def),
            Err(CoreError::UnsupportedIndexType { .. })
        ));
        assert_eq!(engine.table_count(), 0);
    }

    #[test]
    fn drop_destroys_table_and_directory() {
        let root = tempdir().unwrap();
        let engine = open_engine(root.path());
        let index = create(&engine, KeyDef::primary(SPACE, FieldType::Num)).unwrap();

        drop_index(&engine, root.path(), index).unwrap();
        assert_eq!(engine.table_count(), 0);
        assert!(!root.path().join("512").exists());
    }

    #[test]
    fn drop_succeeds_when_cleanup_fails() {
        let root = tempdir().unwrap();
        let engine = open_engine(root.path());
        let index = create(&engine, KeyDef::primary(SPACE, FieldType::Num)).unwrap();
        std::fs::write(root.path().join("512").join(".hidden"), b"").unwrap();

        drop_index(&engine, root.path(), index).unwrap();
        assert_eq!(engine.table_count(), 0);
        assert!(root.path().join("512").join(".hidden").exists());
    }

    #[test]
    fn drop_propagates_engine_error() {
        let root = tempdir().unwrap();
        let engine = open_engine(root.path());
        let index = create(&engine, KeyDef::primary(SPACE, FieldType::Num)).unwrap();
        let table = index.table().unwrap();
        engine.destroy_table(table).unwrap();

        assert!(matches!(
            drop_index(&engine, root.path(), index),
            Err(CoreError::Engine(_))
        ));
        // The directory is only removed after a successful destroy.
        assert!(root.path().join("512").is_dir());
    }

    #[test]
    fn key_of_checks_type() {
        let engine = MemoryEngine::new();
        engine.open().unwrap();
        let index = create(&engine, KeyDef::primary(SPACE, FieldType::Str)).unwrap();

        let good = Tuple::new(vec!["alice".into(), 1u64.into()]);
        assert_eq!(index.key_of(&good).unwrap(), b"alice".to_vec());

        let bad = Tuple::new(vec![1u64.into()]);
        assert!(matches!(index.key_of(&bad), Err(CoreError::TupleKey { .. })));

        let empty = Tuple::new(vec![]);
        assert!(matches!(index.key_of(&empty), Err(CoreError::TupleKey { .. })));
    }
}
