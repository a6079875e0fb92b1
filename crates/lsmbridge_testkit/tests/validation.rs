//! Property tests for key definition validation.

use lsmbridge_core::{index, CoreError, IndexType};
use lsmbridge_testkit::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn valid_definitions_are_accepted(def in valid_key_def_strategy()) {
        prop_assert!(index::validate(&def).is_ok());
    }

    #[test]
    fn single_violation_is_reported(
        (def, violation) in invalid_key_def_strategy()
    ) {
        let result = index::validate(&def);
        match (violation.reason(), result) {
            (None, Err(CoreError::UnsupportedIndexType { index_id, space_id })) => {
                prop_assert_eq!(index_id, def.index_id);
                prop_assert_eq!(space_id, def.space_id);
            }
            (Some(expected), Err(CoreError::ModifyIndex { index_id, space_id, reason })) => {
                prop_assert_eq!(reason, expected);
                prop_assert_eq!(index_id, def.index_id);
                prop_assert_eq!(space_id, def.space_id);
            }
            (_, other) => prop_assert!(false, "{:?} gave {:?}", violation, other),
        }
    }

    #[test]
    fn nothing_invalid_is_accepted(def in any_key_def_strategy()) {
        let acceptable = def.index_type == IndexType::Tree
            && def.is_unique
            && def.index_id.is_primary()
            && def.parts.len() == 1
            && matches!(
                def.parts[0].field_type,
                lsmbridge_core::FieldType::Num | lsmbridge_core::FieldType::Str
            );
        prop_assert_eq!(index::validate(&def).is_ok(), acceptable);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn stored_rows_read_back(tuples in prop::collection::vec(row_strategy(), 1..16)) {
        let engine = TestEngine::online();
        let space = engine.space(512, lsmbridge_core::FieldType::Num);
        for (signature, tuple) in tuples.iter().enumerate() {
            commit_row(&engine, &space, std::sync::Arc::new(tuple.clone()), signature as i64 + 1)
                .unwrap();
        }
        for tuple in &tuples {
            let key = tuple.field(0).unwrap();
            prop_assert!(engine.get(&space, key).unwrap().is_some());
        }
    }
}
