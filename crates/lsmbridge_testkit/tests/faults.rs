//! Engine failures surfacing through the handle.

use lsmbridge_core::{CoreError, FieldType, Lsn, StorageEngine, WaitOptions};
use lsmbridge_native::keys;
use lsmbridge_testkit::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn online_faulty() -> (TestEngine, Arc<FaultyEngine>) {
    init_tracing();
    let (engine, faulty) = TestEngine::faulty();
    engine.end_recovery().unwrap();
    (engine, faulty)
}

#[test]
fn failed_checkpoint_request_records_nothing() {
    let (engine, faulty) = online_faulty();
    faulty.fail(FaultPoint::CtlCommand);

    assert!(matches!(
        engine.begin_checkpoint(Lsn::new(100)),
        Err(CoreError::Engine(_))
    ));
    assert_eq!(engine.checkpoints().pending(), Lsn::NONE);
    assert!(engine.memory.snapshots().is_empty());

    faulty.heal(FaultPoint::CtlCommand);
    engine.begin_checkpoint(Lsn::new(100)).unwrap();
    assert_eq!(engine.checkpoints().pending(), Lsn::new(100));
}

#[tokio::test]
async fn unreadable_readiness_fails_the_wait() {
    let (engine, faulty) = online_faulty();
    engine.begin_checkpoint(Lsn::new(100)).unwrap();
    faulty.fail(FaultPoint::CtlGet);

    let result = engine
        .wait_checkpoint_with(WaitOptions::new().deadline(Duration::from_secs(1)))
        .await;
    assert!(matches!(result, Err(CoreError::Engine(_))));
    assert_eq!(engine.checkpoints().pending(), Lsn::new(100));
}

#[tokio::test]
async fn missing_checkpoint_progress_is_an_engine_error() {
    let (engine, faulty) = online_faulty();
    engine.begin_checkpoint(Lsn::new(100)).unwrap();
    faulty.hide(keys::CHECKPOINT_LSN_LAST);

    match engine.wait_checkpoint().await {
        Err(CoreError::Engine(e)) => assert!(e.to_string().contains(keys::CHECKPOINT_LSN_LAST)),
        other => panic!("expected engine error, got {other:?}"),
    }
}

#[tokio::test]
#[should_panic(expected = "snapshot marker for checkpoint 100 is missing")]
async fn vanished_snapshot_marker_is_fatal() {
    let (engine, faulty) = online_faulty();
    engine.begin_checkpoint(Lsn::new(100)).unwrap();
    faulty.hide(keys::snapshot_lsn(100));

    let _ = engine.wait_checkpoint().await;
}

#[test]
fn failed_abort_keeps_checkpoint_requested() {
    let (engine, faulty) = online_faulty();
    engine.begin_checkpoint(Lsn::new(100)).unwrap();
    faulty.fail(FaultPoint::CtlDelete);

    assert!(matches!(
        engine.abort_checkpoint(),
        Err(CoreError::Engine(_))
    ));
    assert_eq!(engine.checkpoints().pending(), Lsn::new(100));
    assert_eq!(engine.memory.snapshots(), vec![100]);

    faulty.heal(FaultPoint::CtlDelete);
    engine.abort_checkpoint().unwrap();
    assert!(engine.memory.snapshots().is_empty());
}

#[test]
fn failed_retirement_keeps_commit_pending() {
    let (engine, faulty) = online_faulty();
    engine.begin_checkpoint(Lsn::new(100)).unwrap();
    engine.commit_checkpoint().unwrap();
    engine.begin_checkpoint(Lsn::new(200)).unwrap();
    faulty.fail(FaultPoint::CtlDelete);

    assert!(matches!(
        engine.commit_checkpoint(),
        Err(CoreError::Engine(_))
    ));
    assert_eq!(engine.checkpoints().committed(), Lsn::new(100));
    assert_eq!(engine.checkpoints().pending(), Lsn::new(200));
}

#[test]
fn failed_table_destroy_keeps_space_directory() {
    let (engine, faulty) = online_faulty();
    let mut space = engine.space(512, FieldType::Num);
    let dir = engine.root().join("512");
    assert!(dir.is_dir());

    faulty.fail(FaultPoint::DestroyTable);
    let index = space.take_primary().unwrap();
    assert!(matches!(
        engine.drop_index(index),
        Err(CoreError::Engine(_))
    ));
    assert!(dir.is_dir());
}

#[test]
fn failed_index_creation_is_an_engine_error() {
    let (engine, faulty) = online_faulty();
    faulty.fail(FaultPoint::CreateTable);

    let space = engine.open_space(lsmbridge_core::SpaceId::new(512));
    let key_def = lsmbridge_core::KeyDef::primary(space.id(), FieldType::Num);
    assert!(matches!(
        engine.create_index(key_def),
        Err(CoreError::Engine(_))
    ));
    assert_eq!(engine.memory.table_count(), 0);
}

#[test]
fn failed_cursor_stops_enumeration() {
    let (engine, faulty) = online_faulty();
    faulty.fail(FaultPoint::CtlCursor);

    let mut seen = 0;
    let result = engine.for_each_entry(|_, _| seen += 1);
    assert!(matches!(result, Err(CoreError::Engine(_))));
    assert_eq!(seen, 0);
}
