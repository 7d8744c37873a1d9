mod common;

use common::{coord, FakeTm1};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tm1_agency::model::CellValue;
use tm1_agency::{BulkWriteBatcher, BulkWriteOutcome, Tm1Error};

fn batcher(fake: &Arc<FakeTm1>) -> BulkWriteBatcher {
    BulkWriteBatcher::from_backend(fake.clone(), 4)
}

fn num(v: f64) -> CellValue {
    CellValue::numeric(v).unwrap()
}

#[tokio::test]
async fn test_valid_batch_commits_in_one_call() {
    let fake = Arc::new(FakeTm1::sales());
    let records = vec![
        (coord(&["Jan", "Tokyo", "Revenue"]), num(1.0)),
        (coord(&["Feb", "Tokyo", "Revenue"]), num(2.0)),
        (coord(&["Jan", "Cairo", "Revenue"]), num(3.0)),
    ];

    let outcome = batcher(&fake).write_bulk("Sales", records).await.unwrap();

    assert_eq!(outcome, BulkWriteOutcome::Committed { count: 3 });
    assert_eq!(fake.bulk_writes.load(Ordering::SeqCst), 1);
    assert_eq!(fake.single_writes.load(Ordering::SeqCst), 0);
    assert_eq!(fake.cell("Sales", &["Jan", "Cairo", "Revenue"]), Some(num(3.0)));
}

#[tokio::test]
async fn test_duplicate_coordinates_keep_last_value() {
    let fake = Arc::new(FakeTm1::sales());
    let records = vec![
        (coord(&["Jan", "Tokyo", "Revenue"]), num(1.0)),
        (coord(&["Feb", "Cairo", "Revenue"]), num(5.0)),
        (coord(&["Jan", "Tokyo", "Revenue"]), num(9.0)),
    ];

    let outcome = batcher(&fake).write_bulk("Sales", records).await.unwrap();

    assert_eq!(outcome, BulkWriteOutcome::Committed { count: 2 });
    assert_eq!(fake.cell("Sales", &["Jan", "Tokyo", "Revenue"]), Some(num(9.0)));
}

#[tokio::test]
async fn test_one_invalid_record_rejects_whole_batch() {
    let fake = Arc::new(FakeTm1::sales());
    let records = vec![
        (coord(&["Jan", "Tokyo", "Revenue"]), num(1.0)),
        (coord(&["Jan", "Berlin", "Revenue"]), num(2.0)),
        (coord(&["Feb", "Cairo", "Revenue"]), num(3.0)),
    ];

    let outcome = batcher(&fake).write_bulk("Sales", records).await.unwrap();

    match outcome {
        BulkWriteOutcome::Rejected { cube, rejected } => {
            assert_eq!(cube, "Sales");
            assert_eq!(rejected.len(), 1);
            assert_eq!(rejected[0].coordinate, coord(&["Jan", "Berlin", "Revenue"]));
            assert_eq!(rejected[0].failures[0].dimension, "City");
            assert_eq!(rejected[0].failures[0].element, "Berlin");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(fake.mutations(), 0);
    assert!(fake.cells.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_batch_commits_nothing() {
    let fake = Arc::new(FakeTm1::sales());

    let outcome = batcher(&fake).write_bulk("Sales", Vec::new()).await.unwrap();

    assert_eq!(outcome, BulkWriteOutcome::Committed { count: 0 });
    assert_eq!(fake.mutations(), 0);
}

#[tokio::test]
async fn test_empty_batch_on_unknown_cube_is_not_found() {
    let fake = Arc::new(FakeTm1::sales());

    let err = batcher(&fake).write_bulk("Budget", Vec::new()).await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_shape_mismatch_fails_batch() {
    let fake = Arc::new(FakeTm1::sales());
    let records = vec![
        (coord(&["Jan", "Tokyo", "Revenue"]), num(1.0)),
        (coord(&["Jan", "Tokyo"]), num(2.0)),
    ];

    let err = batcher(&fake).write_bulk("Sales", records).await.unwrap_err();

    assert!(matches!(err, Tm1Error::ShapeMismatch { expected: 3, actual: 2 }));
    assert_eq!(fake.mutations(), 0);
}

#[tokio::test]
async fn test_membership_lookups_are_shared_across_records() {
    let fake = Arc::new(FakeTm1::sales());
    let records = vec![
        (coord(&["Jan", "Tokyo", "Revenue"]), num(1.0)),
        (coord(&["Jan", "Cairo", "Revenue"]), num(2.0)),
        (coord(&["Feb", "Tokyo", "Revenue"]), num(3.0)),
        (coord(&["Feb", "Cairo", "Revenue"]), num(4.0)),
    ];

    let outcome = batcher(&fake).write_bulk("Sales", records).await.unwrap();

    assert_eq!(outcome, BulkWriteOutcome::Committed { count: 4 });
    // Jan, Feb, Tokyo, Cairo, Revenue
    assert_eq!(fake.membership_checks.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_remote_failure_on_commit_is_surfaced() {
    let fake = Arc::new(FakeTm1::sales());
    fake.fail_writes.store(true, Ordering::SeqCst);

    let err = batcher(&fake)
        .write_bulk("Sales", vec![(coord(&["Jan", "Tokyo", "Revenue"]), num(1.0))])
        .await
        .unwrap_err();

    assert!(matches!(err, Tm1Error::Remote { status: 500, .. }));
    assert_eq!(fake.bulk_writes.load(Ordering::SeqCst), 1);
}
