use super::common::*;
use crate::workflows::membership::domain::ApplicantId;
use crate::workflows::membership::ledger::{
    FileLedgerStore, LedgerError, MemoryLedgerStore, SubmissionLedger,
};

#[test]
fn record_counts_up_to_the_quota() {
    let ledger = SubmissionLedger::open(MemoryLedgerStore::default(), 3).expect("ledger opens");
    let applicant = applicant();

    assert_eq!(ledger.record_if_allowed(&applicant, 1_000).unwrap(), 1);
    assert_eq!(ledger.record_if_allowed(&applicant, 2_000).unwrap(), 2);
    assert_eq!(ledger.record_if_allowed(&applicant, 3_000).unwrap(), 3);

    match ledger.record_if_allowed(&applicant, 4_000) {
        Err(LedgerError::QuotaExceeded { limit: 3 }) => {}
        other => panic!("expected quota refusal, got {other:?}"),
    }
}

#[test]
fn refusal_leaves_the_ledger_unchanged() {
    let store = MemoryLedgerStore::default();
    let ledger = SubmissionLedger::open(store.clone(), 1).expect("ledger opens");
    let applicant = applicant();

    ledger
        .record_if_allowed(&applicant, 1_000)
        .expect("first submission fits the quota");
    ledger
        .record_if_allowed(&applicant, 2_000)
        .expect_err("second submission exceeds the quota");

    assert_eq!(ledger.count(&applicant), 1);
    assert_eq!(store.persisted(&applicant), vec![1_000]);
}

#[test]
fn quotas_are_tracked_per_applicant() {
    let ledger = SubmissionLedger::open(MemoryLedgerStore::default(), 1).expect("ledger opens");
    let first = ApplicantId("42".to_string());
    let second = ApplicantId("77".to_string());

    ledger
        .record_if_allowed(&first, 1_000)
        .expect("first applicant records");
    ledger
        .record_if_allowed(&first, 2_000)
        .expect_err("first applicant is exhausted");
    assert_eq!(
        ledger
            .record_if_allowed(&second, 3_000)
            .expect("second applicant is unaffected"),
        1
    );
}

#[test]
fn every_accepted_submission_reaches_the_store() {
    let store = MemoryLedgerStore::default();
    let ledger = SubmissionLedger::open(store.clone(), 3).expect("ledger opens");
    let applicant = applicant();

    ledger.record_if_allowed(&applicant, 1_000).unwrap();
    assert_eq!(store.persisted(&applicant), vec![1_000]);
    ledger.record_if_allowed(&applicant, 2_000).unwrap();
    assert_eq!(store.persisted(&applicant), vec![1_000, 2_000]);
}

#[test]
fn store_failures_surface_to_the_caller() {
    let ledger = SubmissionLedger::open(FailingLedgerStore, 3).expect("ledger opens");

    match ledger.record_if_allowed(&applicant(), 1_000) {
        Err(LedgerError::Store(message)) => assert_eq!(message, "disk full"),
        other => panic!("expected store failure, got {other:?}"),
    }
}

#[test]
fn reopened_ledger_keeps_enforcing_the_quota() {
    let store = MemoryLedgerStore::default();
    let applicant = applicant();

    let first = SubmissionLedger::open(store.clone(), 2).expect("ledger opens");
    first.record_if_allowed(&applicant, 1_000).unwrap();
    first.record_if_allowed(&applicant, 2_000).unwrap();
    drop(first);

    let second = SubmissionLedger::open(store, 2).expect("ledger reopens");
    assert_eq!(second.count(&applicant), 2);
    assert!(matches!(
        second.record_if_allowed(&applicant, 3_000),
        Err(LedgerError::QuotaExceeded { limit: 2 })
    ));
}

#[test]
fn file_store_round_trips_entries() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ledger").join("submissions.json");
    let applicant = applicant();

    let ledger =
        SubmissionLedger::open(FileLedgerStore::new(&path), 2).expect("missing file reads empty");
    ledger.record_if_allowed(&applicant, 1_000).unwrap();
    drop(ledger);

    let reopened = SubmissionLedger::open(FileLedgerStore::new(&path), 2).expect("ledger reopens");
    assert_eq!(reopened.count(&applicant), 1);
    assert_eq!(reopened.record_if_allowed(&applicant, 2_000).unwrap(), 2);
}
