//! Ledger and profile persistence through the file-backed store.

use std::sync::Arc;

use clutch_ride::config::WorkflowConfig;
use clutch_ride::ride::{CannedPrompt, RecordStatus, RideWorkflow, SubmitOutcome};
use clutch_ride::storage::{FileStore, KeyValueStore};
use clutch_ride::{Ledger, ProfileStore};

mod common;
use common::*;

#[tokio::test]
async fn test_history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clutch-ride.json");

    {
        let store = Arc::new(FileStore::open(&path).await.unwrap());
        let ledger = Arc::new(Ledger::new(store));
        let workflow = RideWorkflow::new(
            Arc::new(ScriptedService::new()),
            ledger,
            CannedPrompt::declining(),
            WorkflowConfig::default(),
        );
        let outcome = workflow.submit(draft(), &credential_with_key()).await;
        assert!(matches!(outcome, SubmitOutcome::Succeeded(_)));
    }

    let ledger = Ledger::new(FileStore::open(&path).await.unwrap());
    let records = ledger.read("pk1").await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, RecordStatus::Success);
}

#[tokio::test]
async fn test_eviction_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clutch-ride.json");

    {
        let workflow = RideWorkflow::new(
            Arc::new(ScriptedService::new()),
            Arc::new(Ledger::new(FileStore::open(&path).await.unwrap())),
            CannedPrompt::declining(),
            WorkflowConfig::default(),
        );
        for fare in 0..11 {
            let mut draft = draft();
            draft.fare = fare as f64;
            workflow.submit(draft, &credential_with_key()).await;
        }
    }

    let ledger = Ledger::new(FileStore::open(&path).await.unwrap());
    let records = ledger.read("pk1").await;
    assert_eq!(records.len(), 10);
    assert_eq!(records[0].fare, 10.0);
    assert_eq!(records[9].fare, 1.0);
}

#[tokio::test]
async fn test_corrupted_partition_on_disk_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clutch-ride.json");
    std::fs::write(&path, r#"{"ledger.pk1": "[{\"broken\": true}]"}"#).unwrap();

    let ledger = Ledger::new(FileStore::open(&path).await.unwrap());
    assert!(ledger.read("pk1").await.is_empty());
}

#[tokio::test]
async fn test_profile_and_ledger_share_a_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clutch-ride.json");
    let store = Arc::new(FileStore::open(&path).await.unwrap());

    let profile = ProfileStore::new(store.clone());
    profile.save(&credential_with_key(), true).await.unwrap();
    let credential = profile.load().await.unwrap().unwrap();

    let workflow = RideWorkflow::new(
        Arc::new(ScriptedService::new()),
        Arc::new(Ledger::new(store.clone())),
        CannedPrompt::declining(),
        WorkflowConfig::default(),
    );
    workflow.submit(draft(), &credential).await;

    assert!(store.get("profile.publicKey").await.unwrap().is_some());
    assert!(store.get("ledger.pk1").await.unwrap().is_some());
}
