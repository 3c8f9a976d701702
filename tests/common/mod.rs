//! Shared fixtures for workflow integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, Notify};

use clutch_ride::blockchain::{
    ServiceError, ServiceResult, SignedTransaction, SubmitReceipt, TransactionService,
    UnsignedTransaction,
};
use clutch_ride::config::WorkflowConfig;
use clutch_ride::ride::{
    Credential, GeoPoint, KeyPrompt, Phase, RideRequest, RideRequestDraft, WorkflowEvent,
};
use clutch_ride::storage::{KeyValueStore, StorageError, StorageResult};

/// How one stage of the scripted service answers.
#[derive(Clone)]
pub enum Behavior {
    Succeed,
    Fail(String),
    /// Never answers.
    Stall,
    /// Succeeds once the notify fires.
    WaitFor(Arc<Notify>),
}

impl Behavior {
    async fn play(&self) -> Result<(), String> {
        match self {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(message) => Err(message.clone()),
            Behavior::Stall => std::future::pending().await,
            Behavior::WaitFor(notify) => {
                notify.notified().await;
                Ok(())
            }
        }
    }
}

/// Transaction service with scripted answers and call counters.
pub struct ScriptedService {
    pub create: Behavior,
    pub sign: Behavior,
    pub submit: Behavior,
    pub create_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub last_request: Mutex<Option<RideRequest>>,
    pub last_private_key: Mutex<Option<String>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            create: Behavior::Succeed,
            sign: Behavior::Succeed,
            submit: Behavior::Succeed,
            create_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
            last_private_key: Mutex::new(None),
        }
    }

    pub fn with_create(mut self, behavior: Behavior) -> Self {
        self.create = behavior;
        self
    }

    pub fn with_sign(mut self, behavior: Behavior) -> Self {
        self.sign = behavior;
        self
    }

    pub fn with_submit(mut self, behavior: Behavior) -> Self {
        self.submit = behavior;
        self
    }

    /// (create, sign, submit) call counts.
    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.create_calls.load(Ordering::SeqCst),
            self.sign_calls.load(Ordering::SeqCst),
            self.submit_calls.load(Ordering::SeqCst),
        )
    }

    pub fn last_private_key(&self) -> Option<String> {
        self.last_private_key.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionService for ScriptedService {
    async fn create_unsigned(&self, request: &RideRequest) -> ServiceResult<UnsignedTransaction> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.create.play().await.map_err(ServiceError::Creation)?;
        Ok(UnsignedTransaction {
            payload: serde_json::to_value(request).unwrap(),
        })
    }

    async fn sign(
        &self,
        _unsigned: &UnsignedTransaction,
        private_key: &str,
    ) -> ServiceResult<SignedTransaction> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_private_key.lock().unwrap() = Some(private_key.to_string());
        self.sign.play().await.map_err(ServiceError::Signing)?;
        Ok(SignedTransaction {
            signature: "0x5151515151515151".to_string(),
            raw_transaction: "0xf86b".to_string(),
        })
    }

    async fn submit(&self, _signed: &SignedTransaction) -> ServiceResult<SubmitReceipt> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit.play().await.map_err(ServiceError::Submission)?;
        Ok(SubmitReceipt {
            transaction_id: Some("0x9f86d081884c7d659a2feaa0c55ad015".to_string()),
        })
    }
}

/// Prompt that never answers.
pub struct SilentPrompt;

#[async_trait]
impl KeyPrompt for SilentPrompt {
    async fn request_private_key(&self, _public_key: &str) -> Option<String> {
        std::future::pending().await
    }
}

/// Store that reads fine but refuses every write.
#[derive(Default)]
pub struct ReadOnlyStore;

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: String) -> StorageResult<()> {
        Err(StorageError::Backend("disk full".to_string()))
    }

    async fn remove(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }
}

pub fn pickup() -> GeoPoint {
    GeoPoint::new(27.19, 56.38)
}

pub fn dropoff() -> GeoPoint {
    GeoPoint::new(27.20, 56.39)
}

pub fn draft() -> RideRequestDraft {
    RideRequestDraft::new(pickup(), dropoff(), 1000.0)
}

pub fn credential_with_key() -> Credential {
    Credential::new("pk1", Some("sk1".to_string()))
}

pub fn credential_without_key() -> Credential {
    Credential::new("pk1", None)
}

/// Short deadlines so timeout tests finish quickly.
pub fn fast_config() -> WorkflowConfig {
    WorkflowConfig {
        create_timeout_secs: 1,
        sign_timeout_secs: 1,
        submit_timeout_secs: 1,
        prompt_timeout_secs: 1,
    }
}

/// Drain buffered events and keep only phase changes.
pub fn phases(events: &mut broadcast::Receiver<WorkflowEvent>) -> Vec<Phase> {
    let mut phases = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let WorkflowEvent::Phase(phase) = event {
            phases.push(phase);
        }
    }
    phases
}

/// Wait until the workflow publishes `target`.
pub async fn wait_for_phase(events: &mut broadcast::Receiver<WorkflowEvent>, target: Phase) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(WorkflowEvent::Phase(phase)) if phase == target => return,
                Ok(_) => continue,
                Err(e) => panic!("event channel closed: {}", e),
            }
        }
    })
    .await
    .expect("phase never reached");
}
