//! Ride-request submission workflow.
//!
//! # States
//! ```text
//! Idle → Creating → Signing → Submitting → Succeeded
//!           │          │  │         │
//!           │          │  └─(prompt declined)→ Cancelled
//!           └──────────┴───────────┴──(error / timeout)→ Failed
//! ```
//!
//! - Succeeded and Failed append one record to the rider's ledger partition
//! - Cancelled writes nothing
//! - At most one submission is in flight per workflow; a second `submit`
//!   returns `SubmitOutcome::Busy`
//! - Terminal states accept a new `submit`; nothing is retried automatically
//!
//! Every transition is published as a `WorkflowEvent` on a broadcast channel
//! for the UI layer to render.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::types::{
    ServiceError, ServiceResult, SignedTransaction, Stage, SubmitReceipt, TransactionService,
};
use crate::config::WorkflowConfig;
use crate::ledger::Ledger;
use crate::observability::metrics;
use crate::ride::prompt::KeyPrompt;
use crate::ride::status::WorkflowStatus;
use crate::ride::types::{Credential, GeoPoint, RideRequest, RideRequestDraft, TransactionRecord};
use crate::storage::KeyValueStore;

/// Characters of the transaction identifier kept for display.
const TX_HASH_DISPLAY_LEN: usize = 10;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Creating,
    Signing,
    Submitting,
    Succeeded,
    Failed,
    Cancelled,
}

impl Phase {
    /// Whether a submission is between its first and last remote call.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Phase::Creating | Phase::Signing | Phase::Submitting)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed | Phase::Cancelled)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Input from the UI layer.
#[derive(Debug, Clone)]
pub enum Command {
    SetPickup(GeoPoint),
    SetDropoff(GeoPoint),
    SetFare(f64),
    /// Submit the current selection with this credential.
    Submit(Credential),
    Reset,
}

/// Notification emitted on every transition.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    Phase(Phase),
    Status(WorkflowStatus),
}

/// Result of one `submit` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Preconditions not met; nothing happened.
    Skipped,
    /// Another submission is in flight; nothing happened.
    Busy,
    Succeeded(TransactionRecord),
    Failed {
        error: ServiceError,
        record: TransactionRecord,
    },
    /// The user declined to enter a private key.
    Cancelled,
    /// `reset` was called while this submission was in flight.
    Aborted,
}

impl SubmitOutcome {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            SubmitOutcome::Skipped => "skipped",
            SubmitOutcome::Busy => "busy",
            SubmitOutcome::Succeeded(_) => "succeeded",
            SubmitOutcome::Failed { .. } => "failed",
            SubmitOutcome::Cancelled => "cancelled",
            SubmitOutcome::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Default)]
struct WorkflowState {
    phase: Phase,
    status: WorkflowStatus,
    selection: RideRequestDraft,
}

/// Clears the in-flight flag when a submission ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates create → sign → submit for one rider at a time.
pub struct RideWorkflow<T, S, P> {
    service: T,
    ledger: Arc<Ledger<S>>,
    prompt: P,
    config: WorkflowConfig,
    state: Mutex<WorkflowState>,
    in_flight: AtomicBool,
    epoch: AtomicU64,
    events: broadcast::Sender<WorkflowEvent>,
}

impl<T, S, P> RideWorkflow<T, S, P>
where
    T: TransactionService,
    S: KeyValueStore,
    P: KeyPrompt,
{
    pub fn new(service: T, ledger: Arc<Ledger<S>>, prompt: P, config: WorkflowConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            service,
            ledger,
            prompt,
            config,
            state: Mutex::new(WorkflowState::default()),
            in_flight: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            events,
        }
    }

    /// Receive every subsequent phase and status change.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    pub fn status(&self) -> WorkflowStatus {
        self.state().status.clone()
    }

    /// The pickup/dropoff/fare selected so far.
    pub fn selection(&self) -> RideRequestDraft {
        self.state().selection
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    fn state(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a UI command. Only `Submit` produces an outcome.
    pub async fn handle(&self, command: Command) -> Option<SubmitOutcome> {
        match command {
            Command::SetPickup(point) => {
                self.state().selection.pickup = Some(point);
            }
            Command::SetDropoff(point) => {
                self.state().selection.dropoff = Some(point);
            }
            Command::SetFare(fare) => {
                self.state().selection.fare = fare;
            }
            Command::Submit(credential) => {
                let draft = self.selection();
                return Some(self.submit(draft, &credential).await);
            }
            Command::Reset => self.reset(),
        }
        None
    }

    /// Clear the selection and status and return to Idle.
    ///
    /// An in-flight submission is not cancelled remotely: it stops at its next
    /// suspension point and leaves status alone. A submission the network has
    /// already acknowledged is still recorded in the ledger.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        {
            let mut state = self.state();
            state.phase = Phase::Idle;
            state.status = WorkflowStatus::Idle;
            state.selection.pickup = None;
            state.selection.dropoff = None;
        }
        self.emit(WorkflowEvent::Phase(Phase::Idle));
        self.emit(WorkflowEvent::Status(WorkflowStatus::Idle));
        tracing::debug!("Workflow reset");
    }

    /// Submit `draft` signed with `credential`.
    ///
    /// Returns `Skipped` without any side effect when pickup, dropoff or public
    /// key is missing or the fare is invalid.
    pub async fn submit(&self, draft: RideRequestDraft, credential: &Credential) -> SubmitOutcome {
        let Some(request) = draft.validate(credential) else {
            tracing::debug!("Ride request incomplete, submission skipped");
            return SubmitOutcome::Skipped;
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Submission already in flight, rejecting");
            return SubmitOutcome::Busy;
        }
        let _in_flight = InFlight(&self.in_flight);

        let epoch = self.epoch.load(Ordering::Acquire);
        let span = tracing::info_span!(
            "ride_submission",
            attempt_id = %Uuid::new_v4(),
            public_key = %credential.masked_public_key(),
        );
        let started = Instant::now();

        let outcome = self.run(epoch, request, credential).instrument(span).await;

        metrics::record_submission(outcome.label(), started);
        outcome
    }

    async fn run(&self, epoch: u64, request: RideRequest, credential: &Credential) -> SubmitOutcome {
        tracing::info!(fare = request.fare, "Submitting ride request");

        if !self.enter(epoch, Phase::Creating, "Creating ride request transaction...") {
            return SubmitOutcome::Aborted;
        }
        let created = bounded(
            Stage::Create,
            self.config.create_timeout_secs,
            self.service.create_unsigned(&request),
        )
        .await;
        let unsigned = match created {
            Ok(unsigned) => unsigned,
            Err(e) => return self.fail(epoch, &request, e).await,
        };

        if !self.enter(epoch, Phase::Signing, "Signing transaction...") {
            return SubmitOutcome::Aborted;
        }
        let private_key = match credential.private_key() {
            Some(key) => key.to_string(),
            None => match self.prompt_for_key(&request.rider).await {
                Some(key) => key,
                None => return self.cancel(epoch),
            },
        };
        if self.is_stale(epoch) {
            return SubmitOutcome::Aborted;
        }
        let signed = bounded(
            Stage::Sign,
            self.config.sign_timeout_secs,
            self.service.sign(&unsigned, &private_key),
        )
        .await;
        let signed = match signed {
            Ok(signed) => signed,
            Err(e) => return self.fail(epoch, &request, e).await,
        };

        if !self.enter(epoch, Phase::Submitting, "Submitting transaction...") {
            return SubmitOutcome::Aborted;
        }
        let submitted = bounded(
            Stage::Submit,
            self.config.submit_timeout_secs,
            self.service.submit(&signed),
        )
        .await;
        match submitted {
            Ok(receipt) => self.succeed(epoch, &request, &signed, &receipt).await,
            Err(e) => self.fail(epoch, &request, e).await,
        }
    }

    /// Ask for the private key; a blank answer or an expired prompt cancels.
    async fn prompt_for_key(&self, public_key: &str) -> Option<String> {
        let answer = match self.config.prompt_timeout_secs {
            0 => self.prompt.request_private_key(public_key).await,
            secs => timeout(
                Duration::from_secs(secs),
                self.prompt.request_private_key(public_key),
            )
            .await
            .unwrap_or_else(|_| {
                tracing::warn!(timeout_secs = secs, "Private key prompt expired");
                None
            }),
        };
        answer.filter(|key| !key.trim().is_empty())
    }

    async fn succeed(
        &self,
        epoch: u64,
        request: &RideRequest,
        signed: &SignedTransaction,
        receipt: &SubmitReceipt,
    ) -> SubmitOutcome {
        let tx_hash = display_tx_hash(receipt, signed);
        let record = TransactionRecord::success(request, tx_hash.clone());
        self.record(&request.rider, record.clone()).await;

        tracing::info!(tx_hash = %tx_hash, "Ride request submitted");
        if !self.finish(
            epoch,
            Phase::Succeeded,
            WorkflowStatus::Success(format!("Ride request submitted: {}", tx_hash)),
        ) {
            return SubmitOutcome::Aborted;
        }
        SubmitOutcome::Succeeded(record)
    }

    async fn fail(&self, epoch: u64, request: &RideRequest, error: ServiceError) -> SubmitOutcome {
        if self.is_stale(epoch) {
            tracing::debug!(error = %error, "Submission failed after reset");
            return SubmitOutcome::Aborted;
        }

        let message = error.message();
        tracing::error!(stage = %error.stage(), error = %message, "Ride request failed");

        let record = TransactionRecord::failure(request, message.clone());
        self.record(&request.rider, record.clone()).await;

        if !self.finish(epoch, Phase::Failed, WorkflowStatus::Error(message)) {
            return SubmitOutcome::Aborted;
        }
        SubmitOutcome::Failed { error, record }
    }

    fn cancel(&self, epoch: u64) -> SubmitOutcome {
        tracing::info!("Signing cancelled by user");
        if !self.finish(
            epoch,
            Phase::Cancelled,
            WorkflowStatus::Warning("Signing cancelled".to_string()),
        ) {
            return SubmitOutcome::Aborted;
        }
        SubmitOutcome::Cancelled
    }

    /// Append to the ledger; a storage failure never changes the outcome.
    async fn record(&self, public_key: &str, record: TransactionRecord) {
        if let Err(e) = self.ledger.append(public_key, record).await {
            tracing::error!(error = %e, "Failed to record ride request in ledger");
        }
    }

    fn is_stale(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) != epoch
    }

    fn enter(&self, epoch: u64, phase: Phase, message: &str) -> bool {
        self.finish(epoch, phase, WorkflowStatus::Info(message.to_string()))
    }

    /// Move to `phase` with `status`, unless a reset happened since `epoch`.
    fn finish(&self, epoch: u64, phase: Phase, status: WorkflowStatus) -> bool {
        {
            let mut state = self.state();
            if self.is_stale(epoch) {
                return false;
            }
            state.phase = phase;
            state.status = status.clone();
        }
        tracing::debug!(phase = %phase, "Workflow transition");
        self.emit(WorkflowEvent::Phase(phase));
        self.emit(WorkflowEvent::Status(status));
        true
    }

    fn emit(&self, event: WorkflowEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Run one remote call under its stage deadline.
async fn bounded<R>(
    stage: Stage,
    secs: u64,
    call: impl Future<Output = ServiceResult<R>>,
) -> ServiceResult<R> {
    match timeout(Duration::from_secs(secs), call).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Timeout { stage, secs }),
    }
}

/// Shortened identifier shown for a submitted transaction.
///
/// Display-only: the network's transaction id when reported, otherwise the
/// signature, cut to a fixed prefix.
fn display_tx_hash(receipt: &SubmitReceipt, signed: &SignedTransaction) -> String {
    let source = receipt
        .transaction_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .unwrap_or(&signed.signature);
    let prefix: String = source.chars().take(TX_HASH_DISPLAY_LEN).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed() -> SignedTransaction {
        SignedTransaction {
            signature: "0xsignature0123".to_string(),
            raw_transaction: "0xraw".to_string(),
        }
    }

    #[test]
    fn test_display_tx_hash_prefers_receipt() {
        let receipt = SubmitReceipt {
            transaction_id: Some("0xabcdef0123456789".to_string()),
        };
        assert_eq!(display_tx_hash(&receipt, &signed()), "0xabcdef01...");
    }

    #[test]
    fn test_display_tx_hash_falls_back_to_signature() {
        assert_eq!(
            display_tx_hash(&SubmitReceipt::default(), &signed()),
            "0xsignatu..."
        );
        let empty = SubmitReceipt {
            transaction_id: Some(String::new()),
        };
        assert_eq!(display_tx_hash(&empty, &signed()), "0xsignatu...");
    }

    #[test]
    fn test_phase_predicates() {
        assert!(Phase::Signing.is_in_flight());
        assert!(!Phase::Idle.is_in_flight());
        assert!(Phase::Cancelled.is_terminal());
        assert!(!Phase::Submitting.is_terminal());
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(SubmitOutcome::Skipped.label(), "skipped");
        assert_eq!(SubmitOutcome::Aborted.label(), "aborted");
    }
}
