//! Ride-request submission.
//!
//! # Data Flow
//! ```text
//! Command (map click, fare input, submit button)
//!     → workflow.rs (validate, create → sign → submit)
//!         ↳ prompt.rs (private key when the credential has none)
//!     → ledger (one record per terminal outcome)
//!     → status.rs (severity + message for the UI)
//! ```

pub mod prompt;
pub mod status;
pub mod types;
pub mod workflow;

pub use prompt::{CannedPrompt, KeyPrompt, StdinPrompt};
pub use status::{report, Severity, WorkflowStatus};
pub use types::{
    Credential, GeoPoint, RecordStatus, RideRequest, RideRequestDraft, TransactionRecord,
};
pub use workflow::{Command, Phase, RideWorkflow, SubmitOutcome, WorkflowEvent};
