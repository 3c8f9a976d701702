//! Ride-request client library.
//!
//! Turns a pickup, a dropoff and a fare into a signed transaction, submits it
//! through a `TransactionService`, and keeps a bounded per-rider history of the
//! outcomes.

pub mod blockchain;
pub mod config;
pub mod ledger;
pub mod observability;
pub mod profile;
pub mod ride;
pub mod storage;

pub use config::RideConfig;
pub use ledger::Ledger;
pub use profile::ProfileStore;
pub use ride::{Credential, GeoPoint, RideRequestDraft, RideWorkflow, SubmitOutcome};
