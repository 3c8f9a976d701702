//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! workflow, ledger, blockchain client produce:
//!     → logging.rs (structured log events, one span per submission)
//!     → metrics.rs (counters, histograms via the `metrics` facade)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → whatever metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Private keys never reach a log line; public keys are masked
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
