//! Metrics collection.
//!
//! # Metrics
//! - `ride_submissions_total` (counter): submissions by terminal outcome
//! - `ride_submission_duration_seconds` (histogram): wall time of a submission
//! - `ride_ledger_appends_total` (counter): records written to the ledger
//! - `ride_rpc_health` (gauge): 1=reachable, 0=unreachable

use std::time::Instant;

/// Record a finished submission.
pub fn record_submission(outcome: &'static str, started: Instant) {
    ::metrics::counter!("ride_submissions_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("ride_submission_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

/// Record one ledger append.
pub fn record_ledger_append() {
    ::metrics::counter!("ride_ledger_appends_total").increment(1);
}

/// Record RPC endpoint reachability.
pub fn record_rpc_health(healthy: bool) {
    ::metrics::gauge!("ride_rpc_health").set(if healthy { 1.0 } else { 0.0 });
}
