//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. Validation is a pure function
//! that reports every problem it finds, not just the first.

use alloy::primitives::Address;
use std::fmt;

use crate::config::schema::RideConfig;

/// Largest ledger capacity accepted from configuration.
pub const MAX_LEDGER_CAPACITY: usize = 100;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RideConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let workflow = &config.workflow;
    for (field, value) in [
        ("workflow.create_timeout_secs", workflow.create_timeout_secs),
        ("workflow.sign_timeout_secs", workflow.sign_timeout_secs),
        ("workflow.submit_timeout_secs", workflow.submit_timeout_secs),
        ("blockchain.rpc_timeout_secs", config.blockchain.rpc_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if config.ledger.capacity == 0 || config.ledger.capacity > MAX_LEDGER_CAPACITY {
        errors.push(ValidationError::new(
            "ledger.capacity",
            format!("must be between 1 and {}", MAX_LEDGER_CAPACITY),
        ));
    }
    if config.ledger.namespace.trim().is_empty() {
        errors.push(ValidationError::new("ledger.namespace", "must not be empty"));
    }
    if config.profile.namespace.trim().is_empty() {
        errors.push(ValidationError::new("profile.namespace", "must not be empty"));
    }
    if config.ledger.namespace == config.profile.namespace {
        errors.push(ValidationError::new(
            "ledger.namespace",
            "must differ from profile.namespace",
        ));
    }
    if config.storage.path.trim().is_empty() {
        errors.push(ValidationError::new("storage.path", "must not be empty"));
    }

    let chain = &config.blockchain;
    if chain.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new(
            "blockchain.rpc_url",
            format!("invalid URL '{}'", chain.rpc_url),
        ));
    }
    if chain.ride_contract.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "blockchain.ride_contract",
            format!("invalid address '{}'", chain.ride_contract),
        ));
    }
    if !(chain.gas_price_multiplier.is_finite() && chain.gas_price_multiplier >= 1.0) {
        errors.push(ValidationError::new(
            "blockchain.gas_price_multiplier",
            "must be at least 1.0",
        ));
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", other),
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
