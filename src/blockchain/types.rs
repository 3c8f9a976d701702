//! Collaborator contract and error definitions.
//!
//! The submission workflow drives a `TransactionService` through three remote
//! calls: create an unsigned transaction, sign it, submit the signed payload.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::ride::types::RideRequest;

/// Remote stage of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Create,
    Sign,
    Submit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Create => "transaction creation",
            Stage::Sign => "signing",
            Stage::Submit => "submission",
        };
        f.write_str(label)
    }
}

/// Errors surfaced by a transaction service.
///
/// The display text is shown to the user verbatim and stored in failed ledger
/// records, so the stage variants carry the collaborator's own message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Invalid input or network failure while building the transaction.
    #[error("{0}")]
    Creation(String),

    /// Bad key or malformed transaction.
    #[error("{0}")]
    Signing(String),

    /// Network or validation rejection of the signed payload.
    #[error("{0}")]
    Submission(String),

    /// The stage did not answer within its deadline.
    #[error("{stage} timed out after {secs} seconds")]
    Timeout { stage: Stage, secs: u64 },
}

impl ServiceError {
    /// Stage the error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            ServiceError::Creation(_) => Stage::Create,
            ServiceError::Signing(_) => Stage::Sign,
            ServiceError::Submission(_) => Stage::Submit,
            ServiceError::Timeout { stage, .. } => *stage,
        }
    }

    /// Text for the user and the ledger; never empty.
    pub fn message(&self) -> String {
        let text = self.to_string();
        if text.trim().is_empty() {
            format!("{} failed", self.stage())
        } else {
            text
        }
    }
}

/// Result type for collaborator calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Transaction prepared by the service, not yet authenticated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    /// Service-specific encoding of the transaction.
    pub payload: serde_json::Value,
}

/// Output of signing: a signature and the submittable raw payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub signature: String,
    pub raw_transaction: String,
}

/// Acknowledgement returned by a successful submit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Identifier assigned by the network, when it reports one.
    pub transaction_id: Option<String>,
}

/// External signer/broadcaster.
#[async_trait]
pub trait TransactionService: Send + Sync {
    /// Build an unsigned transaction for `request`.
    async fn create_unsigned(&self, request: &RideRequest) -> ServiceResult<UnsignedTransaction>;

    /// Sign `unsigned` with `private_key`.
    async fn sign(
        &self,
        unsigned: &UnsignedTransaction,
        private_key: &str,
    ) -> ServiceResult<SignedTransaction>;

    /// Broadcast a signed transaction.
    async fn submit(&self, signed: &SignedTransaction) -> ServiceResult<SubmitReceipt>;
}

#[async_trait]
impl<T: TransactionService + ?Sized> TransactionService for std::sync::Arc<T> {
    async fn create_unsigned(&self, request: &RideRequest) -> ServiceResult<UnsignedTransaction> {
        (**self).create_unsigned(request).await
    }

    async fn sign(
        &self,
        unsigned: &UnsignedTransaction,
        private_key: &str,
    ) -> ServiceResult<SignedTransaction> {
        (**self).sign(unsigned, private_key).await
    }

    async fn submit(&self, signed: &SignedTransaction) -> ServiceResult<SubmitReceipt> {
        (**self).submit(signed).await
    }
}

/// Errors from the EVM RPC client and wallet.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// A payload could not be encoded or decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_errors_display_verbatim() {
        let err = ServiceError::Submission("network timeout".to_string());
        assert_eq!(err.to_string(), "network timeout");
        assert_eq!(err.stage(), Stage::Submit);
    }

    #[test]
    fn test_blank_message_falls_back_to_stage() {
        assert_eq!(
            ServiceError::Creation("  ".to_string()).message(),
            "transaction creation failed"
        );
        assert_eq!(ServiceError::Signing(String::new()).message(), "signing failed");
        assert_eq!(
            ServiceError::Submission("rejected".to_string()).message(),
            "rejected"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = ServiceError::Timeout {
            stage: Stage::Create,
            secs: 15,
        };
        assert_eq!(err.to_string(), "transaction creation timed out after 15 seconds");
        assert_eq!(err.stage(), Stage::Create);
    }

    #[test]
    fn test_blockchain_error_display() {
        let err = BlockchainError::GasPriceTooHigh {
            current_gwei: 600,
            max_gwei: 500,
        };
        assert!(err.to_string().contains("600"));
    }
}
