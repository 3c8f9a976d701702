//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! RideRequest
//!     → transaction.rs (build call data, nonce, gas price)
//!     → wallet.rs (sign with the rider's key)
//!     → client.rs (broadcast with timeouts and failover)
//! ```
//!
//! The workflow only sees the `TransactionService` trait in types.rs; the EVM
//! service is one implementation of it.
//!
//! # Security Constraints
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use transaction::EvmRideService;
pub use types::{
    BlockchainError, ServiceError, ServiceResult, SignedTransaction, Stage, SubmitReceipt,
    TransactionService, UnsignedTransaction,
};
pub use wallet::Wallet;
