//! EVM implementation of the ride transaction service.
//!
//! # Responsibilities
//! - Build a legacy transaction carrying the ride request as call data
//! - Sign it with the rider's key
//! - Broadcast the EIP-2718 encoding and report the transaction hash

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{hex, Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde::Serialize;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ServiceError, ServiceResult, SignedTransaction,
    SubmitReceipt, TransactionService, UnsignedTransaction,
};
use crate::blockchain::wallet::Wallet;
use crate::ride::types::{GeoPoint, RideRequest};

/// Call data written into every ride transaction.
#[derive(Debug, Serialize)]
struct RideCall<'a> {
    kind: &'static str,
    pickup: &'a GeoPoint,
    dropoff: &'a GeoPoint,
    fare: f64,
}

/// Ride transaction service backed by an EVM JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct EvmRideService {
    client: BlockchainClient,
    ride_contract: Address,
}

impl EvmRideService {
    /// Create a service sending ride requests to the configured contract.
    pub fn new(client: BlockchainClient) -> BlockchainResult<Self> {
        let ride_contract: Address = client.config().ride_contract.parse().map_err(|e| {
            BlockchainError::Encoding(format!(
                "Invalid ride contract address '{}': {}",
                client.config().ride_contract,
                e
            ))
        })?;
        Ok(Self {
            client,
            ride_contract,
        })
    }

    /// Build a transaction request with gas price checks.
    async fn build(&self, request: &RideRequest) -> BlockchainResult<TransactionRequest> {
        let from: Address = request.rider.trim().parse().map_err(|e| {
            BlockchainError::Encoding(format!("Public key is not an address: {}", e))
        })?;

        let data = serde_json::to_vec(&RideCall {
            kind: crate::ride::types::RIDE_REQUEST_TYPE,
            pickup: &request.pickup,
            dropoff: &request.dropoff,
            fare: request.fare,
        })
        .map_err(|e| BlockchainError::Encoding(e.to_string()))?;

        let nonce = self.client.get_transaction_count(from).await?;

        let gas_price = self.client.get_gas_price().await?;
        let gas_price_gwei = gas_price / 1_000_000_000;

        let config = self.client.config();
        if gas_price_gwei > config.max_gas_price_gwei as u128 {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: config.max_gas_price_gwei,
            });
        }

        // Safety margin on top of the node's estimate.
        let adjusted_gas_price = (gas_price as f64 * config.gas_price_multiplier) as u128;

        // Base gas + data cost (16 gas per byte, simplified)
        let gas_limit = 21_000u64 + (data.len() as u64 * 16);

        Ok(TransactionRequest::default()
            .with_from(from)
            .with_to(self.ride_contract)
            .with_value(U256::ZERO)
            .with_input(Bytes::from(data))
            .with_nonce(nonce)
            .with_gas_price(adjusted_gas_price)
            .with_chain_id(config.chain_id)
            .with_gas_limit(gas_limit))
    }
}

#[async_trait]
impl TransactionService for EvmRideService {
    async fn create_unsigned(&self, request: &RideRequest) -> ServiceResult<UnsignedTransaction> {
        let tx = self
            .build(request)
            .await
            .map_err(|e| ServiceError::Creation(e.to_string()))?;
        let payload =
            serde_json::to_value(&tx).map_err(|e| ServiceError::Creation(e.to_string()))?;
        Ok(UnsignedTransaction { payload })
    }

    async fn sign(
        &self,
        unsigned: &UnsignedTransaction,
        private_key: &str,
    ) -> ServiceResult<SignedTransaction> {
        let tx: TransactionRequest = serde_json::from_value(unsigned.payload.clone())
            .map_err(|e| ServiceError::Signing(format!("Malformed transaction: {}", e)))?;
        let wallet =
            Wallet::from_private_key(private_key).map_err(|e| ServiceError::Signing(e.to_string()))?;

        if let Some(from) = tx.from {
            if from != wallet.address() {
                return Err(ServiceError::Signing(format!(
                    "Private key does not belong to {}",
                    from
                )));
            }
        }

        let envelope = wallet
            .sign_transaction(tx)
            .await
            .map_err(|e| ServiceError::Signing(e.to_string()))?;

        Ok(SignedTransaction {
            signature: hex::encode_prefixed(envelope.signature().as_bytes()),
            raw_transaction: hex::encode_prefixed(envelope.encoded_2718()),
        })
    }

    async fn submit(&self, signed: &SignedTransaction) -> ServiceResult<SubmitReceipt> {
        let raw = hex::decode(signed.raw_transaction.trim_start_matches("0x"))
            .map_err(|e| ServiceError::Submission(format!("Malformed raw transaction: {}", e)))?;
        let tx_hash = self
            .client
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| ServiceError::Submission(e.to_string()))?;

        tracing::info!(tx_hash = %tx_hash, "Ride transaction broadcast");

        Ok(SubmitReceipt {
            transaction_id: Some(tx_hash.to_string()),
        })
    }
}
