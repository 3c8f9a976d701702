//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Query the account state a ride transaction needs (nonce, gas price)
//! - Broadcast raw transactions
//! - Bound every call with the configured timeout

use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::BlockchainConfig;
use crate::observability::metrics;

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    /// Configuration.
    config: BlockchainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// No request is made here; use `verify_chain_id` to probe the endpoint.
    pub fn new(config: BlockchainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as DynProvider);

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse::<url::Url>() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::info!(
            rpc_url = %config.rpc_url,
            chain_id = config.chain_id,
            providers = providers.len(),
            "Blockchain client initialized"
        );

        Ok(Self {
            providers,
            config,
            timeout_duration,
        })
    }

    /// Run `call` against each provider in turn until one answers in time.
    async fn with_failover<T, E, F, Fut>(&self, what: &str, call: F) -> BlockchainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, call(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(BlockchainError::Rpc(format!("All RPC providers failed to {}", what)))
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let actual = self
            .with_failover("get chain id", |p| async move { p.get_chain_id().await })
            .await?;
        if actual != self.config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.config.chain_id,
                actual,
            });
        }
        Ok(())
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.with_failover("get block number", |p| async move { p.get_block_number().await })
            .await
    }

    /// Get the transaction count (nonce) for an address.
    pub async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.with_failover("get transaction count", move |p| async move {
            p.get_transaction_count(address).await
        })
        .await
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        self.with_failover("get gas price", |p| async move { p.get_gas_price().await })
            .await
    }

    /// Broadcast an EIP-2718 encoded transaction.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        let raw = raw.to_vec();
        self.with_failover("send raw transaction", move |p| {
            let raw = raw.clone();
            async move {
                p.send_raw_transaction(&raw)
                    .await
                    .map(|pending| *pending.tx_hash())
            }
        })
        .await
    }

    /// Check if the blockchain is reachable.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_rpc_health(healthy);
        healthy
    }

    /// Get the configuration.
    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
