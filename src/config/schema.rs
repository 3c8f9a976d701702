//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the ride client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the ride-request client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RideConfig {
    /// Submission workflow timeouts.
    pub workflow: WorkflowConfig,

    /// Transaction ledger settings.
    pub ledger: LedgerConfig,

    /// Persistent key-value storage.
    pub storage: StorageConfig,

    /// Credential persistence.
    pub profile: ProfileConfig,

    /// Blockchain integration settings.
    pub blockchain: BlockchainConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Timeouts applied to each remote stage of a submission.
///
/// Every collaborator call has a deadline; an expired deadline fails the
/// submission. Nothing is retried automatically.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Deadline for building the unsigned transaction, in seconds.
    pub create_timeout_secs: u64,

    /// Deadline for signing, in seconds.
    pub sign_timeout_secs: u64,

    /// Deadline for broadcasting the signed transaction, in seconds.
    pub submit_timeout_secs: u64,

    /// How long to wait for the user to enter a private key (0 = forever).
    /// An expired prompt is treated as a cancel.
    pub prompt_timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            create_timeout_secs: 15,
            sign_timeout_secs: 10,
            submit_timeout_secs: 30,
            prompt_timeout_secs: 120,
        }
    }
}

/// Transaction ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum records kept per public key.
    pub capacity: usize,

    /// Storage key prefix; partitions live under `<namespace>.<publicKey>`.
    pub namespace: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            namespace: "ledger".to_string(),
        }
    }
}

/// Backing file for the persistent store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON file holding all persisted keys.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "clutch-ride.json".to_string(),
        }
    }
}

/// Credential persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Storage key prefix for `publicKey` / `privateKey`.
    pub namespace: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            namespace: "profile".to_string(),
        }
    }
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Gas price multiplier (1.0 = estimated, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,

    /// Address that receives ride-request transactions.
    pub ride_contract: String,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 10,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 500,
            ride_contract: "0x0000000000000000000000000000000000000000".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Output format: "pretty" or "json".
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RideConfig::default();
        assert_eq!(config.ledger.capacity, 10);
        assert_eq!(config.ledger.namespace, "ledger");
        assert_eq!(config.profile.namespace, "profile");
        assert_eq!(config.workflow.submit_timeout_secs, 30);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RideConfig = toml::from_str(
            r#"
            [workflow]
            submit_timeout_secs = 5

            [blockchain]
            chain_id = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.workflow.submit_timeout_secs, 5);
        assert_eq!(config.workflow.create_timeout_secs, 15);
        assert_eq!(config.blockchain.chain_id, 1);
        assert_eq!(config.blockchain.rpc_timeout_secs, 10);
        assert_eq!(config.ledger.capacity, 10);
    }
}
