//! Wallet management and transaction signing.
//!
//! # Security
//! - Keys arrive from the credential or the interactive prompt, never from logs
//! - Keys are never logged or serialized

use alloy::consensus::TxEnvelope;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Wallet for transaction signing.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::debug!(address = %signer.address(), "Wallet loaded");

        Ok(Self { signer })
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a fully populated transaction request.
    pub async fn sign_transaction(&self, tx: TransactionRequest) -> BlockchainResult<TxEnvelope> {
        let wallet = EthereumWallet::from(self.signer.clone());
        tx.build(&wallet)
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Signing failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_wallet_from_private_key() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(
            wallet.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_wallet_with_0x_prefix() {
        let wallet = Wallet::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(
            wallet.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_private_key() {
        let result = Wallet::from_private_key("invalid_key");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    #[tokio::test]
    async fn test_sign_transaction() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let tx = TransactionRequest::default()
            .with_from(wallet.address())
            .with_to(Address::ZERO)
            .with_value(U256::ZERO)
            .with_nonce(0)
            .with_gas_price(1_000_000_000)
            .with_gas_limit(21_000)
            .with_chain_id(31337);

        let envelope = wallet.sign_transaction(tx).await.unwrap();
        assert_eq!(envelope.signature().as_bytes().len(), 65);
    }
}
