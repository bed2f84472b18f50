//! EVM provider abstraction.
//!
//! Models the JSON-RPC surface a browser wallet extension exposes: account
//! listing, chain switching, message signing and transaction submission.
//! [`LocalEvmSigner`] implements the same surface over a private key and
//! plain RPC endpoints so the bridge flows run headless.

use std::collections::HashMap;
use std::fmt;

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use tokio::sync::RwLock;
use url::Url;

use crate::error::ProviderError;

/// Contract call ready for submission: target address, calldata and an
/// optional explicit gas limit.
#[derive(Debug, Clone)]
pub struct EvmCall {
    pub to: String,
    pub data: Vec<u8>,
    pub gas_limit: Option<u64>,
}

/// Surface of an EVM wallet provider.
///
/// Addresses and transaction hashes cross this boundary as hex strings,
/// matching how injected providers report them.
#[async_trait]
pub trait EvmProvider: Send + Sync {
    /// Provider identifier, e.g. `"metamask"`.
    fn name(&self) -> &str;

    /// Prompts for connection and returns the exposed accounts.
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Currently selected account.
    async fn selected_address(&self) -> Result<String, ProviderError>;

    /// Switches the provider to the chain with the given hex id.
    async fn switch_chain(&self, chain_hex_id: &str) -> Result<(), ProviderError>;

    /// Signs a human-readable message with the given account.
    async fn personal_sign(&self, message: &str, address: &str)
        -> Result<String, ProviderError>;

    /// Submits a contract call and returns the transaction hash once the
    /// call is confirmed.
    async fn send_transaction(&self, call: EvmCall) -> Result<String, ProviderError>;
}

// ============================================================================
// Local signer
// ============================================================================

/// Provider backed by a local private key and one RPC endpoint per chain,
/// keyed by lowercase hex chain id.
pub struct LocalEvmSigner {
    name: String,
    signer: PrivateKeySigner,
    endpoints: HashMap<String, Url>,
    active: RwLock<Option<String>>,
}

impl LocalEvmSigner {
    pub fn new(signer: PrivateKeySigner, endpoints: HashMap<String, Url>) -> Self {
        let endpoints = endpoints
            .into_iter()
            .map(|(id, url)| (id.to_lowercase(), url))
            .collect();
        Self {
            name: "local".to_string(),
            signer,
            endpoints,
            active: RwLock::new(None),
        }
    }

    pub fn from_private_key_hex(
        private_key: &str,
        endpoints: HashMap<String, Url>,
    ) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| eyre!("invalid private key: {e}"))
            .wrap_err("failed to load EVM signing key")?;
        Ok(Self::new(signer, endpoints))
    }

    /// Overrides the provider name the wallet adapter selects by.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl fmt::Debug for LocalEvmSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEvmSigner")
            .field("name", &self.name)
            .field("address", &self.signer.address())
            .field("endpoints", &self.endpoints.keys())
            .finish()
    }
}

#[async_trait]
impl EvmProvider for LocalEvmSigner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec![self.signer.address().to_string()])
    }

    async fn selected_address(&self) -> Result<String, ProviderError> {
        Ok(self.signer.address().to_string())
    }

    async fn switch_chain(&self, chain_hex_id: &str) -> Result<(), ProviderError> {
        let normalized = chain_hex_id.to_lowercase();
        if !self.endpoints.contains_key(&normalized) {
            return Err(ProviderError::Unavailable(format!(
                "no RPC endpoint configured for chain {chain_hex_id}"
            )));
        }
        *self.active.write().await = Some(normalized);
        Ok(())
    }

    async fn personal_sign(
        &self,
        message: &str,
        _address: &str,
    ) -> Result<String, ProviderError> {
        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| ProviderError::Rpc(e.to_string()))?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }

    async fn send_transaction(&self, call: EvmCall) -> Result<String, ProviderError> {
        let chain = self
            .active
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::Rpc("no active chain selected".to_string()))?;
        let rpc_url = self
            .endpoints
            .get(&chain)
            .cloned()
            .ok_or_else(|| {
                ProviderError::Unavailable(format!("no RPC endpoint configured for chain {chain}"))
            })?;

        let to: Address = call
            .to
            .parse()
            .map_err(|e| ProviderError::Rpc(format!("invalid call target: {e}")))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(self.signer.clone()))
            .on_http(rpc_url);

        let mut tx = TransactionRequest::default()
            .to(to)
            .input(Bytes::from(call.data).into());
        if let Some(gas) = call.gas_limit {
            tx = tx.with_gas_limit(gas);
        }

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| ProviderError::Rpc(e.to_string()))?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ProviderError::Rpc(e.to_string()))?;

        if !receipt.status() {
            // Receipts carry no revert data, only the failed status.
            return Err(ProviderError::Reverted(Vec::new()));
        }

        Ok(format!("{:?}", receipt.transaction_hash))
    }
}

// ============================================================================
// Tests
// ============================================================================
