//! Casper wallet adapter.
//!
//! Builds the bridge-in deploy locally, has the signer approve it and
//! forwards the signed JSON through the deploy relay. The reported
//! transaction hash is the locally computed deploy hash.

use std::sync::Arc;

use alloy::primitives::U256;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use crate::address_codec::{decode_hex_32, strip_0x};
use crate::api::relay::DeployRelayClient;
use crate::casper::bytes::{ClValue, RuntimeArgs};
use crate::casper::deploy::{
    Deploy, DeployParams, StoredContractCall, BRIDGE_IN_ENTRY_POINT, DEFAULT_GAS_PRICE,
    DEFAULT_PAYMENT_MOTES, DEFAULT_TTL_MS,
};
use crate::casper::provider::CasperSigner;
use crate::contracts::ContractTable;
use crate::error::WalletError;
use crate::hash::account_hash_from_tagged_key;
use crate::session::SharedSession;
use crate::types::{BridgeInSignature, CancelSignature, TxSubmission};
use crate::wallet::Wallet;

#[derive(Debug, Clone)]
pub struct CasperWalletConfig {
    /// Motes paid for bridge contract calls.
    pub payment_motes: u64,
    /// Node address the relay forwards deploys to.
    pub rpc_node_address: String,
}

impl CasperWalletConfig {
    pub fn new(rpc_node_address: &str) -> Self {
        Self {
            payment_motes: DEFAULT_PAYMENT_MOTES,
            rpc_node_address: rpc_node_address.to_string(),
        }
    }
}

/// Bridge wallet over a Casper signer and the deploy relay.
pub struct CasperWalletAdapter {
    signer: Arc<dyn CasperSigner>,
    relay: DeployRelayClient,
    contracts: Arc<ContractTable>,
    session: SharedSession,
    config: CasperWalletConfig,
    /// One deploy is built and signed at a time.
    signing: Mutex<()>,
}

impl CasperWalletAdapter {
    pub fn new(
        signer: Arc<dyn CasperSigner>,
        relay: DeployRelayClient,
        contracts: Arc<ContractTable>,
        session: SharedSession,
        config: CasperWalletConfig,
    ) -> Self {
        Self {
            signer,
            relay,
            contracts,
            session,
            config,
            signing: Mutex::new(()),
        }
    }
}

fn parse_u256(value: &str, field: &'static str) -> Result<U256, WalletError> {
    U256::from_str_radix(value, 10).map_err(|_| WalletError::InvalidPayload { field })
}

#[async_trait]
impl Wallet for CasperWalletAdapter {
    async fn connect(&self) -> Result<String, WalletError> {
        if !self.signer.is_connected().await? {
            self.signer.request_connection().await?;
        }
        Ok(self.signer.active_public_key().await?)
    }

    async fn address(&self) -> Result<String, WalletError> {
        let public_key = self.signer.active_public_key().await?;
        account_hash_from_tagged_key(&public_key)
            .map_err(|e| WalletError::Signing(e.to_string()))
    }

    async fn sign(&self, message: &str) -> Result<String, WalletError> {
        let public_key = self.signer.active_public_key().await?;
        Ok(self.signer.sign_message(message, &public_key).await?)
    }

    async fn send_transaction(
        &self,
        signature: &BridgeInSignature,
    ) -> Result<TxSubmission, WalletError> {
        let _guard = self.signing.lock().await;

        let route = self
            .session
            .read()
            .await
            .route()
            .cloned()
            .ok_or(WalletError::InvalidPayload { field: "route" })?;
        let deployment = self
            .contracts
            .get(&route.sender.name)
            .ok_or(WalletError::InvalidPayload {
                field: "sender network",
            })?;

        let token_contract = decode_hex_32(&deployment.token_contract)
            .map_err(|_| WalletError::InvalidPayload {
                field: "token contract",
            })?;
        let bridge_contract = decode_hex_32(&deployment.bridge_contract)
            .map_err(|_| WalletError::InvalidPayload {
                field: "bridge contract",
            })?;

        let amount = parse_u256(&signature.amount, "amount")?;
        let gas_commission = parse_u256(&signature.gas_commission, "gasComission")?;
        let deadline = parse_u256(&signature.deadline, "deadline")?;
        let signature_bytes = hex::decode(strip_0x(&signature.signature))
            .map_err(|_| WalletError::InvalidPayload { field: "signature" })?;

        // Argument order is part of the hashed deploy body.
        let args = RuntimeArgs::new()
            .with("token_contract", ClValue::ByteArray(token_contract.to_vec()))
            .with("amount", ClValue::U256(amount))
            .with("gas_commission", ClValue::U256(gas_commission))
            .with("deadline", ClValue::U256(deadline))
            .with("nonce", ClValue::U128(signature.nonce as u128))
            .with(
                "destination_chain",
                ClValue::String(signature.destination.network_name.clone()),
            )
            .with(
                "destination_address",
                ClValue::String(signature.destination.address.clone()),
            )
            .with("signature", ClValue::ByteArray(signature_bytes));

        let public_key = self.signer.active_public_key().await?;
        let deploy = Deploy::build(DeployParams {
            account_public_key: public_key.clone(),
            chain_name: route.sender.name.clone(),
            payment_motes: self.config.payment_motes,
            session: StoredContractCall {
                contract_hash: bridge_contract,
                entry_point: BRIDGE_IN_ENTRY_POINT.to_string(),
                args,
            },
            timestamp: Utc::now(),
            ttl_ms: DEFAULT_TTL_MS,
            gas_price: DEFAULT_GAS_PRICE,
        })
        .map_err(|e| WalletError::Signing(e.to_string()))?;

        let signed = self.signer.sign_deploy(deploy.to_json(), &public_key).await?;
        self.relay
            .bridge_in(&signed, &self.config.rpc_node_address)
            .await?;

        info!(deploy = %deploy.hash_hex(), chain = %route.sender.name, "bridge-in deploy relayed");
        Ok(TxSubmission::new(deploy.hash_hex()))
    }

    async fn cancel_transaction(
        &self,
        _signature: &CancelSignature,
    ) -> Result<TxSubmission, WalletError> {
        Err(WalletError::NotImplemented("cancellation"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casper::provider::LocalCasperSigner;
    use crate::session::shared_session;
    use crate::types::ChainAddress;
    use url::Url;

    fn adapter() -> CasperWalletAdapter {
        let relay = DeployRelayClient::new(&Url::parse("http://localhost:9").unwrap()).unwrap();
        CasperWalletAdapter::new(
            Arc::new(LocalCasperSigner::from_ed25519_seed(&[0x01; 32])),
            relay,
            Arc::new(ContractTable::new()),
            shared_session(),
            CasperWalletConfig::new("http://localhost:7777/rpc"),
        )
    }

    #[tokio::test]
    async fn connect_returns_the_tagged_public_key() {
        let adapter = adapter();
        let key = adapter.connect().await.unwrap();
        assert!(key.starts_with("01"));
        assert_eq!(key.len(), 2 + 64);
    }

    #[tokio::test]
    async fn address_is_the_account_hash() {
        let adapter = adapter();
        let key = adapter.connect().await.unwrap();
        let address = adapter.address().await.unwrap();
        assert_eq!(address, account_hash_from_tagged_key(&key).unwrap());
        assert_eq!(address.len(), 64);
    }

    #[tokio::test]
    async fn transfers_require_an_active_route() {
        let adapter = adapter();
        let signature = BridgeInSignature {
            token: "CSPR".to_string(),
            amount: "1".to_string(),
            gas_commission: "0".to_string(),
            destination: ChainAddress::new("0xabc", "GOERLI"),
            deadline: "9999999999".to_string(),
            nonce: 1,
            signature: "deadbeef".to_string(),
        };
        assert!(matches!(
            adapter.send_transaction(&signature).await.unwrap_err(),
            WalletError::InvalidPayload { field: "route" }
        ));
    }

    #[tokio::test]
    async fn cancellation_is_not_supported() {
        let adapter = adapter();
        let signature = CancelSignature {
            status: "OK".to_string(),
            nonce: 1,
            signature: "deadbeef".to_string(),
            token: "hash".to_string(),
            recipient: "hash".to_string(),
            commission: "0".to_string(),
            amount: "1".to_string(),
        };
        assert!(matches!(
            adapter.cancel_transaction(&signature).await.unwrap_err(),
            WalletError::NotImplemented(_)
        ));
    }
}
