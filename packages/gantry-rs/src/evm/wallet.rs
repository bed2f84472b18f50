//! EVM wallet adapter.
//!
//! Drives a bridge-in through an [`EvmProvider`]: switches the provider to
//! the sender chain, approves the bridge for the transfer amount and
//! submits the signed `bridgeIn` call. Cancellation submits `transferOut`
//! on the chain the transfer started from.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::address_codec::strip_0x;
use crate::contracts::ContractTable;
use crate::error::{ProviderError, WalletError};
use crate::evm::contracts::{decode_revert, GantryBridge, ERC20};
use crate::evm::provider::{EvmCall, EvmProvider};
use crate::session::SharedSession;
use crate::types::{BridgeInSignature, CancelSignature, TxSubmission};
use crate::wallet::{Wallet, METAMASK_INSTALL_URL};

/// Gas limit applied to approve and bridge-in calls when the deployment
/// configuration does not override it.
pub const DEFAULT_GAS_LIMIT: u64 = 250_000;

/// Adapter configuration: which registered provider to drive and how.
#[derive(Debug, Clone)]
pub struct EvmWalletConfig {
    /// Name of the provider to select, matched case-insensitively.
    pub provider_name: String,
    /// Where to send the user when the provider is missing.
    pub install_url: String,
    /// Gas limit for approve and bridge-in calls. Cancellations let the
    /// provider estimate instead.
    pub gas_limit: u64,
}

impl Default for EvmWalletConfig {
    fn default() -> Self {
        Self {
            provider_name: "metamask".to_string(),
            install_url: METAMASK_INSTALL_URL.to_string(),
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }
}

/// Bridge wallet over an EVM provider.
pub struct EvmWalletAdapter {
    providers: Vec<Arc<dyn EvmProvider>>,
    config: EvmWalletConfig,
    contracts: Arc<ContractTable>,
    session: SharedSession,
    /// Transfers mutate provider chain state, so only one runs at a time.
    signing: Mutex<()>,
}

impl EvmWalletAdapter {
    pub fn new(
        config: EvmWalletConfig,
        contracts: Arc<ContractTable>,
        session: SharedSession,
    ) -> Self {
        Self {
            providers: Vec::new(),
            config,
            contracts,
            session,
            signing: Mutex::new(()),
        }
    }

    pub fn register_provider(&mut self, provider: Arc<dyn EvmProvider>) {
        self.providers.push(provider);
    }

    pub fn with_provider(mut self, provider: Arc<dyn EvmProvider>) -> Self {
        self.register_provider(provider);
        self
    }

    /// The configured provider, or where to install it.
    fn provider(&self) -> Result<&Arc<dyn EvmProvider>, WalletError> {
        self.providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(&self.config.provider_name))
            .ok_or_else(|| WalletError::NotInstalled {
                install_url: self.config.install_url.clone(),
            })
    }
}

fn parse_u256(value: &str, field: &'static str) -> Result<U256, WalletError> {
    U256::from_str_radix(value, 10).map_err(|_| WalletError::InvalidPayload { field })
}

fn parse_address(value: &str, field: &'static str) -> Result<Address, WalletError> {
    value
        .parse()
        .map_err(|_| WalletError::InvalidPayload { field })
}

#[async_trait]
impl Wallet for EvmWalletAdapter {
    async fn connect(&self) -> Result<String, WalletError> {
        let provider = self.provider()?;
        let accounts = provider.request_accounts().await?;
        accounts.into_iter().next().ok_or_else(|| {
            WalletError::Provider("provider returned no accounts".to_string())
        })
    }

    async fn address(&self) -> Result<String, WalletError> {
        let provider = self.provider()?;
        Ok(provider.selected_address().await?)
    }

    async fn sign(&self, message: &str) -> Result<String, WalletError> {
        let provider = self.provider()?;
        let address = provider.selected_address().await?;
        Ok(provider.personal_sign(message, &address).await?)
    }

    async fn send_transaction(
        &self,
        signature: &BridgeInSignature,
    ) -> Result<TxSubmission, WalletError> {
        let _guard = self.signing.lock().await;
        let provider = self.provider()?;

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
        let chain_hex_id = deployment
            .chain_hex_id
            .as_deref()
            .ok_or(WalletError::InvalidPayload { field: "chain id" })?;

        let amount = parse_u256(&signature.amount, "amount")?;
        let gas_commission = parse_u256(&signature.gas_commission, "gasComission")?;
        let deadline = parse_u256(&signature.deadline, "deadline")?;
        let signature_bytes = hex::decode(strip_0x(&signature.signature))
            .map_err(|_| WalletError::InvalidPayload { field: "signature" })?;
        // The on-chain token is the deployment for the sender chain, not
        // whatever identifier the gateway echoed back.
        let token = parse_address(&deployment.token_contract, "token contract")?;
        let bridge = parse_address(&deployment.bridge_contract, "bridge contract")?;

        provider.switch_chain(chain_hex_id).await?;

        debug!(chain = %route.sender.name, %amount, "approving bridge spend");
        let approve = EvmCall {
            to: deployment.token_contract.clone(),
            data: ERC20::approveCall {
                spender: bridge,
                amount,
            }
            .abi_encode(),
            gas_limit: Some(self.config.gas_limit),
        };
        provider.send_transaction(approve).await?;

        let call = GantryBridge::bridgeInCall {
            token,
            amount,
            gasCommission: gas_commission,
            destinationChain: signature.destination.network_name.clone(),
            destinationAddress: signature.destination.address.clone(),
            deadline,
            nonce: U256::from(signature.nonce),
            signature: signature_bytes.into(),
        };
        let submission = EvmCall {
            to: deployment.bridge_contract.clone(),
            data: call.abi_encode(),
            gas_limit: Some(self.config.gas_limit),
        };
        let hash = match provider.send_transaction(submission).await {
            Ok(hash) => hash,
            Err(ProviderError::Reverted(data)) => {
                return Err(decode_revert(&data, signature.nonce))
            }
            Err(other) => return Err(other.into()),
        };

        info!(tx = %hash, chain = %route.sender.name, "bridge-in confirmed");
        Ok(TxSubmission::new(hash))
    }

    async fn cancel_transaction(
        &self,
        signature: &CancelSignature,
    ) -> Result<TxSubmission, WalletError> {
        let _guard = self.signing.lock().await;
        let provider = self.provider()?;

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
        let chain_hex_id = deployment
            .chain_hex_id
            .as_deref()
            .ok_or(WalletError::InvalidPayload { field: "chain id" })?;

        let amount = parse_u256(&signature.amount, "amount")?;
        let commission = parse_u256(&signature.commission, "commission")?;
        let token = parse_address(&signature.token, "token")?;
        let recipient = parse_address(&signature.recipient, "recipient")?;
        let signature_bytes = hex::decode(strip_0x(&signature.signature))
            .map_err(|_| WalletError::InvalidPayload { field: "signature" })?;

        provider.switch_chain(chain_hex_id).await?;

        let call = GantryBridge::transferOutCall {
            token,
            recipient,
            amount,
            commission,
            nonce: U256::from(signature.nonce),
            signature: signature_bytes.into(),
        };
        let submission = EvmCall {
            to: deployment.bridge_contract.clone(),
            data: call.abi_encode(),
            gas_limit: None,
        };
        let hash = match provider.send_transaction(submission).await {
            Ok(hash) => hash,
            Err(ProviderError::Reverted(data)) => {
                return Err(decode_revert(&data, signature.nonce))
            }
            Err(other) => return Err(other.into()),
        };

        info!(tx = %hash, chain = %route.sender.name, "transfer cancellation confirmed");
        Ok(TxSubmission::new(hash))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::shared_session;

    struct IdleProvider {
        name: &'static str,
        accounts: Vec<String>,
    }

    #[async_trait]
    impl EvmProvider for IdleProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
            Ok(self.accounts.clone())
        }

        async fn selected_address(&self) -> Result<String, ProviderError> {
            Ok(self.accounts.first().cloned().unwrap_or_default())
        }

        async fn switch_chain(&self, _chain_hex_id: &str) -> Result<(), ProviderError> {
            Ok(())
        }

        async fn personal_sign(
            &self,
            _message: &str,
            _address: &str,
        ) -> Result<String, ProviderError> {
            Ok("0xsigned".to_string())
        }

        async fn send_transaction(&self, _call: EvmCall) -> Result<String, ProviderError> {
            Err(ProviderError::Unavailable("not wired in this test".to_string()))
        }
    }

    fn adapter_with(provider: IdleProvider) -> EvmWalletAdapter {
        EvmWalletAdapter::new(
            EvmWalletConfig::default(),
            Arc::new(ContractTable::new()),
            shared_session(),
        )
        .with_provider(Arc::new(provider))
    }

    #[tokio::test]
    async fn missing_provider_points_at_install_url() {
        let adapter = adapter_with(IdleProvider {
            name: "other-wallet",
            accounts: vec![],
        });
        match adapter.connect().await.unwrap_err() {
            WalletError::NotInstalled { install_url } => {
                assert_eq!(install_url, METAMASK_INSTALL_URL)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn provider_name_matches_case_insensitively() {
        let adapter = adapter_with(IdleProvider {
            name: "MetaMask",
            accounts: vec!["0xabc".to_string()],
        });
        assert_eq!(adapter.connect().await.unwrap(), "0xabc");
    }

    #[tokio::test]
    async fn connect_rejects_empty_account_lists() {
        let adapter = adapter_with(IdleProvider {
            name: "metamask",
            accounts: vec![],
        });
        assert!(matches!(
            adapter.connect().await.unwrap_err(),
            WalletError::Provider(_)
        ));
    }

    #[tokio::test]
    async fn transfers_require_an_active_route() {
        let adapter = adapter_with(IdleProvider {
            name: "metamask",
            accounts: vec!["0xabc".to_string()],
        });
        let signature = BridgeInSignature {
            token: "0x0000000000000000000000000000000000000001".to_string(),
            amount: "1".to_string(),
            gas_commission: "0".to_string(),
            destination: crate::types::ChainAddress::new("addr", "CASPER-TEST"),
            deadline: "9999999999".to_string(),
            nonce: 1,
            signature: "0xdead".to_string(),
        };
        assert!(matches!(
            adapter.send_transaction(&signature).await.unwrap_err(),
            WalletError::InvalidPayload { field: "route" }
        ));
    }

    #[test]
    fn amounts_parse_as_base_ten() {
        assert_eq!(parse_u256("250000", "amount").unwrap(), U256::from(250_000u64));
        assert!(parse_u256("0x10", "amount").is_err());
        assert!(parse_u256("", "amount").is_err());
        assert!(parse_u256("12.5", "amount").is_err());
    }
}
