//! Wallet abstraction and the service routing calls to chain adapters.
//!
//! Every supported chain family implements the same five capabilities:
//! connect, report an address, sign a message, submit a signed transfer
//! and submit a cancellation. [`WalletService`] owns one adapter per
//! family and keeps the shared session in step with wallet activity.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::WalletError;
use crate::hash::AUTH_MESSAGE;
use crate::session::SharedSession;
use crate::types::{BridgeInSignature, CancelSignature, ChainFamily, TxSubmission};

pub const METAMASK_INSTALL_URL: &str = "https://metamask.io/download/";

pub const CASPER_WALLET_INSTALL_URL: &str =
    "https://chrome.google.com/webstore/detail/casperlabs-signer/djhndpllfiibmcdbnmaaahkhchcoijce";

/// Where to send the user when no wallet is available for a family.
pub fn install_url_for(family: ChainFamily) -> &'static str {
    match family {
        ChainFamily::Evm => METAMASK_INSTALL_URL,
        ChainFamily::Casper => CASPER_WALLET_INSTALL_URL,
    }
}

/// A connected bridge wallet.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Establishes the wallet connection and returns the identity it
    /// exposes: an EVM account address or a tagged Casper public key.
    async fn connect(&self) -> Result<String, WalletError>;

    /// On-chain address transfers are received at. Differs from the
    /// connected identity on Casper, where it is the account hash.
    async fn address(&self) -> Result<String, WalletError>;

    /// Signs a human-readable message with the active account.
    async fn sign(&self, message: &str) -> Result<String, WalletError>;

    /// Executes a gateway-signed bridge-in on the sender chain.
    async fn send_transaction(
        &self,
        signature: &BridgeInSignature,
    ) -> Result<TxSubmission, WalletError>;

    /// Executes a gateway-signed cancellation, returning locked funds.
    async fn cancel_transaction(
        &self,
        signature: &CancelSignature,
    ) -> Result<TxSubmission, WalletError>;
}

// ============================================================================
// Service
// ============================================================================

/// Routes wallet calls to the adapter registered for each chain family and
/// records connections in the shared session.
pub struct WalletService {
    adapters: HashMap<ChainFamily, Arc<dyn Wallet>>,
    session: SharedSession,
}

impl WalletService {
    pub fn new(session: SharedSession) -> Self {
        Self {
            adapters: HashMap::new(),
            session,
        }
    }

    pub fn register(&mut self, family: ChainFamily, adapter: Arc<dyn Wallet>) {
        self.adapters.insert(family, adapter);
    }

    pub fn with_adapter(mut self, family: ChainFamily, adapter: Arc<dyn Wallet>) -> Self {
        self.register(family, adapter);
        self
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    fn adapter(&self, family: ChainFamily) -> Result<&Arc<dyn Wallet>, WalletError> {
        self.adapters
            .get(&family)
            .ok_or_else(|| WalletError::NotInstalled {
                install_url: install_url_for(family).to_string(),
            })
    }

    /// Connects the family's wallet and records the identity it exposed.
    pub async fn connect(&self, family: ChainFamily) -> Result<String, WalletError> {
        let identity = self.adapter(family)?.connect().await?;
        self.session
            .write()
            .await
            .set_identity(family, identity.clone());
        info!(%family, identity = %identity, "wallet connected");
        Ok(identity)
    }

    pub async fn address(&self, family: ChainFamily) -> Result<String, WalletError> {
        self.adapter(family)?.address().await
    }

    pub async fn sign(&self, family: ChainFamily, message: &str) -> Result<String, WalletError> {
        self.adapter(family)?.sign(message).await
    }

    pub async fn send_transaction(
        &self,
        family: ChainFamily,
        signature: &BridgeInSignature,
    ) -> Result<TxSubmission, WalletError> {
        self.adapter(family)?.send_transaction(signature).await
    }

    pub async fn cancel_transaction(
        &self,
        family: ChainFamily,
        signature: &CancelSignature,
    ) -> Result<TxSubmission, WalletError> {
        self.adapter(family)?.cancel_transaction(signature).await
    }

    /// Signs the authentication proof the gateway requires for history and
    /// cancellation, and stores it in the session. The wallet must be
    /// connected first.
    pub async fn authenticate(&self, family: ChainFamily) -> Result<String, WalletError> {
        if !self.session.read().await.is_connected(family) {
            return Err(WalletError::NotConnected(family));
        }
        let signature = self.sign(family, AUTH_MESSAGE).await?;
        self.session
            .write()
            .await
            .set_auth_signature(family, signature.clone());
        info!(%family, "authentication proof signed");
        Ok(signature)
    }

    /// Drops the session for the family.
    pub async fn disconnect(&self, family: ChainFamily) {
        self.session.write().await.clear(family);
        info!(%family, "wallet disconnected");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::shared_session;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubWallet {
        identity: &'static str,
        connects: AtomicUsize,
        signs: AtomicUsize,
    }

    impl StubWallet {
        fn new(identity: &'static str) -> Self {
            Self {
                identity,
                connects: AtomicUsize::new(0),
                signs: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Wallet for StubWallet {
        async fn connect(&self) -> Result<String, WalletError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(self.identity.to_string())
        }

        async fn address(&self) -> Result<String, WalletError> {
            Ok(self.identity.to_string())
        }

        async fn sign(&self, message: &str) -> Result<String, WalletError> {
            self.signs.fetch_add(1, Ordering::SeqCst);
            Ok(format!("signed:{message}"))
        }

        async fn send_transaction(
            &self,
            _signature: &BridgeInSignature,
        ) -> Result<TxSubmission, WalletError> {
            Ok(TxSubmission::new("0xhash"))
        }

        async fn cancel_transaction(
            &self,
            _signature: &CancelSignature,
        ) -> Result<TxSubmission, WalletError> {
            Ok(TxSubmission::new("0xcancel"))
        }
    }

    #[tokio::test]
    async fn connect_records_the_identity() {
        let session = shared_session();
        let service = WalletService::new(session.clone())
            .with_adapter(ChainFamily::Evm, Arc::new(StubWallet::new("0xabc")));

        assert_eq!(service.connect(ChainFamily::Evm).await.unwrap(), "0xabc");
        let state = session.read().await;
        assert_eq!(state.session(ChainFamily::Evm).unwrap().identity, "0xabc");
    }

    #[tokio::test]
    async fn unregistered_families_point_at_install_urls() {
        let service = WalletService::new(shared_session());
        match service.connect(ChainFamily::Casper).await.unwrap_err() {
            WalletError::NotInstalled { install_url } => {
                assert_eq!(install_url, CASPER_WALLET_INSTALL_URL)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn authenticate_requires_a_connection() {
        let service = WalletService::new(shared_session())
            .with_adapter(ChainFamily::Evm, Arc::new(StubWallet::new("0xabc")));

        assert!(matches!(
            service.authenticate(ChainFamily::Evm).await.unwrap_err(),
            WalletError::NotConnected(ChainFamily::Evm)
        ));
    }

    #[tokio::test]
    async fn authenticate_signs_and_stores_the_proof() {
        let session = shared_session();
        let wallet = Arc::new(StubWallet::new("0xabc"));
        let service =
            WalletService::new(session.clone()).with_adapter(ChainFamily::Evm, wallet.clone());

        service.connect(ChainFamily::Evm).await.unwrap();
        let proof = service.authenticate(ChainFamily::Evm).await.unwrap();

        assert_eq!(proof, format!("signed:{AUTH_MESSAGE}"));
        assert_eq!(wallet.signs.load(Ordering::SeqCst), 1);
        assert_eq!(
            session.read().await.auth_signature(ChainFamily::Evm),
            Some(proof.as_str())
        );
    }

    #[tokio::test]
    async fn disconnect_clears_the_session() {
        let session = shared_session();
        let service = WalletService::new(session.clone())
            .with_adapter(ChainFamily::Evm, Arc::new(StubWallet::new("0xabc")));

        service.connect(ChainFamily::Evm).await.unwrap();
        service.disconnect(ChainFamily::Evm).await;
        assert!(!session.read().await.is_connected(ChainFamily::Evm));
    }
}
