//! Transfer orchestration.
//!
//! Drives a cross-chain transfer end to end: validate the request,
//! estimate the fee, obtain the gateway's bridge-in signature once and
//! hand it to the sender chain's wallet adapter. Also drives
//! cancellation of waiting transfers and paginated history, both gated on
//! the wallet's authentication proof.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use crate::address_codec::{strip_account_hash_tag, tag_account_hash, validate_amount, validate_for};
use crate::api::networks::DirectoryApi;
use crate::api::transfers::TransferApi;
use crate::error::TransferError;
use crate::session::{SharedSession, TransferRoute};
use crate::types::{
    BridgeInSignature, ChainAddress, ChainDescriptor, ChainFamily, SignatureRequest,
    TransferEstimate, TransferPage, TransferPagination, TxSubmission,
};
use crate::wallet::WalletService;

/// History page size when the caller does not override it.
pub const DEFAULT_PAGE_LIMIT: u32 = 5;

// ============================================================================
// Phases
// ============================================================================

/// Where the active transfer stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Idle,
    Estimating,
    AwaitingSignature,
    AwaitingChainConfirmation,
    RequestingCancelSignature,
    Submitted,
    Canceled,
    Failed,
}

impl TransferPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferPhase::Idle => "IDLE",
            TransferPhase::Estimating => "ESTIMATING",
            TransferPhase::AwaitingSignature => "AWAITING_SIGNATURE",
            TransferPhase::AwaitingChainConfirmation => "AWAITING_CHAIN_CONFIRMATION",
            TransferPhase::RequestingCancelSignature => "REQUESTING_CANCEL_SIGNATURE",
            TransferPhase::Submitted => "SUBMITTED",
            TransferPhase::Canceled => "CANCELED",
            TransferPhase::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User inputs starting a transfer.
#[derive(Debug, Clone)]
pub struct EstimateParams {
    pub sender_chain_id: u32,
    pub recipient_chain_id: u32,
    pub recipient_address: String,
    pub amount: String,
}

/// Validated inputs held between estimate and signature request.
#[derive(Debug, Clone)]
struct PendingTransfer {
    amount: String,
    recipient_address: String,
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct TransferOrchestrator {
    directory: Arc<dyn DirectoryApi>,
    transfers: Arc<dyn TransferApi>,
    wallets: Arc<WalletService>,
    session: SharedSession,
    phase: RwLock<TransferPhase>,
    chains: RwLock<Arc<Vec<ChainDescriptor>>>,
    pending: RwLock<Option<PendingTransfer>>,
    page_limit: u32,
}

impl TransferOrchestrator {
    pub fn new(
        directory: Arc<dyn DirectoryApi>,
        transfers: Arc<dyn TransferApi>,
        wallets: Arc<WalletService>,
    ) -> Self {
        let session = wallets.session().clone();
        Self {
            directory,
            transfers,
            wallets,
            session,
            phase: RwLock::new(TransferPhase::Idle),
            chains: RwLock::new(Arc::new(Vec::new())),
            pending: RwLock::new(None),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    pub async fn phase(&self) -> TransferPhase {
        *self.phase.read().await
    }

    async fn set_phase(&self, next: TransferPhase) {
        let mut phase = self.phase.write().await;
        if *phase != next {
            info!(from = %*phase, to = %next, "transfer phase");
            *phase = next;
        }
    }

    /// Connected chains, fetched once and cached.
    pub async fn chains(&self) -> Result<Arc<Vec<ChainDescriptor>>, TransferError> {
        {
            let cached = self.chains.read().await;
            if !cached.is_empty() {
                return Ok(cached.clone());
            }
        }
        self.refresh_chains().await
    }

    /// Replaces the cached chain directory wholesale.
    pub async fn refresh_chains(&self) -> Result<Arc<Vec<ChainDescriptor>>, TransferError> {
        let chains = Arc::new(self.directory.connected_chains().await?);
        *self.chains.write().await = chains.clone();
        Ok(chains)
    }

    async fn chain_by_id(&self, chain_id: u32) -> Result<ChainDescriptor, TransferError> {
        self.chains()
            .await?
            .iter()
            .find(|chain| chain.id == chain_id)
            .cloned()
            .ok_or_else(|| TransferError::UnsupportedDestination(chain_id.to_string()))
    }

    // ========================================================================
    // Transfer flow
    // ========================================================================

    /// Validates a prospective transfer and returns the gateway's fee
    /// estimate. On success the transfer is ready for
    /// [`request_signature`](Self::request_signature).
    pub async fn estimate(
        &self,
        params: &EstimateParams,
    ) -> Result<TransferEstimate, TransferError> {
        if params.sender_chain_id == params.recipient_chain_id {
            return Err(TransferError::SameChainTransfer);
        }
        if !validate_amount(&params.amount) {
            return Err(TransferError::InvalidAmount(params.amount.clone()));
        }

        let sender = self.chain_by_id(params.sender_chain_id).await?;
        if !self.session.read().await.is_connected(sender.family) {
            return Err(TransferError::NotConnected(sender.family));
        }
        let recipient = self.chain_by_id(params.recipient_chain_id).await?;
        if !validate_for(
            recipient.family,
            strip_account_hash_tag(&params.recipient_address),
        ) {
            return Err(TransferError::InvalidRecipient {
                family: recipient.family,
            });
        }

        self.set_phase(TransferPhase::Estimating).await;
        self.session.write().await.set_route(TransferRoute {
            sender: sender.clone(),
            recipient: recipient.clone(),
        });
        *self.pending.write().await = Some(PendingTransfer {
            amount: params.amount.clone(),
            recipient_address: params.recipient_address.clone(),
        });

        let result = self.estimate_inner(&sender, &recipient, &params.amount).await;
        match &result {
            Ok(_) => self.set_phase(TransferPhase::AwaitingSignature).await,
            Err(_) => self.set_phase(TransferPhase::Failed).await,
        }
        result
    }

    async fn estimate_inner(
        &self,
        sender: &ChainDescriptor,
        recipient: &ChainDescriptor,
        amount: &str,
    ) -> Result<TransferEstimate, TransferError> {
        let tokens = self.directory.supported_tokens(sender.id).await?;
        let token = tokens
            .first()
            .ok_or(TransferError::NoSupportedTokens(sender.id))?;
        // The estimate endpoint addresses chains by name.
        Ok(self
            .transfers
            .estimate(&sender.name, &recipient.name, token.id, amount)
            .await?)
    }

    /// Requests the bridge-in signature for the estimated transfer. The
    /// signature is obtained once and carried to submission.
    pub async fn request_signature(&self) -> Result<BridgeInSignature, TransferError> {
        if self.phase().await != TransferPhase::AwaitingSignature {
            return Err(TransferError::NoActiveTransfer);
        }
        let route = self
            .session
            .read()
            .await
            .route()
            .cloned()
            .ok_or(TransferError::NoActiveTransfer)?;
        let pending = self
            .pending
            .read()
            .await
            .clone()
            .ok_or(TransferError::NoActiveTransfer)?;

        let result = self.request_signature_inner(&route, &pending).await;
        if result.is_err() {
            self.set_phase(TransferPhase::Failed).await;
        }
        result
    }

    async fn request_signature_inner(
        &self,
        route: &TransferRoute,
        pending: &PendingTransfer,
    ) -> Result<BridgeInSignature, TransferError> {
        let sender_address = self.wallets.address(route.sender.family).await?;
        let tokens = self.directory.supported_tokens(route.sender.id).await?;
        let token = tokens
            .first()
            .ok_or(TransferError::NoSupportedTokens(route.sender.id))?;

        let recipient_address = match route.recipient.family {
            ChainFamily::Casper => tag_account_hash(&pending.recipient_address),
            ChainFamily::Evm => pending.recipient_address.clone(),
        };
        let request = SignatureRequest {
            sender: ChainAddress::new(sender_address, route.sender.name.clone()),
            token_id: token.id,
            amount: pending.amount.clone(),
            destination: ChainAddress::new(recipient_address, route.recipient.name.clone()),
        };

        let signature = self.transfers.bridge_in_signature(&request).await?;
        ensure_deadline(&signature.deadline)?;
        Ok(signature)
    }

    /// Hands the signed transfer to the sender chain's wallet.
    pub async fn submit(
        &self,
        signature: &BridgeInSignature,
    ) -> Result<TxSubmission, TransferError> {
        if self.phase().await != TransferPhase::AwaitingSignature {
            return Err(TransferError::NoActiveTransfer);
        }
        if let Err(expired) = ensure_deadline(&signature.deadline) {
            self.set_phase(TransferPhase::Failed).await;
            return Err(expired);
        }
        let route = self
            .session
            .read()
            .await
            .route()
            .cloned()
            .ok_or(TransferError::NoActiveTransfer)?;

        self.set_phase(TransferPhase::AwaitingChainConfirmation).await;
        match self
            .wallets
            .send_transaction(route.sender.family, signature)
            .await
        {
            Ok(submission) => {
                self.set_phase(TransferPhase::Submitted).await;
                info!(tx = %submission.hash, "transfer submitted");
                Ok(submission)
            }
            Err(err) => {
                self.set_phase(TransferPhase::Failed).await;
                Err(err.into())
            }
        }
    }

    /// Runs the whole flow: estimate, request the signature, submit.
    pub async fn transfer(
        &self,
        params: &EstimateParams,
    ) -> Result<TxSubmission, TransferError> {
        let estimate = self.estimate(params).await?;
        info!(fee = %estimate.fee, time = %estimate.estimated_confirmation_time,
            "transfer estimated");
        let signature = self.request_signature().await?;
        self.submit(&signature).await
    }

    /// Abandons the active transfer, if any.
    pub async fn reset(&self) {
        *self.pending.write().await = None;
        self.session.write().await.clear_route();
        self.set_phase(TransferPhase::Idle).await;
    }

    // ========================================================================
    // Cancellation and history
    // ========================================================================

    /// Cancels a waiting transfer on its source chain. Requires a
    /// connected, authenticated wallet for the family.
    pub async fn cancel(
        &self,
        family: ChainFamily,
        transfer_id: u64,
        chain_id: u32,
    ) -> Result<TxSubmission, TransferError> {
        if family == ChainFamily::Casper {
            return Err(TransferError::CancelNotImplemented { family });
        }

        let (identity, proof) = {
            let state = self.session.read().await;
            let session = state
                .session(family)
                .ok_or(TransferError::NotConnected(family))?;
            let proof = session
                .auth_signature
                .clone()
                .filter(|signature| !signature.is_empty())
                .ok_or(TransferError::NotConnected(family))?;
            (session.identity.clone(), proof)
        };

        let chain = self.chain_by_id(chain_id).await?;
        // The cancel call runs entirely on the transfer's source chain.
        self.session.write().await.set_route(TransferRoute {
            sender: chain.clone(),
            recipient: chain,
        });

        self.set_phase(TransferPhase::RequestingCancelSignature).await;
        let signature = match self
            .transfers
            .cancel_signature(transfer_id, chain_id, &proof, &identity)
            .await
        {
            Ok(signature) => signature,
            Err(err) => {
                self.set_phase(TransferPhase::Failed).await;
                return Err(err.into());
            }
        };

        self.set_phase(TransferPhase::AwaitingChainConfirmation).await;
        match self.wallets.cancel_transaction(family, &signature).await {
            Ok(submission) => {
                self.set_phase(TransferPhase::Canceled).await;
                info!(transfer_id, tx = %submission.hash, "transfer cancelled");
                Ok(submission)
            }
            Err(err) => {
                self.set_phase(TransferPhase::Failed).await;
                Err(err.into())
            }
        }
    }

    /// Page of the wallet's transfer history. Without an authentication
    /// proof there is nothing to key history by, so an empty page is
    /// returned without calling the gateway.
    pub async fn history(
        &self,
        family: ChainFamily,
        chain_id: u32,
        page: u32,
    ) -> Result<TransferPage, TransferError> {
        let (identity, proof) = {
            let state = self.session.read().await;
            match state.session(family) {
                Some(session) => (
                    session.identity.clone(),
                    session.auth_signature.clone().unwrap_or_default(),
                ),
                None => (String::new(), String::new()),
            }
        };
        if proof.is_empty() {
            return Ok(TransferPage {
                transfers: Vec::new(),
                offset: 0,
                limit: u64::from(self.page_limit),
                total_count: 0,
            });
        }

        let pub_key = match family {
            // The gateway keys EVM history by the proof signature itself.
            ChainFamily::Evm => proof.clone(),
            ChainFamily::Casper => identity,
        };
        let pagination = TransferPagination {
            signature: proof,
            pub_key,
            chain_id,
            offset: u64::from(page) * u64::from(self.page_limit),
            limit: u64::from(self.page_limit),
        };
        Ok(self.transfers.history(&pagination).await?)
    }
}

/// Rejects bridge-in signatures whose unix-second deadline has passed.
fn ensure_deadline(deadline: &str) -> Result<(), TransferError> {
    let expires: i64 = deadline
        .parse()
        .map_err(|_| TransferError::BadSignaturePayload { field: "deadline" })?;
    if expires <= Utc::now().timestamp() {
        return Err(TransferError::SignatureExpired {
            deadline: deadline.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
