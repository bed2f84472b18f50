//! Transfer protocol endpoints: fee estimates, bridge-in signatures,
//! cancellation signatures and paginated history.

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::api::{check_status, decode_or_error, gateway_root, http_client};
use crate::error::ApiError;
use crate::types::{
    BridgeInSignature, CancelSignature, SignatureRequest, TransferEstimate, TransferPage,
    TransferPagination,
};

/// Transfer lifecycle operations against the gateway.
#[async_trait]
pub trait TransferApi: Send + Sync {
    /// Fee and confirmation-time estimate for a prospective transfer.
    /// Chains are addressed by name here, not by numeric id.
    async fn estimate(
        &self,
        sender_network: &str,
        recipient_network: &str,
        token_id: u32,
        amount: &str,
    ) -> Result<TransferEstimate, ApiError>;

    /// Signature authorizing a bridge-in call on the sender chain.
    async fn bridge_in_signature(
        &self,
        request: &SignatureRequest,
    ) -> Result<BridgeInSignature, ApiError>;

    /// Signature authorizing cancellation of a waiting transfer.
    async fn cancel_signature(
        &self,
        transfer_id: u64,
        chain_id: u32,
        signature: &str,
        public_key: &str,
    ) -> Result<CancelSignature, ApiError>;

    /// Page of the caller's transfer history, proven by their
    /// authentication signature.
    async fn history(&self, page: &TransferPagination) -> Result<TransferPage, ApiError>;
}

/// Transfer client backed by the bridge gateway REST API.
#[derive(Debug, Clone)]
pub struct TransferProtocolClient {
    client: Client,
    root: String,
}

impl TransferProtocolClient {
    pub fn new(gateway: &Url) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client()?,
            root: gateway_root(gateway),
        })
    }

    /// Deletes a pending transfer record on the gateway. This is the
    /// record-level cancellation; returning escrowed funds goes through
    /// [`cancel_signature`](TransferApi::cancel_signature) and the wallet.
    pub async fn cancel_transfer(
        &self,
        transfer_id: u64,
        signature: &str,
        public_key: &str,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/transfers/{}/{}/{}",
            self.root, transfer_id, signature, public_key
        );
        debug!(transfer_id, "deleting transfer record");
        let response = self.client.delete(&url).send().await?;
        check_status(response).await
    }
}

#[async_trait]
impl TransferApi for TransferProtocolClient {
    async fn estimate(
        &self,
        sender_network: &str,
        recipient_network: &str,
        token_id: u32,
        amount: &str,
    ) -> Result<TransferEstimate, ApiError> {
        let url = format!(
            "{}/transfers/estimate/{}/{}/{}/{}",
            self.root, sender_network, recipient_network, token_id, amount
        );
        debug!(%url, "requesting transfer estimate");
        let response = self.client.get(&url).send().await?;
        decode_or_error(response).await
    }

    async fn bridge_in_signature(
        &self,
        request: &SignatureRequest,
    ) -> Result<BridgeInSignature, ApiError> {
        let url = format!("{}/transfers/bridge-in-signature", self.root);
        debug!(%url, token_id = request.token_id, "requesting bridge-in signature");
        let response = self.client.post(&url).json(request).send().await?;
        decode_or_error(response).await
    }

    async fn cancel_signature(
        &self,
        transfer_id: u64,
        chain_id: u32,
        signature: &str,
        public_key: &str,
    ) -> Result<CancelSignature, ApiError> {
        let url = format!(
            "{}/transfers/cancel-signature/{}/{}/{}/{}",
            self.root, transfer_id, chain_id, signature, public_key
        );
        debug!(transfer_id, chain_id, "requesting cancel signature");
        let response = self.client.get(&url).send().await?;
        decode_or_error(response).await
    }

    async fn history(&self, page: &TransferPagination) -> Result<TransferPage, ApiError> {
        let url = format!(
            "{}/transfers/history/{}/{}",
            self.root, page.signature, page.pub_key
        );
        debug!(chain_id = page.chain_id, offset = page.offset, limit = page.limit,
            "fetching transfer history");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("network-id", page.chain_id.to_string()),
                ("offset", page.offset.to_string()),
                ("limit", page.limit.to_string()),
            ])
            .send()
            .await?;
        decode_or_error(response).await
    }
}
