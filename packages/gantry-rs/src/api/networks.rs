//! Chain and token directory endpoints.

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::api::{decode_or_error, gateway_root, http_client};
use crate::error::ApiError;
use crate::types::{ChainDescriptor, Token};

/// Read access to the gateway's directory of connected chains and the
/// tokens each chain supports.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn connected_chains(&self) -> Result<Vec<ChainDescriptor>, ApiError>;

    async fn supported_tokens(&self, chain_id: u32) -> Result<Vec<Token>, ApiError>;
}

/// Directory client backed by the bridge gateway REST API.
#[derive(Debug, Clone)]
pub struct BridgeDirectoryClient {
    client: Client,
    root: String,
}

impl BridgeDirectoryClient {
    pub fn new(gateway: &Url) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client()?,
            root: gateway_root(gateway),
        })
    }
}

#[async_trait]
impl DirectoryApi for BridgeDirectoryClient {
    async fn connected_chains(&self) -> Result<Vec<ChainDescriptor>, ApiError> {
        let url = format!("{}/networks", self.root);
        debug!(%url, "fetching connected chains");
        let response = self.client.get(&url).send().await?;
        decode_or_error(response).await
    }

    async fn supported_tokens(&self, chain_id: u32) -> Result<Vec<Token>, ApiError> {
        let url = format!("{}/networks/{}/supported-tokens", self.root, chain_id);
        debug!(%url, chain_id, "fetching supported tokens");
        let response = self.client.get(&url).send().await?;
        decode_or_error(response).await
    }
}
