//! Deploy relay client.
//!
//! Casper deploys are not sent to a node directly: the signed deploy JSON
//! is posted to a relay service which forwards it to the configured node.
//! The deploy travels as a JSON *string* field next to the node address.

use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;

use crate::api::{check_status, http_client};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
struct RelaySubmission<'a> {
    deploy: &'a str,
    #[serde(rename = "rpcNodeAddress")]
    rpc_node_address: &'a str,
}

/// Client for the deploy relay. Unlike the gateway clients the relay root
/// is used as-is, without the `/api/v0` prefix.
#[derive(Debug, Clone)]
pub struct DeployRelayClient {
    client: Client,
    root: String,
}

impl DeployRelayClient {
    pub fn new(relay: &Url) -> Result<Self, ApiError> {
        Ok(Self {
            client: http_client()?,
            root: relay.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Forwards a signed bridge-in deploy to the node behind the relay.
    pub async fn bridge_in(
        &self,
        deploy: &serde_json::Value,
        rpc_node_address: &str,
    ) -> Result<(), ApiError> {
        self.submit("bridge-in", deploy, rpc_node_address).await
    }

    /// Forwards a signed transfer-out deploy to the node behind the relay.
    pub async fn transfer_out(
        &self,
        deploy: &serde_json::Value,
        rpc_node_address: &str,
    ) -> Result<(), ApiError> {
        self.submit("transfer-out", deploy, rpc_node_address).await
    }

    async fn submit(
        &self,
        endpoint: &str,
        deploy: &serde_json::Value,
        rpc_node_address: &str,
    ) -> Result<(), ApiError> {
        let url = format!("{}/{}", self.root, endpoint);
        let deploy_json = serde_json::to_string(deploy)?;
        debug!(%url, rpc_node_address, "relaying signed deploy");
        let response = self
            .client
            .post(&url)
            .json(&RelaySubmission {
                deploy: &deploy_json,
                rpc_node_address,
            })
            .send()
            .await?;
        check_status(response).await
    }
}
