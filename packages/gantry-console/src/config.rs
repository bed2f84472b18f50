//! Console configuration.
//!
//! Loaded from environment variables; a local `.env` file is honored when
//! present. The gateway address is the only required setting. Wallets are
//! optional: commands that only read the gateway work without any key
//! material, and each chain family activates when its key is configured.
//!
//! Chain deployments use a prefix per network, e.g. `ETH_TOKEN_CONTRACT`
//! and `ETH_BRIDGE_CONTRACT` configure the GOERLI entry. A chain is only
//! added when both of its contracts are set.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;

use eyre::{eyre, Result, WrapErr};
use url::Url;

use gantry_rs::hash::KeyAlgorithm;
use gantry_rs::{ChainContracts, ContractTable};

/// Environment prefix paired with the gateway network name it configures.
const CHAIN_PREFIXES: &[(&str, &str)] = &[
    ("ETH", "GOERLI"),
    ("POLYGON", "MUMBAI"),
    ("BNB", "BNB-TEST"),
    ("AVALANCHE", "AVALANCHE-TEST"),
    ("CASPER", "CASPER-TEST"),
];

const DEFAULT_EVM_GAS_LIMIT: u64 = 250_000;

#[derive(Clone)]
pub struct Config {
    /// Bridge gateway base URL (the `/api/v0` prefix is appended by the
    /// clients).
    pub gateway_address: Url,
    /// Deploy relay base URL, required only for Casper transfers.
    pub relay_address: Option<Url>,
    /// Node address the relay forwards Casper deploys to.
    pub casper_node_address: String,
    /// Hex private key enabling the local EVM wallet.
    pub evm_private_key: Option<String>,
    /// Hex secret key enabling the local Casper wallet.
    pub casper_secret_key: Option<String>,
    pub casper_key_algorithm: KeyAlgorithm,
    /// Gas limit for approve and bridge-in calls.
    pub evm_gas_limit: u64,
    /// Contract deployments keyed by gateway network name.
    pub chains: Vec<(String, ChainContracts)>,
}

/// Custom Debug that redacts key material to prevent accidental log
/// leakage.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gateway_address", &self.gateway_address.as_str())
            .field(
                "relay_address",
                &self.relay_address.as_ref().map(Url::as_str),
            )
            .field("casper_node_address", &self.casper_node_address)
            .field(
                "evm_private_key",
                &self.evm_private_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "casper_secret_key",
                &self.casper_secret_key.as_ref().map(|_| "<redacted>"),
            )
            .field("casper_key_algorithm", &self.casper_key_algorithm)
            .field("evm_gas_limit", &self.evm_gas_limit)
            .field(
                "chains",
                &self.chains.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Config {
    /// Load configuration, reading a `.env` file first when one exists.
    pub fn load() -> Result<Self> {
        if Path::new(".env").exists() {
            dotenvy::from_filename(".env").wrap_err("failed to load .env file")?;
        }
        Self::from_env()
    }

    fn from_env() -> Result<Self> {
        let gateway_address: Url = env::var("GANTRY_GATEWAY_ADDRESS")
            .map_err(|_| eyre!("GANTRY_GATEWAY_ADDRESS environment variable is required"))?
            .parse()
            .wrap_err("GANTRY_GATEWAY_ADDRESS must be a valid URL")?;

        let relay_address = match env::var("GANTRY_RELAY_ADDRESS") {
            Ok(value) => Some(
                value
                    .parse()
                    .wrap_err("GANTRY_RELAY_ADDRESS must be a valid URL")?,
            ),
            Err(_) => None,
        };

        let mut chains = Vec::new();
        for (prefix, chain_name) in CHAIN_PREFIXES {
            let token = env::var(format!("{prefix}_TOKEN_CONTRACT")).ok();
            let bridge = env::var(format!("{prefix}_BRIDGE_CONTRACT")).ok();
            let (Some(token_contract), Some(bridge_contract)) = (token, bridge) else {
                continue;
            };
            let rpc_url = match env::var(format!("{prefix}_RPC_URL")) {
                Ok(value) => Some(
                    value
                        .parse()
                        .wrap_err_with(|| format!("{prefix}_RPC_URL must be a valid URL"))?,
                ),
                Err(_) => None,
            };
            chains.push((
                chain_name.to_string(),
                ChainContracts {
                    token_contract,
                    bridge_contract,
                    chain_hex_id: ContractTable::default_hex_id(chain_name)
                        .map(str::to_string),
                    rpc_url,
                },
            ));
        }

        Ok(Self {
            gateway_address,
            relay_address,
            casper_node_address: env::var("CASPER_NODE_ADDRESS")
                .unwrap_or_else(|_| "http://localhost:7777/rpc".to_string()),
            evm_private_key: env::var("EVM_PRIVATE_KEY").ok(),
            casper_secret_key: env::var("CASPER_SECRET_KEY").ok(),
            casper_key_algorithm: match env::var("CASPER_KEY_ALGORITHM") {
                Ok(value) => parse_key_algorithm(&value)?,
                Err(_) => KeyAlgorithm::Ed25519,
            },
            evm_gas_limit: env::var("ETH_GAS_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_EVM_GAS_LIMIT),
            chains,
        })
    }

    /// Contract table over the configured deployments.
    pub fn contract_table(&self) -> ContractTable {
        self.chains
            .iter()
            .fold(ContractTable::new(), |table, (name, contracts)| {
                table.with_chain(name, contracts.clone())
            })
    }

    /// RPC endpoints for the local EVM signer, keyed by hex chain id.
    pub fn evm_endpoints(&self) -> HashMap<String, Url> {
        self.chains
            .iter()
            .filter_map(|(_, contracts)| {
                Some((contracts.chain_hex_id.clone()?, contracts.rpc_url.clone()?))
            })
            .collect()
    }
}

fn parse_key_algorithm(value: &str) -> Result<KeyAlgorithm> {
    match value.to_ascii_lowercase().as_str() {
        "ed25519" => Ok(KeyAlgorithm::Ed25519),
        "secp256k1" => Ok(KeyAlgorithm::Secp256k1),
        other => Err(eyre!(
            "CASPER_KEY_ALGORITHM must be ed25519 or secp256k1, got {other}"
        )),
    }
}
