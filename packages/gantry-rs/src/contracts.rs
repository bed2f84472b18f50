//! Per-chain contract deployment table.
//!
//! Transfers need the token and bridge contract addresses deployed on each
//! chain. The gateway only reports chain descriptors, so deployments are
//! supplied through configuration and looked up by chain name.

use std::collections::HashMap;

use url::Url;

/// Wallet-facing hex chain ids for the known EVM testnets, used when a
/// deployment entry does not override them.
pub const DEFAULT_CHAIN_HEX_IDS: &[(&str, &str)] = &[
    ("GOERLI", "0x5"),
    ("MUMBAI", "0x13881"),
    ("BNB-TEST", "0x61"),
    ("AVALANCHE-TEST", "0xA869"),
];

/// Contract deployment on a single chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainContracts {
    /// Token contract: ERC-20 address on EVM chains, contract hash hex on
    /// Casper.
    pub token_contract: String,
    /// Bridge contract the token is approved for and deploys target.
    pub bridge_contract: String,
    /// Hex chain id for EVM wallet network switching, `None` on Casper.
    pub chain_hex_id: Option<String>,
    /// Node endpoint for locally-signed transactions.
    pub rpc_url: Option<Url>,
}

/// Deployment table keyed by uppercase chain name.
#[derive(Debug, Default, Clone)]
pub struct ContractTable {
    entries: HashMap<String, ChainContracts>,
}

impl ContractTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chain_name: &str, contracts: ChainContracts) {
        self.entries.insert(chain_name.to_uppercase(), contracts);
    }

    pub fn with_chain(mut self, chain_name: &str, contracts: ChainContracts) -> Self {
        self.insert(chain_name, contracts);
        self
    }

    /// Deployment for a chain, case-insensitive on the name.
    pub fn get(&self, chain_name: &str) -> Option<&ChainContracts> {
        self.entries.get(&chain_name.to_uppercase())
    }

    /// Built-in hex chain id for a known EVM chain name.
    pub fn default_hex_id(chain_name: &str) -> Option<&'static str> {
        let upper = chain_name.to_uppercase();
        DEFAULT_CHAIN_HEX_IDS
            .iter()
            .find(|(name, _)| *name == upper)
            .map(|(_, id)| *id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured chain names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }
}
