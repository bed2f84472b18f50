//! Casper deploy construction and hashing.
//!
//! A deploy is two items, payment and session, hashed into a body hash,
//! which the header commits to; the deploy hash is the blake2b-256 of the
//! serialized header. Signers sign the deploy hash, and the JSON form is
//! what travels to the relay.

use chrono::{DateTime, SecondsFormat, Utc};
use eyre::Result;
use serde_json::{json, Value};

use crate::casper::bytes::{string_bytes, u32_prefix, ClValue, RuntimeArgs};
use crate::hash::{blake2b256, parse_tagged_public_key};

/// Deploy time-to-live applied by the bridge client.
pub const DEFAULT_TTL_MS: u64 = 1_800_000;

pub const DEFAULT_GAS_PRICE: u64 = 1;

/// Motes paid for a bridge contract call.
pub const DEFAULT_PAYMENT_MOTES: u64 = 40_000_000_000;

/// Bridge contract entry point starting a transfer.
pub const BRIDGE_IN_ENTRY_POINT: &str = "bridge_in";

/// Bridge contract entry point returning locked funds on cancellation.
pub const TRANSFER_OUT_ENTRY_POINT: &str = "transfer_out";

const MODULE_BYTES_TAG: u8 = 0;
const STORED_CONTRACT_BY_HASH_TAG: u8 = 1;

// ============================================================================
// Deploy items
// ============================================================================

/// Payment item: empty module bytes plus an `amount` argument in motes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardPayment {
    pub amount_motes: u64,
}

impl StandardPayment {
    fn args(&self) -> RuntimeArgs {
        RuntimeArgs::new().with(
            "amount",
            ClValue::U512(alloy::primitives::U256::from(self.amount_motes)),
        )
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![MODULE_BYTES_TAG];
        // Standard payment ships no module, just a zero-length byte vec.
        out.extend_from_slice(&u32_prefix(0));
        out.extend_from_slice(&self.args().to_bytes());
        out
    }

    pub fn to_json(&self) -> Value {
        json!({
            "ModuleBytes": {
                "module_bytes": "",
                "args": self.args().to_json(),
            }
        })
    }
}

/// Session item: a stored contract addressed by hash, an entry point and
/// its runtime arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContractCall {
    pub contract_hash: [u8; 32],
    pub entry_point: String,
    pub args: RuntimeArgs,
}

impl StoredContractCall {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![STORED_CONTRACT_BY_HASH_TAG];
        out.extend_from_slice(&self.contract_hash);
        out.extend_from_slice(&string_bytes(&self.entry_point));
        out.extend_from_slice(&self.args.to_bytes());
        out
    }

    pub fn to_json(&self) -> Value {
        json!({
            "StoredContractByHash": {
                "hash": hex::encode(self.contract_hash),
                "entry_point": self.entry_point,
                "args": self.args.to_json(),
            }
        })
    }
}

// ============================================================================
// Header
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployHeader {
    /// Tagged public key hex of the deploying account.
    pub account: String,
    /// Tag byte plus raw key, as hashed into the header bytes.
    account_key: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    pub ttl_ms: u64,
    pub gas_price: u64,
    pub body_hash: [u8; 32],
    pub chain_name: String,
}

impl DeployHeader {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.account_key);
        out.extend_from_slice(&(self.timestamp.timestamp_millis() as u64).to_le_bytes());
        out.extend_from_slice(&self.ttl_ms.to_le_bytes());
        out.extend_from_slice(&self.gas_price.to_le_bytes());
        out.extend_from_slice(&self.body_hash);
        // No dependencies.
        out.extend_from_slice(&u32_prefix(0));
        out.extend_from_slice(&string_bytes(&self.chain_name));
        out
    }

    pub fn to_json(&self) -> Value {
        json!({
            "account": self.account,
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            "ttl": format_ttl(self.ttl_ms),
            "gas_price": self.gas_price,
            "body_hash": hex::encode(self.body_hash),
            "dependencies": [],
            "chain_name": self.chain_name,
        })
    }
}

/// Human-readable TTL: whole minutes where possible, milliseconds
/// otherwise.
fn format_ttl(ttl_ms: u64) -> String {
    if ttl_ms % 60_000 == 0 {
        format!("{}m", ttl_ms / 60_000)
    } else {
        format!("{ttl_ms}ms")
    }
}

// ============================================================================
// Deploy
// ============================================================================

/// Inputs for building an unsigned deploy.
#[derive(Debug, Clone)]
pub struct DeployParams {
    pub account_public_key: String,
    pub chain_name: String,
    pub payment_motes: u64,
    pub session: StoredContractCall,
    pub timestamp: DateTime<Utc>,
    pub ttl_ms: u64,
    pub gas_price: u64,
}

/// Unsigned deploy with its computed hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deploy {
    pub hash: [u8; 32],
    pub header: DeployHeader,
    pub payment: StandardPayment,
    pub session: StoredContractCall,
}

impl Deploy {
    pub fn build(params: DeployParams) -> Result<Self> {
        let (algorithm, raw_key) = parse_tagged_public_key(&params.account_public_key)?;
        let mut account_key = Vec::with_capacity(1 + raw_key.len());
        account_key.push(algorithm.tag());
        account_key.extend_from_slice(&raw_key);

        let payment = StandardPayment {
            amount_motes: params.payment_motes,
        };

        let mut body = payment.to_bytes();
        body.extend_from_slice(&params.session.to_bytes());
        let body_hash = blake2b256(&body);

        let header = DeployHeader {
            account: crate::hash::format_tagged_public_key(algorithm, &raw_key),
            account_key,
            timestamp: params.timestamp,
            ttl_ms: params.ttl_ms,
            gas_price: params.gas_price,
            body_hash,
            chain_name: params.chain_name.to_lowercase(),
        };
        let hash = blake2b256(&header.to_bytes());

        Ok(Self {
            hash,
            header,
            payment,
            session: params.session,
        })
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// JSON form a signer appends approvals to.
    pub fn to_json(&self) -> Value {
        json!({
            "hash": self.hash_hex(),
            "header": self.header.to_json(),
            "payment": self.payment.to_json(),
            "session": self.session.to_json(),
            "approvals": [],
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
