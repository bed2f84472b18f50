//! Common types for the bridge client
//!
//! Wire-facing types shared by the gateway clients, the wallet adapters, and
//! the transfer orchestrator. Field names follow the gateway JSON exactly,
//! including its historical `gasComission` spelling.

#![allow(dead_code)]

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Chain family
// ============================================================================

/// Chain family a network belongs to.
///
/// The gateway tags every network with `NT_EVM` or `NT_CASPER`; everything
/// chain-specific in this crate (address shape, signing model, submission
/// path) dispatches on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainFamily {
    #[serde(rename = "NT_EVM")]
    Evm,
    #[serde(rename = "NT_CASPER")]
    Casper,
}

impl ChainFamily {
    /// Get the family as an uppercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainFamily::Evm => "EVM",
            ChainFamily::Casper => "CASPER",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A network known to the bridge gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub family: ChainFamily,
    #[serde(rename = "isTestnet")]
    pub is_testnet: bool,
}

impl ChainDescriptor {
    /// Uppercase lookup key into the contract table
    pub fn table_key(&self) -> String {
        self.name.to_uppercase()
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// Per-chain wrapping of a bridged token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenWrap {
    #[serde(rename = "networkId")]
    pub chain_id: u32,
    #[serde(rename = "smartContractAddress")]
    pub contract_address: String,
}

/// A token supported by the bridge on some set of chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: u32,
    #[serde(rename = "shortName")]
    pub short_name: String,
    #[serde(rename = "longName")]
    pub long_name: String,
    #[serde(default)]
    pub wraps: Vec<TokenWrap>,
}

// ============================================================================
// Transfers
// ============================================================================

/// Address qualified by the network it lives on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainAddress {
    pub address: String,
    #[serde(rename = "networkName")]
    pub network_name: String,
}

impl ChainAddress {
    pub fn new(address: impl Into<String>, network_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            network_name: network_name.into(),
        }
    }
}

/// Transaction hash qualified by network; both sides may be absent while a
/// transfer is still confirming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPointer {
    #[serde(rename = "networkName", default)]
    pub network_name: String,
    #[serde(default)]
    pub hash: String,
}

/// Lifecycle status of a transfer as reported by the gateway.
///
/// The backend serializes plain strings. Note the backend spells
/// `CANCELLED` with a double L; the alias covers the single-L form used by
/// older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    #[serde(rename = "UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "CONFIRMING")]
    Confirming,
    #[serde(rename = "CANCELLED", alias = "CANCELED")]
    Cancelled,
    #[serde(rename = "FINISHED")]
    Finished,
    #[serde(rename = "WAITING")]
    Waiting,
}

impl TransferStatus {
    /// Get the status as an uppercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Unspecified => "UNSPECIFIED",
            TransferStatus::Confirming => "CONFIRMING",
            TransferStatus::Cancelled => "CANCELLED",
            TransferStatus::Finished => "FINISHED",
            TransferStatus::Waiting => "WAITING",
        }
    }

    /// Only confirming transfers can still be cancelled.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, TransferStatus::Confirming | TransferStatus::Waiting)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One bridge transfer as listed by the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: u64,
    #[serde(deserialize_with = "de_string_or_number")]
    pub amount: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub sender: ChainAddress,
    pub recipient: ChainAddress,
    pub status: TransferStatus,
    #[serde(rename = "outboundTx", default)]
    pub outbound_tx: Option<TxPointer>,
    #[serde(rename = "triggeringTx", default)]
    pub triggering_tx: Option<TxPointer>,
}

/// One page of transfer history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPage {
    #[serde(default)]
    pub transfers: Vec<Transfer>,
    pub offset: u64,
    pub limit: u64,
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}

/// Cursor for the history endpoint. The signature is the stored
/// authentication proof; the public key is the wallet identity (address for
/// EVM, tagged public key hex for Casper).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPagination {
    pub signature: String,
    pub pub_key: String,
    pub chain_id: u32,
    pub offset: u64,
    pub limit: u64,
}

/// Fee and timing estimate for a prospective transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEstimate {
    pub fee: String,
    #[serde(rename = "feePercentage")]
    pub fee_percentage: String,
    #[serde(rename = "estimatedConfirmationTime")]
    pub estimated_confirmation_time: String,
}

// ============================================================================
// Signatures
// ============================================================================

/// Body of `POST /transfers/bridge-in-signature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
    pub sender: ChainAddress,
    #[serde(rename = "tokenId")]
    pub token_id: u32,
    pub amount: String,
    pub destination: ChainAddress,
}

/// Server-issued, time-boxed, nonce-bound authorization for a bridge-in
/// call. Amounts and commissions are base-unit integer strings; `deadline`
/// is a unix-second string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeInSignature {
    pub token: String,
    #[serde(deserialize_with = "de_string_or_number")]
    pub amount: String,
    #[serde(rename = "gasComission", deserialize_with = "de_string_or_number")]
    pub gas_commission: String,
    pub destination: ChainAddress,
    #[serde(deserialize_with = "de_string_or_number")]
    pub deadline: String,
    pub nonce: u64,
    pub signature: String,
}

/// Server-issued authorization for a `transferOut` call returning escrowed
/// funds on the source chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelSignature {
    pub status: String,
    pub nonce: u64,
    pub signature: String,
    pub token: String,
    pub recipient: String,
    #[serde(deserialize_with = "de_string_or_number")]
    pub commission: String,
    #[serde(deserialize_with = "de_string_or_number")]
    pub amount: String,
}

/// Acknowledged chain submission (transaction hash or deploy hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSubmission {
    pub hash: String,
}

impl TxSubmission {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }
}

/// The backend emits big integers as bare JSON numbers in some fields;
/// accept both forms and keep the decimal-string policy internally.
fn de_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_family_wire_names() {
        let evm: ChainFamily = serde_json::from_str("\"NT_EVM\"").unwrap();
        let casper: ChainFamily = serde_json::from_str("\"NT_CASPER\"").unwrap();
        assert_eq!(evm, ChainFamily::Evm);
        assert_eq!(casper, ChainFamily::Casper);
        assert_eq!(serde_json::to_string(&evm).unwrap(), "\"NT_EVM\"");
        assert_eq!(evm.to_string(), "EVM");
        assert_eq!(casper.to_string(), "CASPER");
    }

    #[test]
    fn test_chain_descriptor_decode() {
        let json = r#"{"id":4,"name":"CASPER-TEST","type":"NT_CASPER","isTestnet":true}"#;
        let chain: ChainDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(chain.id, 4);
        assert_eq!(chain.name, "CASPER-TEST");
        assert_eq!(chain.family, ChainFamily::Casper);
        assert!(chain.is_testnet);
        assert_eq!(chain.table_key(), "CASPER-TEST");
    }

    #[test]
    fn test_token_decode() {
        let json = r#"{
            "id": 1,
            "shortName": "TEST",
            "longName": "Test Token",
            "wraps": [{"networkId": 2, "smartContractAddress": "0x1111111111111111111111111111111111111111"}]
        }"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token.id, 1);
        assert_eq!(token.short_name, "TEST");
        assert_eq!(token.wraps.len(), 1);
        assert_eq!(token.wraps[0].chain_id, 2);
    }

    #[test]
    fn test_token_missing_wraps_decodes_empty() {
        let json = r#"{"id":1,"shortName":"TEST","longName":"Test Token"}"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert!(token.wraps.is_empty());
    }

    #[test]
    fn test_transfer_status_backend_spelling() {
        let cancelled: TransferStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(cancelled, TransferStatus::Cancelled);
        // Older clients used the single-L spelling.
        let canceled: TransferStatus = serde_json::from_str("\"CANCELED\"").unwrap();
        assert_eq!(canceled, TransferStatus::Cancelled);
        assert_eq!(cancelled.as_str(), "CANCELLED");
    }

    #[test]
    fn test_transfer_status_cancellable() {
        assert!(TransferStatus::Confirming.is_cancellable());
        assert!(TransferStatus::Waiting.is_cancellable());
        assert!(!TransferStatus::Finished.is_cancellable());
        assert!(!TransferStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_transfer_decode_amount_as_number() {
        // Go marshals big.Int amounts as bare numbers.
        let json = r#"{
            "id": 42,
            "amount": 1000000000000000000,
            "createdAt": "2023-02-01T12:00:00Z",
            "sender": {"address": "0x9BeF813876a80EA862d97Bcf5c1772f601F2169e", "networkName": "GOERLI"},
            "recipient": {"address": "e3d394334473a79c94e67ccda524a848b596b78d4cb1b79e2e2384fe2d19abbf", "networkName": "CASPER-TEST"},
            "status": "CONFIRMING",
            "triggeringTx": {"networkName": "GOERLI", "hash": "0xdead"}
        }"#;
        let transfer: Transfer = serde_json::from_str(json).unwrap();
        assert_eq!(transfer.id, 42);
        assert_eq!(transfer.amount, "1000000000000000000");
        assert_eq!(transfer.status, TransferStatus::Confirming);
        assert_eq!(transfer.triggering_tx.unwrap().network_name, "GOERLI");
        assert!(transfer.outbound_tx.is_none());
    }

    #[test]
    fn test_transfer_page_missing_transfers() {
        let json = r#"{"offset":0,"limit":5,"totalCount":0}"#;
        let page: TransferPage = serde_json::from_str(json).unwrap();
        assert!(page.transfers.is_empty());
        assert_eq!(page.limit, 5);
    }

    #[test]
    fn test_estimate_round_trip() {
        let json = r#"{"fee":"5.1","feePercentage":"0.004","estimatedConfirmationTime":"10"}"#;
        let estimate: TransferEstimate = serde_json::from_str(json).unwrap();
        assert_eq!(estimate.fee, "5.1");
        assert_eq!(estimate.fee_percentage, "0.004");
        assert_eq!(estimate.estimated_confirmation_time, "10");
    }

    #[test]
    fn test_signature_request_wire_names() {
        let req = SignatureRequest {
            sender: ChainAddress::new("0xabc", "GOERLI"),
            token_id: 1,
            amount: "0.5".into(),
            destination: ChainAddress::new("account-hash-ff", "CASPER-TEST"),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["tokenId"], 1);
        assert_eq!(json["sender"]["networkName"], "GOERLI");
        assert_eq!(json["destination"]["address"], "account-hash-ff");
    }

    #[test]
    fn test_bridge_in_signature_gas_comission_spelling() {
        let json = r#"{
            "token": "0x2222222222222222222222222222222222222222",
            "amount": "1000000000000000000",
            "gasComission": "30000000000000000",
            "destination": {"address": "account-hash-aa", "networkName": "CASPER-TEST"},
            "deadline": "1788999999",
            "nonce": 7,
            "signature": "0x1b2c"
        }"#;
        let sig: BridgeInSignature = serde_json::from_str(json).unwrap();
        assert_eq!(sig.gas_commission, "30000000000000000");
        assert_eq!(sig.nonce, 7);
        let back = serde_json::to_value(&sig).unwrap();
        assert!(back.get("gasComission").is_some());
        assert!(back.get("gasCommission").is_none());
    }

    #[test]
    fn test_cancel_signature_decode() {
        let json = r#"{
            "status": "CONFIRMING",
            "nonce": 3,
            "signature": "0xfeed",
            "token": "0x2222222222222222222222222222222222222222",
            "recipient": "0x9BeF813876a80EA862d97Bcf5c1772f601F2169e",
            "commission": 30000000000000000,
            "amount": "1000000000000000000"
        }"#;
        let sig: CancelSignature = serde_json::from_str(json).unwrap();
        assert_eq!(sig.nonce, 3);
        assert_eq!(sig.commission, "30000000000000000");
        assert_eq!(sig.amount, "1000000000000000000");
    }
}
