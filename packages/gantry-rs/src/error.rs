//! Error types for the bridge client
//!
//! Three layers, matching who can act on the failure:
//! - [`ApiError`] - gateway/relay REST failures, mapped from HTTP status
//! - [`WalletError`] - signer and chain-submission failures
//! - [`TransferError`] - orchestration and validation failures

use thiserror::Error;

use crate::types::ChainFamily;

/// Gateway and relay REST failures.
///
/// Non-2xx statuses map to a variant carrying the body's `{"error": ...}`
/// message when the body parses, and a generic message otherwise.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("too many requests: {0}")]
    TooManyRequests(String),

    #[error("internal server error: {0}")]
    Internal(String),

    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response decode: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Map an HTTP status plus the extracted error message to a variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            404 => ApiError::NotFound(message),
            413 => ApiError::PayloadTooLarge(message),
            429 => ApiError::TooManyRequests(message),
            _ => ApiError::Internal(message),
        }
    }
}

/// Failures raised by an external signer (provider) before any domain
/// mapping. Code 4001 is the user pressing "reject".
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request rejected by user")]
    Rejected,

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("chain reverted the call")]
    Reverted(Vec<u8>),

    #[error("rpc failure: {0}")]
    Rpc(String),
}

/// Wallet-adapter failures.
///
/// User rejection is distinguished from provider malfunction so callers can
/// tell "declined" apart from "broken"; chain-side rejections carry the
/// decoded revert reason where the ABI is known.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("user declined the request")]
    Declined,

    #[error("wallet provider is not installed, get it from {install_url}")]
    NotInstalled { install_url: String },

    #[error("no active wallet session for the {0} family")]
    NotConnected(ChainFamily),

    #[error("provider failure: {0}")]
    Provider(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("chain rejected the call: {reason}")]
    Revert { reason: String },

    #[error("signature nonce {nonce} was already used on-chain")]
    AlreadyUsedSignature { nonce: u64 },

    #[error("invalid payload field `{field}`")]
    InvalidPayload { field: &'static str },

    #[error("{0} is not implemented for this wallet")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<ProviderError> for WalletError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Rejected => WalletError::Declined,
            ProviderError::Unavailable(msg) => WalletError::Provider(msg),
            ProviderError::Rpc(msg) => WalletError::Provider(msg),
            // Raw revert data is decoded by the EVM adapter before this
            // fallback applies.
            ProviderError::Reverted(data) => WalletError::Revert {
                reason: format!("0x{}", hex::encode(data)),
            },
        }
    }
}

/// Orchestration failures: input validation, sequencing, and wrapped
/// downstream faults.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("amount {0:?} is not a positive decimal string")]
    InvalidAmount(String),

    #[error("sender and recipient chain are the same")]
    SameChainTransfer,

    #[error("destination chain {0:?} is not connected to the bridge")]
    UnsupportedDestination(String),

    #[error("recipient address is not valid for the {family} family")]
    InvalidRecipient { family: ChainFamily },

    #[error("bridge-in signature expired at {deadline}")]
    SignatureExpired { deadline: String },

    #[error("no wallet session for the {0} family")]
    NotConnected(ChainFamily),

    #[error("chain {0} has no supported tokens")]
    NoSupportedTokens(u32),

    #[error("no transfer in progress; call estimate first")]
    NoActiveTransfer,

    #[error("cancellation is not implemented for the {family} family")]
    CancelNotImplemented { family: ChainFamily },

    #[error("malformed signature payload field `{field}`")]
    BadSignaturePayload { field: &'static str },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ApiError::from_status(400, "bad".into()),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from_status(401, "no".into()),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_status(404, "gone".into()),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(413, "big".into()),
            ApiError::PayloadTooLarge(_)
        ));
        assert!(matches!(
            ApiError::from_status(429, "slow down".into()),
            ApiError::TooManyRequests(_)
        ));
        assert!(matches!(
            ApiError::from_status(500, "boom".into()),
            ApiError::Internal(_)
        ));
        // Unmapped statuses degrade to Internal.
        assert!(matches!(
            ApiError::from_status(502, "bad gateway".into()),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_provider_rejection_maps_to_declined() {
        let err: WalletError = ProviderError::Rejected.into();
        assert!(matches!(err, WalletError::Declined));
    }

    #[test]
    fn test_undecoded_revert_keeps_raw_data() {
        let err: WalletError = ProviderError::Reverted(vec![0xde, 0xad]).into();
        match err {
            WalletError::Revert { reason } => assert_eq!(reason, "0xdead"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_messages_name_the_family() {
        let err = TransferError::CancelNotImplemented {
            family: ChainFamily::Casper,
        };
        assert!(err.to_string().contains("CASPER"));
    }
}
