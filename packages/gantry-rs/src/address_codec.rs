//! Address validation and tagging for both chain families
//!
//! The bridge moves funds between two address shapes:
//!
//! - **EVM**: 20-byte hex addresses, `0x`-prefixed (40 hex chars)
//! - **Casper**: 32-byte account hashes, bare hex (64 hex chars), carried
//!   with an `account-hash-` tag when used as a transfer destination
//!
//! Amounts travel as decimal strings and are validated here as well, so the
//! orchestrator rejects junk before anything reaches the network layer.

use eyre::{eyre, Result};

use crate::types::ChainFamily;

/// Tag prepended to a Casper account hash when it travels as a destination
/// address.
pub const ACCOUNT_HASH_TAG: &str = "account-hash-";

// ============================================================================
// Address validation
// ============================================================================

/// Check a `0x`-prefixed 20-byte EVM address (mixed-case hex accepted).
pub fn validate_evm_address(addr: &str) -> bool {
    let Some(hex_part) = addr.strip_prefix("0x") else {
        return false;
    };
    hex_part.len() == 40 && hex_part.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Check a bare 32-byte Casper account hash (mixed-case hex accepted,
/// no `0x` prefix, no tag).
pub fn validate_account_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Validate an address against the shape its chain family expects.
pub fn validate_for(family: ChainFamily, addr: &str) -> bool {
    match family {
        ChainFamily::Evm => validate_evm_address(addr),
        ChainFamily::Casper => validate_account_hash(addr),
    }
}

// ============================================================================
// Account-hash tagging
// ============================================================================

/// Prefix an account hash with `account-hash-` if it is not tagged yet.
pub fn tag_account_hash(hash: &str) -> String {
    if hash.starts_with(ACCOUNT_HASH_TAG) {
        hash.to_string()
    } else {
        format!("{ACCOUNT_HASH_TAG}{hash}")
    }
}

/// Remove the `account-hash-` tag; untagged input is returned unchanged.
pub fn strip_account_hash_tag(hash: &str) -> &str {
    hash.strip_prefix(ACCOUNT_HASH_TAG).unwrap_or(hash)
}

// ============================================================================
// Amount validation
// ============================================================================

/// Check a user-entered amount string.
///
/// Accepted shape: ASCII digits with at most one `.` or `,` separator,
/// starting with a digit, worth more than zero. `"1."` is fine (empty
/// fraction), `".5"` is not.
pub fn validate_amount(amount: &str) -> bool {
    let mut seen_separator = false;
    let mut seen_nonzero = false;

    let mut bytes = amount.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_digit() => {
            if b != b'0' {
                seen_nonzero = true;
            }
        }
        _ => return false,
    }

    for b in bytes {
        match b {
            b'0'..=b'9' => {
                if b != b'0' {
                    seen_nonzero = true;
                }
            }
            b'.' | b',' => {
                if seen_separator {
                    return false;
                }
                seen_separator = true;
            }
            _ => return false,
        }
    }

    seen_nonzero
}

// ============================================================================
// Hex helpers
// ============================================================================

/// Strip an optional `0x` prefix.
pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

/// Decode a 32-byte value (contract hash, account hash) from hex, with or
/// without `0x` prefix.
pub fn decode_hex_32(s: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(strip_0x(s))?;
    if bytes.len() != 32 {
        return Err(eyre!("expected 32 bytes, got {}", bytes.len()));
    }
    let mut result = [0u8; 32];
    result.copy_from_slice(&bytes);
    Ok(result)
}

/// Decode a 20-byte EVM address from hex, with or without `0x` prefix.
pub fn decode_hex_20(s: &str) -> Result<[u8; 20]> {
    let bytes = hex::decode(strip_0x(s))?;
    if bytes.len() != 20 {
        return Err(eyre!("expected 20 bytes, got {}", bytes.len()));
    }
    let mut result = [0u8; 20];
    result.copy_from_slice(&bytes);
    Ok(result)
}
