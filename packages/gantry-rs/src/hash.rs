//! Blake2b hashing and Casper key material.
//!
//! Casper identifies accounts by the blake2b-256 digest of the key
//! algorithm name, a zero separator and the raw public key bytes. The
//! wire form of a public key is a tagged hex string: one algorithm tag
//! byte followed by the raw key.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use eyre::{bail, eyre, Result};

type Blake2b256 = Blake2b<U32>;

/// Message every wallet signs to prove key ownership to the gateway.
pub const AUTH_MESSAGE: &str = "Bridge Authentication Proof";

/// Prefix Casper signers prepend before hashing a human-readable message.
pub const CASPER_MESSAGE_PREFIX: &str = "Casper Message:\n";

// ============================================================================
// Digest
// ============================================================================

/// Blake2b digest truncated to 32 bytes, as used for account hashes,
/// deploy body hashes and deploy hashes.
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

// ============================================================================
// Key algorithms
// ============================================================================

/// Signature scheme of a Casper public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Ed25519,
    Secp256k1,
}

impl KeyAlgorithm {
    /// Tag byte prefixed to the raw key in the wire encoding.
    pub fn tag(&self) -> u8 {
        match self {
            KeyAlgorithm::Ed25519 => 1,
            KeyAlgorithm::Secp256k1 => 2,
        }
    }

    /// Lowercase name mixed into the account hash preimage.
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Ed25519 => "ed25519",
            KeyAlgorithm::Secp256k1 => "secp256k1",
        }
    }

    /// Raw public key length in bytes (secp256k1 keys are compressed).
    pub fn key_len(&self) -> usize {
        match self {
            KeyAlgorithm::Ed25519 => 32,
            KeyAlgorithm::Secp256k1 => 33,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(KeyAlgorithm::Ed25519),
            2 => Ok(KeyAlgorithm::Secp256k1),
            other => bail!("unknown key algorithm tag: {other}"),
        }
    }
}

// ============================================================================
// Account hashes
// ============================================================================

/// Account hash of a raw public key: blake2b-256 over the algorithm
/// name, a zero byte and the key bytes.
pub fn account_hash(algorithm: KeyAlgorithm, raw_key: &[u8]) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(algorithm.name().len() + 1 + raw_key.len());
    preimage.extend_from_slice(algorithm.name().as_bytes());
    preimage.push(0);
    preimage.extend_from_slice(raw_key);
    blake2b256(&preimage)
}

/// Splits a tagged hex public key into its algorithm and raw key bytes.
pub fn parse_tagged_public_key(tagged_hex: &str) -> Result<(KeyAlgorithm, Vec<u8>)> {
    let bytes = hex::decode(tagged_hex.trim_start_matches("0x"))
        .map_err(|e| eyre!("public key is not valid hex: {e}"))?;
    let (&tag, raw) = bytes
        .split_first()
        .ok_or_else(|| eyre!("public key is empty"))?;
    let algorithm = KeyAlgorithm::from_tag(tag)?;
    if raw.len() != algorithm.key_len() {
        bail!(
            "{} public key must be {} bytes, got {}",
            algorithm.name(),
            algorithm.key_len(),
            raw.len()
        );
    }
    Ok((algorithm, raw.to_vec()))
}

/// Hex encodes a raw public key with its algorithm tag prepended.
pub fn format_tagged_public_key(algorithm: KeyAlgorithm, raw_key: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(1 + raw_key.len());
    bytes.push(algorithm.tag());
    bytes.extend_from_slice(raw_key);
    hex::encode(bytes)
}

/// Account hash hex for a tagged public key, as bridge contracts and the
/// gateway expect Casper addresses.
pub fn account_hash_from_tagged_key(tagged_hex: &str) -> Result<String> {
    let (algorithm, raw_key) = parse_tagged_public_key(tagged_hex)?;
    Ok(hex::encode(account_hash(algorithm, &raw_key)))
}

/// Bytes a Casper signer hashes when signing a human-readable message.
pub fn prefixed_message(message: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(CASPER_MESSAGE_PREFIX.len() + message.len());
    bytes.extend_from_slice(CASPER_MESSAGE_PREFIX.as_bytes());
    bytes.extend_from_slice(message.as_bytes());
    bytes
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b256_known_digests() {
        assert_eq!(
            hex::encode(blake2b256(b"")),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
        assert_eq!(
            hex::encode(blake2b256(b"bridge")),
            "1590379bfdf0b7ae392111ae5b385ae06317ed0dc5172a32a8af32a588fca884"
        );
    }

    #[test]
    fn ed25519_account_hash_matches_reference() {
        let raw = [0xaa; 32];
        assert_eq!(
            hex::encode(account_hash(KeyAlgorithm::Ed25519, &raw)),
            "6320ec6f164c6bfa1fd3208deb2b797dcf0177fd1de32a8a1597c29b42f73b1b"
        );
    }

    #[test]
    fn secp256k1_account_hash_matches_reference() {
        let mut raw = vec![0x03];
        raw.extend_from_slice(&[0xbb; 32]);
        assert_eq!(
            hex::encode(account_hash(KeyAlgorithm::Secp256k1, &raw)),
            "90f49da5a6ec7be032e9995924d6aa7d1759c55a71d6aa2afe50b82d3e7826ce"
        );
    }

    #[test]
    fn tagged_key_round_trip() {
        let raw = [0xaa; 32];
        let tagged = format_tagged_public_key(KeyAlgorithm::Ed25519, &raw);
        assert_eq!(tagged, format!("01{}", "aa".repeat(32)));

        let (algorithm, parsed) = parse_tagged_public_key(&tagged).unwrap();
        assert_eq!(algorithm, KeyAlgorithm::Ed25519);
        assert_eq!(parsed, raw);
    }

    #[test]
    fn account_hash_from_tagged_key_hashes_raw_bytes() {
        let tagged = format!("01{}", "aa".repeat(32));
        assert_eq!(
            account_hash_from_tagged_key(&tagged).unwrap(),
            "6320ec6f164c6bfa1fd3208deb2b797dcf0177fd1de32a8a1597c29b42f73b1b"
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(parse_tagged_public_key("zz").is_err());
        assert!(parse_tagged_public_key("").is_err());
        // Unknown tag.
        assert!(parse_tagged_public_key(&format!("07{}", "aa".repeat(32))).is_err());
        // Wrong length for the algorithm.
        assert!(parse_tagged_public_key(&format!("01{}", "aa".repeat(16))).is_err());
        assert!(parse_tagged_public_key(&format!("02{}", "aa".repeat(32))).is_err());
    }

    #[test]
    fn message_prefix_is_prepended() {
        let bytes = prefixed_message("hello");
        assert_eq!(bytes, b"Casper Message:\nhello");
    }
}
