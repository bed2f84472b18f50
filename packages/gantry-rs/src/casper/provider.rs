//! Casper signer abstraction.
//!
//! Models the surface of the Casper signer extension: connection state, an
//! active public key, message signing and deploy signing. Message
//! signatures are plain hex; deploy approvals are tagged with the key
//! algorithm byte, matching what the chain verifies.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use eyre::{eyre, Result, WrapErr};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::hash::{format_tagged_public_key, prefixed_message, KeyAlgorithm};

/// Surface of a Casper wallet signer.
#[async_trait]
pub trait CasperSigner: Send + Sync {
    async fn is_connected(&self) -> Result<bool, ProviderError>;

    /// Prompts for connection when the signer supports it.
    async fn request_connection(&self) -> Result<(), ProviderError>;

    /// Tagged hex public key of the active account.
    async fn active_public_key(&self) -> Result<String, ProviderError>;

    /// Signs a human-readable message, returning the bare signature hex.
    async fn sign_message(
        &self,
        message: &str,
        public_key_hex: &str,
    ) -> Result<String, ProviderError>;

    /// Signs a deploy JSON and returns it with the approval appended.
    async fn sign_deploy(
        &self,
        deploy: Value,
        public_key_hex: &str,
    ) -> Result<Value, ProviderError>;
}

// ============================================================================
// Local signer
// ============================================================================

enum LocalKey {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

/// Signer backed by a local key. Keys are always available, so connection
/// state only mirrors the extension handshake.
pub struct LocalCasperSigner {
    key: LocalKey,
    connected: AtomicBool,
}

impl LocalCasperSigner {
    pub fn from_ed25519_seed(seed: &[u8; 32]) -> Self {
        Self {
            key: LocalKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(seed)),
            connected: AtomicBool::new(false),
        }
    }

    pub fn from_secret_key_hex(algorithm: KeyAlgorithm, secret_hex: &str) -> Result<Self> {
        let bytes = hex::decode(secret_hex.trim_start_matches("0x"))
            .wrap_err("secret key is not valid hex")?;
        let key = match algorithm {
            KeyAlgorithm::Ed25519 => {
                let seed: [u8; 32] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| eyre!("ed25519 secret key must be 32 bytes"))?;
                LocalKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&seed))
            }
            KeyAlgorithm::Secp256k1 => LocalKey::Secp256k1(
                k256::ecdsa::SigningKey::from_slice(&bytes)
                    .map_err(|e| eyre!("invalid secp256k1 secret key: {e}"))?,
            ),
        };
        Ok(Self {
            key,
            connected: AtomicBool::new(false),
        })
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match &self.key {
            LocalKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            LocalKey::Secp256k1(_) => KeyAlgorithm::Secp256k1,
        }
    }

    pub fn tagged_public_key(&self) -> String {
        match &self.key {
            LocalKey::Ed25519(key) => format_tagged_public_key(
                KeyAlgorithm::Ed25519,
                key.verifying_key().as_bytes(),
            ),
            LocalKey::Secp256k1(key) => format_tagged_public_key(
                KeyAlgorithm::Secp256k1,
                key.verifying_key().to_encoded_point(true).as_bytes(),
            ),
        }
    }

    fn sign_raw(&self, data: &[u8]) -> Vec<u8> {
        match &self.key {
            LocalKey::Ed25519(key) => {
                use ed25519_dalek::Signer as _;
                key.sign(data).to_bytes().to_vec()
            }
            LocalKey::Secp256k1(key) => {
                use k256::ecdsa::signature::Signer as _;
                let signature: k256::ecdsa::Signature = key.sign(data);
                // The chain rejects high-s signatures.
                let signature = signature.normalize_s().unwrap_or(signature);
                signature.to_bytes().to_vec()
            }
        }
    }
}

#[async_trait]
impl CasperSigner for LocalCasperSigner {
    async fn is_connected(&self) -> Result<bool, ProviderError> {
        Ok(self.connected.load(Ordering::Relaxed))
    }

    async fn request_connection(&self) -> Result<(), ProviderError> {
        self.connected.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn active_public_key(&self) -> Result<String, ProviderError> {
        Ok(self.tagged_public_key())
    }

    async fn sign_message(
        &self,
        message: &str,
        _public_key_hex: &str,
    ) -> Result<String, ProviderError> {
        Ok(hex::encode(self.sign_raw(&prefixed_message(message))))
    }

    async fn sign_deploy(
        &self,
        mut deploy: Value,
        _public_key_hex: &str,
    ) -> Result<Value, ProviderError> {
        if !deploy.is_object() {
            return Err(ProviderError::Rpc("deploy is not a JSON object".to_string()));
        }
        let hash_hex = deploy
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Rpc("deploy has no hash".to_string()))?;
        let hash_bytes = hex::decode(hash_hex)
            .map_err(|e| ProviderError::Rpc(format!("deploy hash is not hex: {e}")))?;

        let signature = self.sign_raw(&hash_bytes);
        let approval = json!({
            "signer": self.tagged_public_key(),
            "signature": format!("{:02x}{}", self.algorithm().tag(), hex::encode(signature)),
        });

        match deploy.get_mut("approvals") {
            Some(Value::Array(approvals)) => approvals.push(approval),
            _ => deploy["approvals"] = json!([approval]),
        }
        Ok(deploy)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::CASPER_MESSAGE_PREFIX;

    fn ed25519_signer() -> LocalCasperSigner {
        LocalCasperSigner::from_ed25519_seed(&[0x01; 32])
    }

    #[tokio::test]
    async fn ed25519_public_key_is_tagged() {
        let signer = ed25519_signer();
        let key = signer.active_public_key().await.unwrap();
        assert!(key.starts_with("01"));
        assert_eq!(key.len(), 2 + 64);
    }

    #[tokio::test]
    async fn secp256k1_public_key_is_tagged_and_compressed() {
        let signer = LocalCasperSigner::from_secret_key_hex(
            KeyAlgorithm::Secp256k1,
            "4646464646464646464646464646464646464646464646464646464646464646",
        )
        .unwrap();
        let key = signer.active_public_key().await.unwrap();
        assert!(key.starts_with("02"));
        assert_eq!(key.len(), 2 + 66);
    }

    #[tokio::test]
    async fn connection_state_tracks_requests() {
        let signer = ed25519_signer();
        assert!(!signer.is_connected().await.unwrap());
        signer.request_connection().await.unwrap();
        assert!(signer.is_connected().await.unwrap());
    }

    #[tokio::test]
    async fn message_signatures_verify_against_the_prefixed_bytes() {
        use ed25519_dalek::{Signature, Verifier};

        let signer = ed25519_signer();
        let key = signer.active_public_key().await.unwrap();
        let signature_hex = signer.sign_message("hello", &key).await.unwrap();

        let signature_bytes: [u8; 64] = hex::decode(&signature_hex)
            .unwrap()
            .try_into()
            .unwrap();
        let verifying_key = ed25519_dalek::SigningKey::from_bytes(&[0x01; 32]).verifying_key();
        let message = format!("{CASPER_MESSAGE_PREFIX}hello");
        verifying_key
            .verify(message.as_bytes(), &Signature::from_bytes(&signature_bytes))
            .unwrap();
    }

    #[tokio::test]
    async fn deploy_approvals_carry_the_algorithm_tag() {
        use ed25519_dalek::{Signature, Verifier};

        let signer = ed25519_signer();
        let key = signer.active_public_key().await.unwrap();
        let hash = [0xab; 32];
        let deploy = json!({ "hash": hex::encode(hash), "approvals": [] });

        let signed = signer.sign_deploy(deploy, &key).await.unwrap();
        let approvals = signed["approvals"].as_array().unwrap();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0]["signer"], key);

        let tagged = approvals[0]["signature"].as_str().unwrap();
        assert!(tagged.starts_with("01"));
        assert_eq!(tagged.len(), 2 + 128);

        let signature_bytes: [u8; 64] = hex::decode(&tagged[2..]).unwrap().try_into().unwrap();
        let verifying_key = ed25519_dalek::SigningKey::from_bytes(&[0x01; 32]).verifying_key();
        verifying_key
            .verify(&hash, &Signature::from_bytes(&signature_bytes))
            .unwrap();
    }

    #[tokio::test]
    async fn secp256k1_deploy_signatures_verify() {
        use k256::ecdsa::signature::Verifier;

        let signer = LocalCasperSigner::from_secret_key_hex(
            KeyAlgorithm::Secp256k1,
            "4646464646464646464646464646464646464646464646464646464646464646",
        )
        .unwrap();
        let key = signer.active_public_key().await.unwrap();
        let hash = [0xcd; 32];
        let deploy = json!({ "hash": hex::encode(hash) });

        let signed = signer.sign_deploy(deploy, &key).await.unwrap();
        let tagged = signed["approvals"][0]["signature"].as_str().unwrap();
        assert!(tagged.starts_with("02"));

        let signature =
            k256::ecdsa::Signature::from_slice(&hex::decode(&tagged[2..]).unwrap()).unwrap();
        let secret = k256::ecdsa::SigningKey::from_slice(
            &hex::decode("4646464646464646464646464646464646464646464646464646464646464646")
                .unwrap(),
        )
        .unwrap();
        secret
            .verifying_key()
            .verify(&hash, &signature)
            .unwrap();
    }

    #[tokio::test]
    async fn deploys_without_a_hash_are_rejected() {
        let signer = ed25519_signer();
        let err = signer
            .sign_deploy(json!({ "header": {} }), "01aa")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Rpc(_)));
    }
}
