//! Ed25519 signing/verification behind a trait boundary, so key material
//! can later live in an HSM/KMS without changing callers — the same shape
//! as the teacher's `neuron_crypto::CryptoProvider`, specialized to the
//! one algorithm spec.md names and keyed by fingerprint instead of an
//! opaque `key_ref` string.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

use crate::error::IntegrityError;
use crate::signing::sha256_hex;

/// Derive a 16-hex-char fingerprint from a public key: the first 8 bytes
/// of its SHA-256 digest.
pub fn fingerprint_of(verifying_key: &VerifyingKey) -> String {
    sha256_hex(verifying_key.as_bytes())[..16].to_string()
}

/// Ed25519 sign/verify where private key material never leaves the
/// implementation.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Sign `data` with the key identified by `fingerprint`.
    async fn sign(&self, fingerprint: &str, data: &[u8]) -> Result<Vec<u8>, IntegrityError>;

    /// Verify `signature` over `data` against the key identified by
    /// `fingerprint`.
    async fn verify(
        &self,
        fingerprint: &str,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, IntegrityError>;

    /// Public key bytes for a given fingerprint, if known to this store.
    async fn public_key_bytes(&self, fingerprint: &str) -> Option<[u8; 32]>;
}

/// In-process Ed25519 key store. The only `KeyStore` implementation
/// shipped; HSM/KMS-backed stores are an integration the trait boundary
/// permits but this crate does not implement.
#[derive(Default)]
pub struct LocalKeyStore {
    keys: RwLock<HashMap<String, SigningKey>>,
}

impl LocalKeyStore {
    /// An empty key store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a new keypair, register it under its own fingerprint, and
    /// return the fingerprint.
    pub fn generate(&self) -> String {
        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        let fingerprint = fingerprint_of(&signing_key.verifying_key());
        self.keys
            .write()
            .expect("lock poisoned")
            .insert(fingerprint.clone(), signing_key);
        fingerprint
    }

    /// Register an existing keypair under its derived fingerprint.
    pub fn insert(&self, signing_key: SigningKey) -> String {
        let fingerprint = fingerprint_of(&signing_key.verifying_key());
        self.keys
            .write()
            .expect("lock poisoned")
            .insert(fingerprint.clone(), signing_key);
        fingerprint
    }
}

#[async_trait]
impl KeyStore for LocalKeyStore {
    async fn sign(&self, fingerprint: &str, data: &[u8]) -> Result<Vec<u8>, IntegrityError> {
        let keys = self.keys.read().expect("lock poisoned");
        let key = keys
            .get(fingerprint)
            .ok_or_else(|| IntegrityError::KeyNotFound(fingerprint.to_string()))?;
        Ok(key.sign(data).to_bytes().to_vec())
    }

    async fn verify(
        &self,
        fingerprint: &str,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, IntegrityError> {
        let keys = self.keys.read().expect("lock poisoned");
        let key = keys
            .get(fingerprint)
            .ok_or_else(|| IntegrityError::KeyNotFound(fingerprint.to_string()))?;
        verify_with_public_key(&key.verifying_key(), data, signature)
    }

    async fn public_key_bytes(&self, fingerprint: &str) -> Option<[u8; 32]> {
        self.keys
            .read()
            .expect("lock poisoned")
            .get(fingerprint)
            .map(|k| k.verifying_key().to_bytes())
    }
}

/// Verify a detached signature given raw public key bytes — used when the
/// verifying party only knows the key via the trust store, not via a
/// `KeyStore` that holds the private half.
pub fn verify_with_public_key(
    verifying_key: &VerifyingKey,
    data: &[u8],
    signature: &[u8],
) -> Result<bool, IntegrityError> {
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| IntegrityError::MalformedSignature("signature must be 64 bytes".into()))?;
    let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    Ok(verifying_key.verify(data, &sig).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_then_verify_roundtrips() {
        let store = LocalKeyStore::new();
        let fp = store.generate();
        let data = b"hello world";
        let sig = store.sign(&fp, data).await.unwrap();
        assert!(store.verify(&fp, data, &sig).await.unwrap());
    }

    #[tokio::test]
    async fn verify_rejects_tampered_data() {
        let store = LocalKeyStore::new();
        let fp = store.generate();
        let sig = store.sign(&fp, b"hello world").await.unwrap();
        assert!(!store.verify(&fp, b"goodbye world", &sig).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_fingerprint_errors() {
        let store = LocalKeyStore::new();
        let err = store.sign("deadbeefdeadbeef", b"x").await.unwrap_err();
        assert!(matches!(err, IntegrityError::KeyNotFound(_)));
    }

    fn _assert_object_safe(_: &dyn KeyStore) {}
}
