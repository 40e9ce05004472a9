//! Trust store: TOML identity documents per fingerprint, searched
//! project → user → system, with trust-on-first-use pinning for the
//! registry's signing key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use base64::Engine;
use ed25519_dalek::VerifyingKey;
use rye_core::Space;
use serde::{Deserialize, Serialize};

use crate::error::IntegrityError;

fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// One trusted-key identity document, as stored under
/// `<space>/.ai/trusted_keys/<fingerprint>.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedIdentity {
    /// The key's fingerprint (redundant with the filename, kept for
    /// self-describing documents).
    pub fingerprint: String,
    /// Logical origin this key is trusted for (e.g. `"registry"` or an
    /// author handle).
    pub origin: String,
    /// When this identity was registered, RFC3339.
    pub registered_at: String,
    /// Human-readable label.
    pub label: Option<String>,
    /// Base64-encoded Ed25519 public key bytes, if embedded in the
    /// document (TOFU-pinned registry identities always carry this).
    pub public_key_b64: Option<String>,
}

/// Searches trust documents across spaces and enforces TOFU pinning for
/// the registry origin.
#[derive(Default)]
pub struct TrustStore {
    /// fingerprint -> (identity, space it was found in)
    identities: RwLock<HashMap<String, (TrustedIdentity, Space)>>,
    /// origin -> pinned fingerprint, for TOFU-protected origins.
    pinned: RwLock<HashMap<String, String>>,
    /// fingerprint -> raw public key bytes, for verification.
    public_keys: RwLock<HashMap<String, [u8; 32]>>,
}

impl TrustStore {
    /// An empty trust store with no TOFU pins seeded.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty trust store with the registry's TOFU pin (if one was
    /// persisted by an earlier process) read back from
    /// `registry_pin_path(user_space)` before any verification happens.
    pub fn with_user_space(user_space: &Path) -> Result<Self, IntegrityError> {
        let store = Self::default();
        let path = Self::registry_pin_path(user_space);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let fingerprint = text.trim().to_string();
                if !fingerprint.is_empty() {
                    store
                        .pinned
                        .write()
                        .expect("lock poisoned")
                        .insert("registry".to_string(), fingerprint);
                }
                Ok(store)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(store),
            Err(e) => Err(IntegrityError::TrustStore(e.to_string())),
        }
    }

    /// Load every `<fingerprint>.toml` under `trusted_keys_dir` into the
    /// given space's tier.
    pub fn load_dir(&self, trusted_keys_dir: &Path, space: Space) -> Result<usize, IntegrityError> {
        let mut loaded = 0;
        let entries = match std::fs::read_dir(trusted_keys_dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(IntegrityError::TrustStore(e.to_string())),
        };
        for entry in entries {
            let entry = entry.map_err(|e| IntegrityError::TrustStore(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let text =
                std::fs::read_to_string(&path).map_err(|e| IntegrityError::TrustStore(e.to_string()))?;
            let identity: TrustedIdentity =
                toml::from_str(&text).map_err(|e| IntegrityError::TrustStore(e.to_string()))?;
            self.identities
                .write()
                .expect("lock poisoned")
                .insert(identity.fingerprint.clone(), (identity, space.clone()));
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Register one identity directly (used by tests and by the signing
    /// path right after a key is generated). If the document embeds a
    /// public key, it is also registered for verification.
    pub fn register(&self, identity: TrustedIdentity, space: Space) {
        if let Some(b64_key) = &identity.public_key_b64 {
            if let Ok(bytes) = b64().decode(b64_key) {
                if let Ok(arr) = <[u8; 32]>::try_from(bytes.as_slice()) {
                    self.register_key(&identity.fingerprint, arr);
                }
            }
        }
        self.identities
            .write()
            .expect("lock poisoned")
            .insert(identity.fingerprint.clone(), (identity, space));
    }

    /// Register a public key's raw bytes under a fingerprint, independent
    /// of the identity document (used when the key is known out of band,
    /// e.g. freshly generated by a `KeyStore`).
    pub fn register_key(&self, fingerprint: &str, public_key: [u8; 32]) {
        self.public_keys
            .write()
            .expect("lock poisoned")
            .insert(fingerprint.to_string(), public_key);
    }

    /// The verifying key registered for a fingerprint, if any.
    pub fn public_key_of(&self, fingerprint: &str) -> Option<VerifyingKey> {
        let bytes = *self.public_keys.read().expect("lock poisoned").get(fingerprint)?;
        VerifyingKey::from_bytes(&bytes).ok()
    }

    /// Whether `fingerprint` is trusted in any space, searched
    /// project → user → system (spec §4.A step 4).
    pub fn is_trusted(&self, fingerprint: &str) -> bool {
        self.identities
            .read()
            .expect("lock poisoned")
            .contains_key(fingerprint)
    }

    /// Look up the space a trusted fingerprint was registered in.
    pub fn space_of(&self, fingerprint: &str) -> Option<Space> {
        self.identities
            .read()
            .expect("lock poisoned")
            .get(fingerprint)
            .map(|(_, space)| space.clone())
    }

    /// TOFU-pin a registry key fingerprint: first call for a given origin
    /// wins and is remembered, persisted to `registry_pin_path(user_space)`
    /// so a later process restart still rejects a different key for the
    /// same origin; subsequent calls with a different fingerprint for the
    /// same origin are rejected.
    pub fn tofu_pin(&self, user_space: &Path, origin: &str, fingerprint: &str) -> Result<(), IntegrityError> {
        let mut pinned = self.pinned.write().expect("lock poisoned");
        match pinned.get(origin) {
            Some(existing) if existing != fingerprint => Err(IntegrityError::TofuViolation {
                origin: origin.to_string(),
                pinned: existing.clone(),
                presented: fingerprint.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                if origin == "registry" {
                    let path = Self::registry_pin_path(user_space);
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent).map_err(|e| IntegrityError::TrustStore(e.to_string()))?;
                    }
                    std::fs::write(&path, fingerprint).map_err(|e| IntegrityError::TrustStore(e.to_string()))?;
                }
                pinned.insert(origin.to_string(), fingerprint.to_string());
                Ok(())
            }
        }
    }

    /// The path the registry's pinned key is written to, per spec §4.A:
    /// `~/.ai/trusted_keys/registry.pem`.
    pub fn registry_pin_path(user_space: &Path) -> PathBuf {
        user_space.join(".ai/trusted_keys/registry.pem")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(fp: &str) -> TrustedIdentity {
        TrustedIdentity {
            fingerprint: fp.to_string(),
            origin: "registry".to_string(),
            registered_at: "2024-01-01T00:00:00Z".to_string(),
            label: None,
            public_key_b64: None,
        }
    }

    #[test]
    fn registered_fingerprint_is_trusted() {
        let store = TrustStore::new();
        store.register(identity("abc0123456789def"), Space::Project);
        assert!(store.is_trusted("abc0123456789def"));
        assert!(!store.is_trusted("0000000000000000"));
    }

    #[test]
    fn tofu_pins_first_seen_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrustStore::new();
        store.tofu_pin(dir.path(), "registry", "aaaaaaaaaaaaaaaa").unwrap();
        assert!(store.tofu_pin(dir.path(), "registry", "aaaaaaaaaaaaaaaa").is_ok());
    }

    #[test]
    fn tofu_rejects_second_distinct_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrustStore::new();
        store.tofu_pin(dir.path(), "registry", "aaaaaaaaaaaaaaaa").unwrap();
        let err = store.tofu_pin(dir.path(), "registry", "bbbbbbbbbbbbbbbb").unwrap_err();
        assert!(matches!(err, IntegrityError::TofuViolation { .. }));
    }

    #[test]
    fn tofu_pin_survives_store_reconstruction() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrustStore::new();
        store.tofu_pin(dir.path(), "registry", "aaaaaaaaaaaaaaaa").unwrap();

        let reloaded = TrustStore::with_user_space(dir.path()).unwrap();
        let err = reloaded
            .tofu_pin(dir.path(), "registry", "bbbbbbbbbbbbbbbb")
            .unwrap_err();
        assert!(matches!(err, IntegrityError::TofuViolation { .. }));
    }

    #[test]
    fn space_of_reports_where_identity_was_found() {
        let store = TrustStore::new();
        store.register(identity("abc0123456789def"), Space::User);
        assert_eq!(store.space_of("abc0123456789def"), Some(Space::User));
    }
}
