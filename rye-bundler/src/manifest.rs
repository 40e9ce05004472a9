//! Manifest data model and the canonicalize-then-hash idiom used to sign
//! and verify it as a whole, grounded on the example pack's receipt-chain
//! hashing (`abp_receipt::canonicalize`/`compute_hash`): null out the
//! manifest's own signature field before serializing, serialize through
//! `serde_json` (whose map is sorted, giving deterministic key order),
//! and hash or sign the resulting bytes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BundleError;

/// One entry in a bundle manifest, keyed by the file's path relative to
/// the bundle's `.ai/` root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Hex-encoded SHA-256 of the file's raw bytes.
    pub sha256: String,
    /// Whether the file itself carries an inline `rye:signed:` line
    /// (component A's format) that `verify` should additionally check.
    pub inline_signed: bool,
    /// The item type this path resolves under (`directive`/`tool`/
    /// `knowledge`), when the path falls inside one of those directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
}

/// Detached signature over the manifest's own canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSignature {
    /// Signing timestamp.
    pub timestamp: DateTime<Utc>,
    /// Fingerprint of the key that produced `signature_b64`.
    pub key_fingerprint: String,
    /// Base64url-encoded Ed25519 signature over the manifest's canonical
    /// JSON with this field nulled out.
    pub signature_b64: String,
}

/// A bundle manifest: every file under a bundle's `.ai/` tree, its hash,
/// and whether it's independently inline-signed, plus a signature over
/// the manifest itself (spec §4.J).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Bundle identifier (`.ai/bundles/<bundle-id>/manifest.yaml`).
    pub bundle_id: String,
    /// Path (relative to the bundle's `.ai/` root, forward-slash
    /// separated) to entry.
    pub entries: BTreeMap<String, ManifestEntry>,
    /// Present once the manifest has been signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<ManifestSignature>,
}

impl Manifest {
    /// A fresh, unsigned manifest for the given bundle id.
    pub fn new(bundle_id: impl Into<String>) -> Self {
        Self { bundle_id: bundle_id.into(), entries: BTreeMap::new(), signature: None }
    }
}

/// Canonical JSON form of a manifest: its `signature` field nulled out,
/// serialized with `serde_json`'s deterministic (sorted) map ordering.
pub fn canonicalize(manifest: &Manifest) -> Result<String, BundleError> {
    let mut value = serde_json::to_value(manifest)
        .map_err(|e| BundleError::MalformedManifest(e.to_string()))?;
    if let serde_json::Value::Object(map) = &mut value {
        map.insert("signature".to_string(), serde_json::Value::Null);
    }
    serde_json::to_string(&value).map_err(|e| BundleError::MalformedManifest(e.to_string()))
}

/// Hex-encoded SHA-256 of a manifest's canonical form, for callers that
/// want a content hash without a signature (e.g. diffing two manifests).
pub fn compute_hash(manifest: &Manifest) -> Result<String, BundleError> {
    let canonical = canonicalize(manifest)?;
    Ok(rye_integrity::sha256_hex(canonical.as_bytes()))
}

/// Serialize a manifest to the YAML form persisted at
/// `.ai/bundles/<bundle-id>/manifest.yaml` (spec §6 filesystem layout).
pub fn to_yaml(manifest: &Manifest) -> Result<String, BundleError> {
    serde_yaml::to_string(manifest).map_err(|e| BundleError::MalformedManifest(e.to_string()))
}

/// Parse a manifest back out of its persisted YAML form.
pub fn from_yaml(text: &str) -> Result<Manifest, BundleError> {
    serde_yaml::from_str(text).map_err(|e| BundleError::MalformedManifest(e.to_string()))
}
