//! Bundle verification: re-check the manifest's own signature, recompute
//! every file's hash, and verify inline-signed entries through component A
//! (spec §4.J "Verify"). Every mismatch is collected rather than
//! short-circuiting on the first one — pass status requires zero failures.

use std::path::Path;

use base64::Engine;

use rye_integrity::keystore::verify_with_public_key;
use rye_integrity::TrustStore;

use crate::error::BundleError;
use crate::manifest::{canonicalize, Manifest};

fn b64url() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
}

/// One thing that failed to check out during verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyFailure {
    /// A path the manifest lists is not present on disk.
    Missing(String),
    /// A file under the bundle's `.ai/` tree has no manifest entry.
    Extra(String),
    /// A listed file's recomputed hash doesn't match the manifest.
    HashMismatch(String),
    /// A file flagged `inline_signed` failed component A's `verify`.
    InlineSignatureInvalid(String, String),
    /// The manifest's own signature doesn't check out.
    ManifestSignatureInvalid(String),
}

/// Outcome of verifying a bundle against its manifest.
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    /// Every failure found; empty means the bundle passed.
    pub failures: Vec<VerifyFailure>,
}

impl VerifyReport {
    /// `true` when no failures were recorded.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Verify the manifest's own signature against `trust_store`, without
/// touching the filesystem.
pub fn verify_manifest_signature(manifest: &Manifest, trust_store: &TrustStore) -> Result<(), BundleError> {
    let signature = manifest.signature.as_ref().ok_or(BundleError::Unsigned)?;
    let canonical = canonicalize(manifest)?;

    if !trust_store.is_trusted(&signature.key_fingerprint) {
        return Err(rye_integrity::IntegrityError::UntrustedFingerprint(signature.key_fingerprint.clone()).into());
    }
    let public_key = trust_store
        .public_key_of(&signature.key_fingerprint)
        .ok_or_else(|| rye_integrity::IntegrityError::UntrustedFingerprint(signature.key_fingerprint.clone()))?;

    let sig_bytes = b64url()
        .decode(&signature.signature_b64)
        .map_err(|e| rye_integrity::IntegrityError::MalformedSignature(e.to_string()))?;
    let valid = verify_with_public_key(&public_key, canonical.as_bytes(), &sig_bytes)?;
    if !valid {
        return Err(rye_integrity::IntegrityError::SignatureInvalid(signature.key_fingerprint.clone()).into());
    }
    Ok(())
}

/// Re-verify a bundle on disk against its manifest (spec §4.J "Verify").
pub async fn verify(bundle_root: &Path, manifest: &Manifest, trust_store: &TrustStore) -> Result<VerifyReport, BundleError> {
    let mut report = VerifyReport::default();
    if let Err(e) = verify_manifest_signature(manifest, trust_store) {
        report.failures.push(VerifyFailure::ManifestSignatureInvalid(e.to_string()));
    }

    let ai_dir = bundle_root.join(".ai");
    if !ai_dir.is_dir() {
        return Err(BundleError::NoAiDir(bundle_root.display().to_string()));
    }

    let mut on_disk = Vec::new();
    crate::build::walk(&ai_dir, &ai_dir, &mut on_disk).await?;
    let on_disk: std::collections::BTreeSet<String> = on_disk.into_iter().collect();
    let in_manifest: std::collections::BTreeSet<String> = manifest.entries.keys().cloned().collect();

    for missing in in_manifest.difference(&on_disk) {
        report.failures.push(VerifyFailure::Missing(missing.clone()));
    }
    for extra in on_disk.difference(&in_manifest) {
        report.failures.push(VerifyFailure::Extra(extra.clone()));
    }

    for (path, entry) in &manifest.entries {
        if !on_disk.contains(path) {
            continue;
        }
        let bytes = tokio::fs::read(ai_dir.join(path)).await?;
        let actual_hash = rye_integrity::sha256_hex(&bytes);
        if actual_hash != entry.sha256 {
            report.failures.push(VerifyFailure::HashMismatch(path.clone()));
            continue;
        }
        if entry.inline_signed {
            match std::str::from_utf8(&bytes) {
                Ok(text) => {
                    if let Err(e) = rye_integrity::verify(text, trust_store) {
                        report.failures.push(VerifyFailure::InlineSignatureInvalid(path.clone(), e.to_string()));
                    }
                }
                Err(_) => {
                    report.failures.push(VerifyFailure::InlineSignatureInvalid(path.clone(), "not valid utf-8".to_string()));
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::create;
    use rye_core::Space;
    use rye_integrity::{KeyStore, LocalKeyStore, TrustedIdentity};
    use std::sync::Arc;

    async fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, content).await.unwrap();
    }

    async fn setup() -> (tempfile::TempDir, String, Arc<dyn KeyStore>, TrustStore) {
        let dir = tempfile::tempdir().unwrap();
        let local = Arc::new(LocalKeyStore::new());
        let fp = local.generate();
        let key_store: Arc<dyn KeyStore> = local.clone();
        let trust = TrustStore::new();
        let pk = key_store.public_key_bytes(&fp).await.unwrap();
        trust.register_key(&fp, pk);
        trust.register(
            TrustedIdentity { fingerprint: fp.clone(), origin: "author".into(), registered_at: chrono::Utc::now().to_rfc3339(), label: None, public_key_b64: None },
            Space::Project,
        );
        (dir, fp, key_store, trust)
    }

    #[tokio::test]
    async fn clean_bundle_passes_verification() {
        let (dir, fp, key_store, trust) = setup().await;
        write(dir.path(), ".ai/directives/demo/ping.md", "# Ping\n").await;

        let manifest = create(dir.path(), "core", &fp, &key_store, chrono::Utc::now()).await.unwrap();
        let report = verify(dir.path(), &manifest, &trust).await.unwrap();
        assert!(report.passed());
    }

    #[tokio::test]
    async fn tampered_file_fails_hash_check() {
        let (dir, fp, key_store, trust) = setup().await;
        write(dir.path(), ".ai/directives/demo/ping.md", "# Ping\n").await;
        let manifest = create(dir.path(), "core", &fp, &key_store, chrono::Utc::now()).await.unwrap();

        write(dir.path(), ".ai/directives/demo/ping.md", "# Ping (tampered)\n").await;
        let report = verify(dir.path(), &manifest, &trust).await.unwrap();
        assert!(!report.passed());
        assert!(report.failures.contains(&VerifyFailure::HashMismatch("directives/demo/ping.md".to_string())));
    }

    #[tokio::test]
    async fn extra_file_not_in_manifest_is_reported() {
        let (dir, fp, key_store, trust) = setup().await;
        write(dir.path(), ".ai/directives/demo/ping.md", "# Ping\n").await;
        let manifest = create(dir.path(), "core", &fp, &key_store, chrono::Utc::now()).await.unwrap();

        write(dir.path(), ".ai/directives/demo/extra.md", "# Extra\n").await;
        let report = verify(dir.path(), &manifest, &trust).await.unwrap();
        assert!(report.failures.contains(&VerifyFailure::Extra("directives/demo/extra.md".to_string())));
    }

    #[tokio::test]
    async fn untrusted_signer_fails_manifest_signature_check() {
        let (dir, fp, key_store, _trust) = setup().await;
        write(dir.path(), ".ai/directives/demo/ping.md", "# Ping\n").await;
        let manifest = create(dir.path(), "core", &fp, &key_store, chrono::Utc::now()).await.unwrap();

        let empty_trust = TrustStore::new();
        let report = verify(dir.path(), &manifest, &empty_trust).await.unwrap();
        assert!(!report.passed());
        assert!(matches!(report.failures[0], VerifyFailure::ManifestSignatureInvalid(_)));
    }
}
