//! Bundle creation: walk a bundle root's `.ai/` tree, hash every file, and
//! sign the resulting manifest (spec §4.J "Create").

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Utc};
use rye_integrity::{IntegrityError, KeyStore};
use rye_resolver::ItemType;

use crate::error::BundleError;
use crate::manifest::{Manifest, ManifestEntry, ManifestSignature};

fn b64url() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
}

/// Walk `bundle_root`'s `.ai/` tree, hash every file, and sign the
/// resulting manifest with `fingerprint`.
pub async fn create(
    bundle_root: &Path,
    bundle_id: &str,
    fingerprint: &str,
    key_store: &Arc<dyn KeyStore>,
    now: DateTime<Utc>,
) -> Result<Manifest, BundleError> {
    let ai_dir = bundle_root.join(".ai");
    if !ai_dir.is_dir() {
        return Err(BundleError::NoAiDir(bundle_root.display().to_string()));
    }

    let mut manifest = Manifest::new(bundle_id);
    let mut relative_paths = Vec::new();
    walk(&ai_dir, &ai_dir, &mut relative_paths).await?;

    for rel in relative_paths {
        let entry = hash_one(&ai_dir, &rel).await?;
        manifest.entries.insert(rel, entry);
    }

    let signature = sign_manifest(&manifest, fingerprint, key_store, now).await?;
    manifest.signature = Some(signature);
    Ok(manifest)
}

async fn hash_one(ai_dir: &Path, rel: &str) -> Result<ManifestEntry, BundleError> {
    let bytes = tokio::fs::read(ai_dir.join(rel)).await?;
    let sha256 = rye_integrity::sha256_hex(&bytes);
    let inline_signed = std::str::from_utf8(&bytes)
        .map(|text| rye_integrity::latest_signed_comment(text).is_ok())
        .unwrap_or(false);
    Ok(ManifestEntry { sha256, inline_signed, item_type: item_type_of(rel) })
}

/// Sign a manifest's canonical form, producing the detached signature
/// that hangs off `Manifest::signature`.
pub async fn sign_manifest(
    manifest: &Manifest,
    fingerprint: &str,
    key_store: &Arc<dyn KeyStore>,
    now: DateTime<Utc>,
) -> Result<ManifestSignature, BundleError> {
    let canonical = crate::manifest::canonicalize(manifest)?;
    let signature = key_store.sign(fingerprint, canonical.as_bytes()).await.map_err(map_key_err)?;
    Ok(ManifestSignature {
        timestamp: now,
        key_fingerprint: fingerprint.to_string(),
        signature_b64: b64url().encode(signature),
    })
}

fn map_key_err(e: IntegrityError) -> BundleError {
    BundleError::Integrity(e)
}

fn item_type_of(rel_path: &str) -> Option<String> {
    let first = rel_path.split('/').next()?;
    let ty = match first {
        "directives" => ItemType::Directive,
        "tools" => ItemType::Tool,
        "knowledge" => ItemType::Knowledge,
        _ => return None,
    };
    serde_json::to_value(ty).ok().and_then(|v| v.as_str().map(str::to_string))
}

pub(crate) fn walk<'a>(
    root: &'a Path,
    dir: &'a Path,
    out: &'a mut Vec<String>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), BundleError>> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out).await?;
            } else if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"));
            }
        }
        Ok(())
    })
}
