//! Reading and writing a manifest at its fixed location under a bundle's
//! `.ai/` tree (spec §6: `<space>/.ai/bundles/<bundle-id>/manifest.yaml`).

use std::path::{Path, PathBuf};

use crate::error::BundleError;
use crate::manifest::{from_yaml, to_yaml, Manifest};

/// Path a bundle's manifest is written to and read from.
pub fn manifest_path(bundle_root: &Path, bundle_id: &str) -> PathBuf {
    bundle_root.join(".ai").join("bundles").join(bundle_id).join("manifest.yaml")
}

/// Write `manifest` to its fixed location, creating parent directories
/// as needed.
pub async fn write_manifest(bundle_root: &Path, manifest: &Manifest) -> Result<PathBuf, BundleError> {
    let path = manifest_path(bundle_root, &manifest.bundle_id);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, to_yaml(manifest)?).await?;
    Ok(path)
}

/// Read a bundle's manifest back from its fixed location.
pub async fn read_manifest(bundle_root: &Path, bundle_id: &str) -> Result<Manifest, BundleError> {
    let path = manifest_path(bundle_root, bundle_id);
    let text = tokio::fs::read_to_string(&path).await?;
    from_yaml(&text)
}
