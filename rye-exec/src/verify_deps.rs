//! `verify_deps`: walk a configured scope and re-verify every matching
//! file's signature before execution (spec §4.E step 4).

use std::path::{Path, PathBuf};

use rye_integrity::TrustStore;

use crate::error::ExecError;

/// Which files `verify_deps` should cover.
#[derive(Debug, Clone)]
pub enum VerifyScope {
    /// Every file under the resolved anchor directory.
    AnchorSubtree(PathBuf),
    /// Every file in the tool's own directory (non-recursive).
    ToolDir(PathBuf),
    /// Every file alongside the tool file, excluding the tool file
    /// itself.
    ToolSiblings(PathBuf),
    /// Just the tool's own file.
    ToolFile(PathBuf),
}

fn collect_dir<'a>(dir: &'a Path, recursive: bool, exclude: Option<&'a Path>) -> std::pin::Pin<Box<dyn std::future::Future<Output = std::io::Result<Vec<PathBuf>>> + Send + 'a>> {
    Box::pin(async move {
        let mut out = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if Some(path.as_path()) == exclude {
                continue;
            }
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                if recursive {
                    out.extend(collect_dir(&path, recursive, exclude).await?);
                }
            } else {
                out.push(path);
            }
        }
        Ok(out)
    })
}

async fn candidate_paths(scope: &VerifyScope) -> std::io::Result<Vec<PathBuf>> {
    match scope {
        VerifyScope::AnchorSubtree(dir) => collect_dir(dir, true, None).await,
        VerifyScope::ToolDir(dir) => collect_dir(dir, false, None).await,
        VerifyScope::ToolSiblings(tool_file) => {
            let dir = tool_file.parent().unwrap_or(Path::new("."));
            collect_dir(dir, false, Some(tool_file)).await
        }
        VerifyScope::ToolFile(path) => Ok(vec![path.clone()]),
    }
}

/// Verify every file in `scope` matching `extensions` and not under a
/// directory named in `excluded_dirs`. Any verification failure halts
/// immediately.
pub async fn verify_deps(
    scope: VerifyScope,
    extensions: &[String],
    excluded_dirs: &[String],
    trust_store: &TrustStore,
) -> Result<(), ExecError> {
    let paths = candidate_paths(&scope).await.map_err(|e| ExecError::Other(Box::new(e)))?;

    for path in paths {
        if extensions_mismatch(&path, extensions) {
            continue;
        }
        if is_under_excluded_dir(&path, excluded_dirs) {
            continue;
        }
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ExecError::Other(Box::new(e)))?;
        rye_integrity::verify(&content, trust_store).map_err(|e| ExecError::DependencyVerification {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn extensions_mismatch(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return false;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => !extensions.iter().any(|e| e == ext),
        None => true,
    }
}

fn is_under_excluded_dir(path: &Path, excluded_dirs: &[String]) -> bool {
    path.components().any(|c| excluded_dirs.iter().any(|e| c.as_os_str() == e.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rye_core::Space;
    use rye_integrity::{sign, KeyStore, LocalKeyStore, TrustedIdentity};
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn verifies_every_matching_file_in_dir() {
        let dir = tempdir().unwrap();
        let key_store = Arc::new(LocalKeyStore::new());
        let fp = key_store.generate();
        let trust = TrustStore::new();
        let pk = KeyStore::public_key_bytes(key_store.as_ref(), &fp).await.unwrap();
        trust.register_key(&fp, pk);
        trust.register(
            TrustedIdentity {
                fingerprint: fp.clone(),
                origin: "author".into(),
                registered_at: chrono::Utc::now().to_rfc3339(),
                label: None,
                public_key_b64: None,
            },
            Space::Project,
        );

        let dyn_store: Arc<dyn KeyStore> = key_store.clone();
        let body = "# tool body\n";
        let sig = sign(body, "#", &fp, &dyn_store, chrono::Utc::now()).await.unwrap();
        fs::write(dir.path().join("tool.py"), format!("{body}{sig}\n")).unwrap();

        let result = verify_deps(
            VerifyScope::ToolDir(dir.path().to_path_buf()),
            &["py".to_string()],
            &[],
            &trust,
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unsigned_file_fails_verification() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tool.py"), "no signature here\n").unwrap();
        let trust = TrustStore::new();

        let result = verify_deps(
            VerifyScope::ToolDir(dir.path().to_path_buf()),
            &["py".to_string()],
            &[],
            &trust,
        )
        .await;
        assert!(matches!(result, Err(ExecError::DependencyVerification { .. })));
    }

    #[tokio::test]
    async fn excluded_dir_is_skipped() {
        let dir = tempdir().unwrap();
        let excluded = dir.path().join("node_modules");
        fs::create_dir_all(&excluded).unwrap();
        fs::write(excluded.join("bad.py"), "not signed\n").unwrap();

        let trust = TrustStore::new();
        let result = verify_deps(
            VerifyScope::AnchorSubtree(dir.path().to_path_buf()),
            &["py".to_string()],
            &["node_modules".to_string()],
            &trust,
        )
        .await;
        assert!(result.is_ok());
    }
}
