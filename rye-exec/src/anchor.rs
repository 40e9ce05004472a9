//! Anchor resolution: search upward from a root for any of a runtime's
//! marker files (spec §4.E step 2).

use std::path::{Path, PathBuf};

use crate::error::ExecError;

/// Whether a missing anchor is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorMode {
    /// Fail execution if no marker is found.
    Always,
    /// Proceed without an anchor if no marker is found.
    Auto,
}

/// A runtime's anchor configuration.
#[derive(Debug, Clone)]
pub struct AnchorConfig {
    /// Marker filenames; any one present in a directory satisfies the
    /// search.
    pub markers_any: Vec<String>,
    /// Fatal-vs-skip behavior when no marker is found.
    pub mode: AnchorMode,
}

/// Search upward from `root` for a directory containing any of
/// `config.markers_any`.
pub async fn resolve_anchor(root: &Path, config: &AnchorConfig) -> Result<Option<PathBuf>, ExecError> {
    let mut current = Some(root.to_path_buf());
    while let Some(dir) = current {
        for marker in &config.markers_any {
            if tokio::fs::metadata(dir.join(marker)).await.is_ok() {
                return Ok(Some(dir));
            }
        }
        current = dir.parent().map(Path::to_path_buf);
    }
    match config.mode {
        AnchorMode::Always => Err(ExecError::AnchorNotFound(root.display().to_string())),
        AnchorMode::Auto => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn finds_marker_in_ancestor() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("pyproject.toml"), "").unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let config = AnchorConfig {
            markers_any: vec!["pyproject.toml".to_string()],
            mode: AnchorMode::Always,
        };
        let anchor = resolve_anchor(&nested, &config).await.unwrap();
        assert_eq!(anchor, Some(dir.path().to_path_buf()));
    }

    #[tokio::test]
    async fn auto_mode_returns_none_when_absent() {
        let dir = tempdir().unwrap();
        let config = AnchorConfig {
            markers_any: vec!["nonexistent.marker".to_string()],
            mode: AnchorMode::Auto,
        };
        assert_eq!(resolve_anchor(dir.path(), &config).await.unwrap(), None);
    }

    #[tokio::test]
    async fn always_mode_errors_when_absent() {
        let dir = tempdir().unwrap();
        let config = AnchorConfig {
            markers_any: vec!["nonexistent.marker".to_string()],
            mode: AnchorMode::Always,
        };
        assert!(resolve_anchor(dir.path(), &config).await.is_err());
    }
}
