//! The explicit `Runtime` value spec §9 calls for in place of global state
//! (trust store location, resolver roots, debug flags). Constructed once
//! by the embedding application and threaded into every component that
//! would otherwise reach for a singleton.

use std::path::{Path, PathBuf};

use crate::space::Space;

/// One registered system-space bundle.
#[derive(Debug, Clone)]
pub struct SystemSpace {
    /// Root directory of the bundle's `.ai/` tree.
    pub root: PathBuf,
    /// Bundle identifier.
    pub bundle_id: String,
    /// Category prefixes this bundle is visible under; `None` means
    /// unrestricted.
    pub category_prefixes: Option<Vec<String>>,
}

impl SystemSpace {
    /// Whether this bundle is visible for the given item id.
    pub fn covers(&self, id: &str) -> bool {
        match &self.category_prefixes {
            None => true,
            Some(prefixes) => prefixes.iter().any(|p| id.starts_with(p.as_str())),
        }
    }

    /// The [`Space`] value for this bundle.
    pub fn space(&self) -> Space {
        Space::system_bundle(self.bundle_id.clone())
    }
}

/// Explicit runtime configuration: space roots, debug flags.
///
/// Replaces the source's implicit global state (spec §9: "lift into an
/// explicit `Runtime` value passed to all operations").
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Project space root (contains `.ai/`).
    pub project_root: PathBuf,
    /// User space root (contains `.ai/`); defaults to `$HOME`.
    pub user_space: PathBuf,
    /// Registered system-space bundles, in precedence order among
    /// themselves (first match wins).
    pub system_spaces: Vec<SystemSpace>,
    /// Verbose resolution logging (`RYE_DEBUG`).
    pub debug: bool,
}

impl RuntimeConfig {
    /// Build from environment variables and an explicit project root,
    /// following spec §6's `USER_SPACE`/`RYE_DEBUG` contract.
    pub fn from_env(project_root: impl Into<PathBuf>) -> Self {
        let user_space = std::env::var("USER_SPACE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs_home());
        let debug = std::env::var("RYE_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self {
            project_root: project_root.into(),
            user_space,
            system_spaces: Vec::new(),
            debug,
        }
    }

    /// Project `.ai/` directory.
    pub fn project_ai_dir(&self) -> PathBuf {
        self.project_root.join(".ai")
    }

    /// User `.ai/` directory.
    pub fn user_ai_dir(&self) -> PathBuf {
        self.user_space.join(".ai")
    }

    /// Register a system-space bundle.
    pub fn with_system_space(mut self, space: SystemSpace) -> Self {
        self.system_spaces.push(space);
        self
    }
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| Path::new(".").to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_space_with_no_prefixes_covers_everything() {
        let s = SystemSpace {
            root: PathBuf::from("/bundles/core"),
            bundle_id: "core".into(),
            category_prefixes: None,
        };
        assert!(s.covers("rye/file-system/read"));
    }

    #[test]
    fn system_space_with_prefixes_restricts_visibility() {
        let s = SystemSpace {
            root: PathBuf::from("/bundles/core"),
            bundle_id: "core".into(),
            category_prefixes: Some(vec!["rye/file-system".into()]),
        };
        assert!(s.covers("rye/file-system/read"));
        assert!(!s.covers("rye/network/fetch"));
    }

    #[test]
    fn project_ai_dir_appends_fixed_segment() {
        let cfg = RuntimeConfig {
            project_root: PathBuf::from("/work/myproj"),
            user_space: PathBuf::from("/home/u"),
            system_spaces: vec![],
            debug: false,
        };
        assert_eq!(cfg.project_ai_dir(), PathBuf::from("/work/myproj/.ai"));
    }
}
