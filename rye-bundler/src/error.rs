//! Errors a bundler operation can return.

use thiserror::Error;

/// Failure building or verifying a bundle manifest (spec §4.J).
#[derive(Debug, Error)]
pub enum BundleError {
    /// The bundle root has no `.ai/` directory to walk.
    #[error("bundle root `{0}` has no .ai/ directory")]
    NoAiDir(String),

    /// Reading a file or directory under the bundle root failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The manifest YAML could not be parsed.
    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    /// The manifest carries no signature at all.
    #[error("manifest is unsigned")]
    Unsigned,

    /// Signing or verifying the manifest itself failed.
    #[error(transparent)]
    Integrity(#[from] rye_integrity::IntegrityError),
}
