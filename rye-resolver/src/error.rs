//! Resolver errors.

use thiserror::Error;

/// Why an item id failed to resolve.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ResolverError {
    /// No file for this id was found in any searched space.
    #[error("item not found in any space: {0}")]
    NotFound(String),

    /// Filesystem I/O failure while probing a candidate path.
    #[error("resolver I/O error: {0}")]
    Io(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
