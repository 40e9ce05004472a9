//! Permission harness errors.

use thiserror::Error;

/// Why a dispatch was denied, or a permissions block failed to parse.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PermissionError {
    /// No capability in the effective set covers the required one.
    #[error("Permission denied: '{required}' not covered")]
    Denied {
        /// The capability string the dispatch required.
        required: String,
    },
}
