//! Primitive executor errors.

use thiserror::Error;

/// Why a primitive invocation failed.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExecError {
    /// Caller-supplied parameters didn't satisfy the leaf tool's schema.
    #[error("parameter validation failed: {0}")]
    ParamValidation(String),

    /// The runtime's anchor config requires a marker file that wasn't
    /// found.
    #[error("anchor marker not found searching up from {0}")]
    AnchorNotFound(String),

    /// `verify_deps` found a file that failed signature verification.
    #[error("dependency verification failed for {path}: {reason}")]
    DependencyVerification {
        /// Path of the failing file.
        path: String,
        /// Reason it failed.
        reason: String,
    },

    /// The subprocess could not be spawned, exited non-zero, or timed
    /// out.
    #[error("subprocess error: {0}")]
    Subprocess(String),

    /// The subprocess's stdout wasn't valid JSON where the contract
    /// required it.
    #[error("failed to parse tool output as JSON: {0}")]
    OutputParse(String),

    /// Chain resolution/validation failed before execution could start.
    #[error(transparent)]
    Chain(#[from] rye_chain::ChainError),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
