//! Chain resolution/validation errors.

use thiserror::Error;

/// Why a tool's executor chain failed to resolve or validate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ChainError {
    /// An id was re-visited while walking `executor_id` links.
    #[error("cycle detected in executor chain at {0}")]
    Cycle(String),

    /// The chain ended on something other than a primitive with no
    /// `executor_id`.
    #[error("chain terminal `{0}` is not a primitive")]
    TerminalNotPrimitive(String),

    /// Adjacent chain elements violate `precedence(parent.space) >=
    /// precedence(child.space)`.
    #[error("space precedence violation: `{parent}` (space-lower) depends on `{child}` (space-higher)")]
    PrecedenceViolation {
        /// The leaf-side element.
        parent: String,
        /// The primitive-side element it depends on.
        child: String,
    },

    /// A child element's declared parameters are not a compatible
    /// superset of its parent's.
    #[error("schema incompatibility between `{parent}` and `{child}`: {reason}")]
    SchemaIncompatible {
        /// The leaf-side element.
        parent: String,
        /// The primitive-side element.
        child: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// Resolving, verifying, or parsing a chain element failed.
    #[error(transparent)]
    Item(#[from] rye_items::ItemsError),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
