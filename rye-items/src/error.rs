//! Loader errors.

use thiserror::Error;

/// Why loading an item failed.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ItemsError {
    /// The item's signature failed verification (fed through from
    /// `rye-integrity`).
    #[error(transparent)]
    Integrity(#[from] rye_integrity::IntegrityError),

    /// No fenced metadata block was found where one was expected.
    #[error("missing metadata block in {0}")]
    MissingMetadata(String),

    /// The metadata block failed to parse.
    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    /// A required field was absent.
    #[error("missing required field `{field}` in {item}")]
    MissingField {
        /// Field name.
        field: String,
        /// Item id or path, for context.
        item: String,
    },

    /// An `extends` chain contains a cycle.
    #[error("cyclic extends chain at {0}")]
    CyclicExtends(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
