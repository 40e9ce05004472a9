//! Errors for signing, verification, and trust-store operations.

use thiserror::Error;

/// Why `verify()` or a trust-store operation failed.
///
/// Every variant carries the detail needed to build spec §7's "required
/// capability or hash that did not match" user-visible message.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// No `rye:signed:` line was found anywhere in the content.
    #[error("no signature found")]
    SignatureMissing,

    /// A legacy signature format was found and rejected outright.
    #[error("legacy signature format rejected: {0}")]
    LegacyFormatRejected(String),

    /// The signature line itself could not be parsed.
    #[error("malformed signature line: {0}")]
    MalformedSignature(String),

    /// Recomputed content hash did not match the embedded hash.
    #[error("content hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Hash embedded in the signature line.
        expected: String,
        /// Hash recomputed from the current content.
        actual: String,
    },

    /// The signature's key fingerprint is not present in the trust store.
    #[error("untrusted key fingerprint: {0}")]
    UntrustedFingerprint(String),

    /// The Ed25519 signature did not verify against the trusted key.
    #[error("signature verification failed for fingerprint {0}")]
    SignatureInvalid(String),

    /// TOFU pin violation: a registry origin already has a pinned
    /// fingerprint different from the one presented.
    #[error("TOFU violation for origin {origin}: pinned {pinned}, got {presented}")]
    TofuViolation {
        /// Registry origin identifier.
        origin: String,
        /// Fingerprint previously pinned.
        pinned: String,
        /// Fingerprint presented this time.
        presented: String,
    },

    /// The referenced signing key was not found in the key store.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// An I/O or (de)serialization failure in the trust store backing.
    #[error("trust store error: {0}")]
    TrustStore(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
