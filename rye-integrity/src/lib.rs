//! # rye-integrity — component A: Integrity & Key Store
//!
//! Ed25519 sign/verify over the inline signed-comment format, a
//! TOFU-pinned trust store, and the `KeyStore` trait boundary that keeps
//! private key material out of every other crate — the same shape as the
//! teacher's `neuron_crypto::CryptoProvider`, specialized to Ed25519 and
//! keyed by fingerprint.

#![deny(missing_docs)]

pub mod error;
pub mod keystore;
pub mod signing;
pub mod trust;
pub mod verify;

pub use error::IntegrityError;
pub use keystore::{fingerprint_of, KeyStore, LocalKeyStore};
pub use signing::{
    content_without_signature_line, format_signed_line, latest_signed_comment, parse_signed_line,
    sha256_hex, SignedComment,
};
pub use trust::{TrustStore, TrustedIdentity};
pub use verify::{sign, verify};
