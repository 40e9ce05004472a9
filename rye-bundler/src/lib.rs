//! # rye-bundler — component J: Bundler
//!
//! Builds and verifies the manifest for a system-space bundle: every file
//! under its `.ai/` tree, SHA-256'd, with inline-signed items (component
//! A's format) flagged so `verify` can re-check them individually, and the
//! manifest itself signed as a whole.
//!
//! Grounded on the example pack's receipt-chain hashing
//! (`abp_receipt::canonicalize`/`compute_hash`): null the signature field,
//! serialize, hash — generalized from one receipt to a manifest of many
//! files, with the per-file hashing itself reusing component A's
//! `sha256_hex`.

#![deny(missing_docs)]

pub mod build;
pub mod error;
pub mod io;
pub mod manifest;
pub mod verify;

pub use build::{create, sign_manifest};
pub use error::BundleError;
pub use io::{manifest_path, read_manifest, write_manifest};
pub use manifest::{from_yaml, to_yaml, Manifest, ManifestEntry, ManifestSignature};
pub use verify::{verify, verify_manifest_signature, VerifyFailure, VerifyReport};
