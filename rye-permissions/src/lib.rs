//! # rye-permissions — component F: Permission Harness
//!
//! Compiles `<permissions>` XML into capability strings, performs the
//! fail-closed fnmatch dispatch check, and attenuates capabilities on
//! thread spawn.

#![deny(missing_docs)]

pub mod capability;
pub mod checker;
pub mod error;
pub mod fnmatch;

pub use capability::{capability_string, parse_permissions, CapabilitySet};
pub use checker::{attenuate, PermissionChecker, ALWAYS_PERMITTED_PREFIX};
pub use error::PermissionError;
