//! # rye-core — shared vocabulary for Rye OS
//!
//! Every other crate in this workspace depends on this one and nothing
//! else upstream of it. It defines the types components pass across their
//! boundaries: typed ids, spaces and their precedence, a stable
//! wire-format duration, the cross-cutting error taxonomy (spec §7), the
//! `Hook` observation interface, and the explicit `RuntimeConfig` value
//! that replaces the source's global state (spec §9).
//!
//! Mirrors `layer0`'s role in the teacher workspace: a dependency-light
//! protocol crate everything else builds on.

#![deny(missing_docs)]

pub mod config;
pub mod duration;
pub mod error;
pub mod hook;
pub mod id;
pub mod message;
pub mod space;

pub use config::{RuntimeConfig, SystemSpace};
pub use duration::DurationMs;
pub use error::RyeError;
pub use hook::{Hook, HookAction, HookContext, HookPoint};
pub use id::{ItemId, KeyFingerprint, ThreadId};
pub use message::{ContentPart, ContextStrategy, ImageSource, Message, NoCompaction, Role};
pub use space::Space;
