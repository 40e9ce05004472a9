//! # rye-items — component C: Signed-Item Loader
//!
//! Parses directives, tools, and knowledge from their on-disk formats,
//! normalizes metadata field names, and walks a directive's `extends`
//! chain root-first with cycle detection. Signature verification is
//! delegated to `rye-integrity`; resolution to `rye-resolver`. Permission
//! XML is extracted here but interpreted by `rye-permissions` — this
//! crate only carries the raw text.

#![deny(missing_docs)]

pub mod directive;
pub mod error;
pub mod knowledge;
pub mod loader;
pub mod metadata;
pub mod process;
pub mod tool;
pub mod xmlish;

pub use directive::{Directive, DirectiveMetadata};
pub use error::ItemsError;
pub use knowledge::{Knowledge, KnowledgeFrontmatter};
pub use loader::{load_directive, load_knowledge, load_tool};
pub use metadata::{ContextItem, ContextPosition, HookDecl, IoSpec, Limits, ModelDescriptor};
pub use process::{Process, ProcessStep, StepAction};
pub use tool::{AnchorSpec, EnvConfig, ExecConfig, Tool, ToolType, VerifyDepsSpec};
