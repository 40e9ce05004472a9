//! # rye-exec — component E: Primitive Executor
//!
//! Takes a resolved, validated chain from `rye-chain` and runs its
//! terminal primitive: parameter validation against the leaf tool's
//! schema, context-variable and environment composition, optional
//! dependency re-verification, subprocess invocation with a timeout, and
//! normalization into the result envelope every tool call returns.

#![deny(missing_docs)]

pub mod anchor;
pub mod env;
pub mod envelope;
pub mod error;
pub mod exec;
pub mod schema_validate;
pub mod template;
pub mod verify_deps;

pub use envelope::{unwrap_graph_result, ResultEnvelope, Status};
pub use error::ExecError;
pub use exec::{ExecutionRequest, PrimitiveExecutor};
