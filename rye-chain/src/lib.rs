//! # rye-chain — component D: Chain Resolver & Validator
//!
//! Walks a tool's `executor_id` links to the terminal primitive,
//! enforcing space precedence and parameter-schema compatibility between
//! adjacent elements, with cycle detection and a per-leaf content-hash
//! cache.

#![deny(missing_docs)]

pub mod cache;
pub mod chain;
pub mod error;
pub mod schema;

pub use cache::ChainCache;
pub use chain::{ChainElement, ChainResolver};
pub use error::ChainError;
