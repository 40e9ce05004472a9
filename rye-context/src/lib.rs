//! # rye-context — thread conversation compaction
//!
//! `rye-runtime` appends every LLM turn to a thread's message list
//! (spec §3 `turn_history`); left unchecked that list eventually exceeds
//! the directive's token limit before the model ever gets a chance to
//! finish. This crate supplies the compaction strategies that keep it
//! bounded, against the [`rye_core::ContextStrategy`] seam. Mirrors
//! `neuron-context`'s role, generalized from `neuron_turn::types` to
//! `rye_core::message`.

#![deny(missing_docs)]

pub mod sliding_window;

pub use sliding_window::SlidingWindow;
