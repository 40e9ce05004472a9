//! # rye-runtime — component H: Thread Runtime
//!
//! Runs a directive as a managed conversational thread: assembles the
//! system and first-user messages, drives the provider turn loop,
//! translates and capability-checks every tool call the model emits,
//! debits the budget ledger, evaluates directive-declared hooks, and
//! persists a signed transcript on completion. `rye-orchestrator`
//! (component I) owns thread identity, depth/spawn-count enforcement,
//! and cancellation plumbing above this crate; this crate only knows
//! how to run one thread to a terminal status given the dependencies it
//! was handed.

#![deny(missing_docs)]

pub mod cancel;
pub mod dispatch;
pub mod engine;
pub mod first_message;
pub mod hooks;
pub mod spawner;
pub mod system_prompt;
pub mod thread;
pub mod transcript;

pub use cancel::{channel, handoff_channel, CancelSource, CancelToken, HandoffSource, HandoffToken};
pub use engine::{LimitOverrides, ParentContext, RuntimeDeps, ThreadRequest, ThreadResult, ThreadRuntime};
pub use spawner::{DirectiveSpawner, NoSpawner, SpawnOutcome, SpawnRequest};
pub use thread::{Thread, ThreadStatus, TurnRecord};
