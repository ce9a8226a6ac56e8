//! Aether Agent - the store and the two autonomous loops
//!
//! - `Store`: durable thoughts and agent state, single-writer
//! - `Cognition`: periodic LLM consultation that enqueues thoughts
//! - `Executor`: drains the queue into artifacts
//! - `Runtime`: wires the pieces and runs both loops until cancelled

pub mod cognition;
pub mod executor;
pub mod notifier;
pub mod prose;
pub mod runtime;
pub mod store;

pub use cognition::{Cognition, TickOutcome};
pub use executor::{ExecutionOutcome, Executor};
pub use notifier::{Notifier, NotifyOutcome, WebhookNotifier};
pub use runtime::{Runtime, EVENT_CHANNEL_CAPACITY};
pub use store::Store;
