//! Typed hook bus.
//!
//! Extensions subscribe handlers to named events; the host dispatches
//! them in registration order with per-category aggregation: vetoes
//! short-circuit, input transforms chain, notifications fan out.

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventHandler};
pub use types::{
    AgentStartOutcome, CompactOutcome, EventType, ForkOutcome, HookEvent, HookOutcome,
    InputAction, InputOutcome, ToolCallVerdict,
};

use thiserror::Error;

/// Dispatch-level failures. Only categories where partial application is
/// unsafe escalate; everything else degrades to "no opinion" per
/// handler.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("handler '{owner}' failed during {event} dispatch; action aborted: {source}")]
    ActionAborted {
        event: &'static str,
        owner: String,
        #[source]
        source: anyhow::Error,
    },
}
