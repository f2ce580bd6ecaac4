//! Event and outcome types for the hook bus.
//!
//! Events are a closed tagged union: one variant per event name, each
//! carrying its own payload. Dispatch semantics depend on the event's
//! category (interceptable, transform, or notification), which is a
//! property of the type, not of the subscriber.

use serde::Serialize;
use serde_json::Value;

use crate::session::EntryId;

/// A host-emitted occurrence delivered to subscribed handlers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HookEvent {
    /// A tool invocation is about to execute. Interceptable: the first
    /// handler returning a block decision stops it.
    ToolCall { tool_name: String, input: Value },

    /// Raw user input before the host acts on it. Transformable: each
    /// handler may consume it or rewrite the text for the next handler.
    Input { text: String },

    /// The agent loop is about to start a turn. Handlers may inject a
    /// message and/or replace the system prompt.
    BeforeAgentStart { system_prompt: String },

    /// Lifecycle notifications. Results are ignored.
    SessionStart,
    SessionShutdown,
    AgentStart,
    AgentEnd,

    /// A fork is about to happen at `entry_id`. Cancellable.
    SessionBeforeFork { entry_id: EntryId },

    /// A fork happened; `leaf_id` is the new leaf. Extensions replay
    /// their custom-entry state from the new branch here.
    SessionFork { leaf_id: EntryId },

    /// The current leaf moved to `leaf_id` without appending. Replay
    /// point, like `SessionFork`.
    SessionSwitch { leaf_id: EntryId },

    /// The host is about to compact the conversation. Cancellable, and
    /// a handler may supply the compaction summary itself.
    SessionBeforeCompact,
}

impl HookEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            HookEvent::ToolCall { .. } => EventType::ToolCall,
            HookEvent::Input { .. } => EventType::Input,
            HookEvent::BeforeAgentStart { .. } => EventType::BeforeAgentStart,
            HookEvent::SessionStart => EventType::SessionStart,
            HookEvent::SessionShutdown => EventType::SessionShutdown,
            HookEvent::AgentStart => EventType::AgentStart,
            HookEvent::AgentEnd => EventType::AgentEnd,
            HookEvent::SessionBeforeFork { .. } => EventType::SessionBeforeFork,
            HookEvent::SessionFork { .. } => EventType::SessionFork,
            HookEvent::SessionSwitch { .. } => EventType::SessionSwitch,
            HookEvent::SessionBeforeCompact => EventType::SessionBeforeCompact,
        }
    }
}

/// Subscription key: the name of an event without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    ToolCall,
    Input,
    BeforeAgentStart,
    SessionStart,
    SessionShutdown,
    AgentStart,
    AgentEnd,
    SessionBeforeFork,
    SessionFork,
    SessionSwitch,
    SessionBeforeCompact,
}

impl EventType {
    /// All event types, for registration UIs.
    pub fn all() -> &'static [EventType] {
        &[
            EventType::ToolCall,
            EventType::Input,
            EventType::BeforeAgentStart,
            EventType::SessionStart,
            EventType::SessionShutdown,
            EventType::AgentStart,
            EventType::AgentEnd,
            EventType::SessionBeforeFork,
            EventType::SessionFork,
            EventType::SessionSwitch,
            EventType::SessionBeforeCompact,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventType::ToolCall => "tool_call",
            EventType::Input => "input",
            EventType::BeforeAgentStart => "before_agent_start",
            EventType::SessionStart => "session_start",
            EventType::SessionShutdown => "session_shutdown",
            EventType::AgentStart => "agent_start",
            EventType::AgentEnd => "agent_end",
            EventType::SessionBeforeFork => "session_before_fork",
            EventType::SessionFork => "session_fork",
            EventType::SessionSwitch => "session_switch",
            EventType::SessionBeforeCompact => "session_before_compact",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        EventType::all()
            .iter()
            .copied()
            .find(|event_type| event_type.name() == s)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A handler's decision about raw user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Input fully consumed; no later handler or the host sees it.
    Handled,
    /// Rewrite the text; later handlers see the rewritten payload.
    Transform { text: String },
    /// Pass through unchanged.
    Continue,
}

/// What a handler returned for one event.
///
/// Variants are interpreted per event category; a variant that does not
/// apply to the dispatched event is logged and treated as no opinion.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    NoOpinion,
    /// Veto an interceptable action, with a human-readable reason.
    Block { reason: String },
    Input(InputAction),
    /// Contribution to `before_agent_start`.
    AgentStart {
        message: Option<String>,
        system_prompt: Option<String>,
    },
    /// Decision for `session_before_fork`.
    Fork {
        cancel: bool,
        skip_conversation_restore: bool,
    },
    /// Decision for `session_before_compact`.
    Compact {
        cancel: bool,
        summary: Option<String>,
    },
}

/// Aggregated verdict for an interceptable `tool_call` dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCallVerdict {
    Proceed,
    /// Blocked by `by` with a human-readable reason. Handlers after the
    /// blocking one were not invoked.
    Blocked { reason: String, by: String },
}

/// Aggregated outcome of an `input` dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Consumed by `by`; the host drops the input.
    Handled { by: String },
    /// The text the host should act on, after all transforms.
    Pass { text: String },
}

/// Aggregated outcome of a `before_agent_start` dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentStartOutcome {
    /// Messages injected by handlers, in registration order.
    pub messages: Vec<String>,
    /// Replacement system prompt, if any handler supplied one. When
    /// several do, the last registration wins.
    pub system_prompt: Option<String>,
}

/// Aggregated outcome of a `session_before_fork` dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForkOutcome {
    /// Set by the first cancelling handler; propagation stopped there.
    pub cancelled_by: Option<String>,
    pub skip_conversation_restore: bool,
}

impl ForkOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled_by.is_some()
    }
}

/// Aggregated outcome of a `session_before_compact` dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompactOutcome {
    pub cancelled_by: Option<String>,
    /// Handler-supplied compaction summary, replacing the host's own.
    pub summary: Option<String>,
}

impl CompactOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled_by.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names_round_trip() {
        for event_type in EventType::all() {
            assert_eq!(EventType::parse(event_type.name()), Some(*event_type));
        }
        assert_eq!(EventType::parse("no_such_event"), None);
    }

    #[test]
    fn events_serialize_with_snake_case_tags() {
        let event = HookEvent::ToolCall {
            tool_name: "todo".to_string(),
            input: serde_json::json!({ "action": "list" }),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "tool_call");
        assert_eq!(value["tool_name"], "todo");
    }
}
