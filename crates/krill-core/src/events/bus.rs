//! Hook dispatch.
//!
//! Handlers run strictly in registration order, one at a time; a
//! suspended handler (awaiting a confirmation, for example) holds up the
//! rest of its dispatch so every veto sees a consistent world. Dispatches
//! for unrelated event types interleave freely.
//!
//! Failure policy, per category: a handler error during a transform or
//! notification dispatch is logged and treated as no opinion. The
//! interceptable `tool_call` category fails closed instead; a broken
//! veto handler must not wave actions through.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::types::{
    AgentStartOutcome, CompactOutcome, EventType, ForkOutcome, HookEvent, HookOutcome,
    InputAction, InputOutcome, ToolCallVerdict,
};
use super::DispatchError;
use crate::context::HostContext;
use crate::session::EntryId;

/// A subscriber to one event type.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &HookEvent, ctx: &HostContext)
        -> anyhow::Result<HookOutcome>;
}

#[derive(Clone)]
struct Subscription {
    owner: String,
    handler: Arc<dyn EventHandler>,
}

/// Per-event-type subscription lists, dispatched in registration order.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventType, Vec<Subscription>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event_type`, owned by `owner` (the
    /// extension's name, used for logging and teardown).
    pub fn subscribe(
        &self,
        event_type: EventType,
        owner: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) {
        self.handlers
            .write()
            .entry(event_type)
            .or_default()
            .push(Subscription {
                owner: owner.into(),
                handler,
            });
    }

    /// Drop every subscription registered by `owner`.
    pub fn unsubscribe_owner(&self, owner: &str) {
        let mut handlers = self.handlers.write();
        for subscriptions in handlers.values_mut() {
            subscriptions.retain(|subscription| subscription.owner != owner);
        }
    }

    /// Number of subscriptions for one event type.
    pub fn subscriber_count(&self, event_type: EventType) -> usize {
        self.handlers
            .read()
            .get(&event_type)
            .map_or(0, Vec::len)
    }

    fn subscriptions(&self, event_type: EventType) -> Vec<Subscription> {
        self.handlers
            .read()
            .get(&event_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Interceptable dispatch: the first handler returning a block
    /// decision wins and the rest are skipped. A handler error aborts
    /// the action.
    pub async fn dispatch_tool_call(
        &self,
        tool_name: &str,
        input: &Value,
        ctx: &HostContext,
    ) -> Result<ToolCallVerdict, DispatchError> {
        let event = HookEvent::ToolCall {
            tool_name: tool_name.to_string(),
            input: input.clone(),
        };

        for subscription in self.subscriptions(EventType::ToolCall) {
            match subscription.handler.handle(&event, ctx).await {
                Ok(HookOutcome::Block { reason }) => {
                    tracing::info!(
                        tool = tool_name,
                        owner = %subscription.owner,
                        reason = %reason,
                        "tool call blocked"
                    );
                    return Ok(ToolCallVerdict::Blocked {
                        reason,
                        by: subscription.owner,
                    });
                }
                Ok(HookOutcome::NoOpinion) => {}
                Ok(other) => {
                    ignored_outcome(&subscription.owner, EventType::ToolCall, &other);
                }
                Err(source) => {
                    tracing::warn!(
                        tool = tool_name,
                        owner = %subscription.owner,
                        error = %source,
                        "tool_call handler failed; aborting action"
                    );
                    return Err(DispatchError::ActionAborted {
                        event: EventType::ToolCall.name(),
                        owner: subscription.owner,
                        source,
                    });
                }
            }
        }

        Ok(ToolCallVerdict::Proceed)
    }

    /// Transform dispatch: handlers may consume the input or rewrite it
    /// for the next handler; the final text is what the host acts on.
    pub async fn dispatch_input(&self, text: &str, ctx: &HostContext) -> InputOutcome {
        let mut current = text.to_string();

        for subscription in self.subscriptions(EventType::Input) {
            let event = HookEvent::Input {
                text: current.clone(),
            };
            match subscription.handler.handle(&event, ctx).await {
                Ok(HookOutcome::Input(InputAction::Handled)) => {
                    return InputOutcome::Handled {
                        by: subscription.owner,
                    };
                }
                Ok(HookOutcome::Input(InputAction::Transform { text })) => {
                    current = text;
                }
                Ok(HookOutcome::Input(InputAction::Continue) | HookOutcome::NoOpinion) => {}
                Ok(other) => {
                    ignored_outcome(&subscription.owner, EventType::Input, &other);
                }
                Err(error) => {
                    handler_failed(&subscription.owner, EventType::Input, &error);
                }
            }
        }

        InputOutcome::Pass { text: current }
    }

    /// All handlers run; each may inject a message and/or replace the
    /// system prompt. Competing prompt replacements are last-write-wins.
    pub async fn dispatch_before_agent_start(
        &self,
        system_prompt: &str,
        ctx: &HostContext,
    ) -> AgentStartOutcome {
        let mut outcome = AgentStartOutcome::default();
        let mut current_prompt = system_prompt.to_string();

        for subscription in self.subscriptions(EventType::BeforeAgentStart) {
            let event = HookEvent::BeforeAgentStart {
                system_prompt: current_prompt.clone(),
            };
            match subscription.handler.handle(&event, ctx).await {
                Ok(HookOutcome::AgentStart {
                    message,
                    system_prompt,
                }) => {
                    if let Some(message) = message {
                        outcome.messages.push(message);
                    }
                    if let Some(prompt) = system_prompt {
                        current_prompt = prompt.clone();
                        outcome.system_prompt = Some(prompt);
                    }
                }
                Ok(HookOutcome::NoOpinion) => {}
                Ok(other) => {
                    ignored_outcome(&subscription.owner, EventType::BeforeAgentStart, &other);
                }
                Err(error) => {
                    handler_failed(&subscription.owner, EventType::BeforeAgentStart, &error);
                }
            }
        }

        outcome
    }

    /// Cancellable notification: the first cancelling handler stops
    /// propagation and the fork does not happen. Skip-restore flags
    /// from handlers that ran are kept either way.
    pub async fn dispatch_before_fork(
        &self,
        entry_id: EntryId,
        ctx: &HostContext,
    ) -> ForkOutcome {
        let event = HookEvent::SessionBeforeFork { entry_id };
        let mut outcome = ForkOutcome::default();

        for subscription in self.subscriptions(EventType::SessionBeforeFork) {
            match subscription.handler.handle(&event, ctx).await {
                Ok(HookOutcome::Fork {
                    cancel,
                    skip_conversation_restore,
                }) => {
                    outcome.skip_conversation_restore |= skip_conversation_restore;
                    if cancel {
                        outcome.cancelled_by = Some(subscription.owner);
                        return outcome;
                    }
                }
                Ok(HookOutcome::NoOpinion) => {}
                Ok(other) => {
                    ignored_outcome(&subscription.owner, EventType::SessionBeforeFork, &other);
                }
                Err(error) => {
                    handler_failed(&subscription.owner, EventType::SessionBeforeFork, &error);
                }
            }
        }

        outcome
    }

    /// Cancellable notification: first cancel stops propagation. A
    /// handler-supplied summary replaces the host's own; when several
    /// handlers supply one, the last registration wins.
    pub async fn dispatch_before_compact(&self, ctx: &HostContext) -> CompactOutcome {
        let event = HookEvent::SessionBeforeCompact;
        let mut outcome = CompactOutcome::default();

        for subscription in self.subscriptions(EventType::SessionBeforeCompact) {
            match subscription.handler.handle(&event, ctx).await {
                Ok(HookOutcome::Compact { cancel, summary }) => {
                    if summary.is_some() {
                        outcome.summary = summary;
                    }
                    if cancel {
                        outcome.cancelled_by = Some(subscription.owner);
                        return outcome;
                    }
                }
                Ok(HookOutcome::NoOpinion) => {}
                Ok(other) => {
                    ignored_outcome(&subscription.owner, EventType::SessionBeforeCompact, &other);
                }
                Err(error) => {
                    handler_failed(&subscription.owner, EventType::SessionBeforeCompact, &error);
                }
            }
        }

        outcome
    }

    /// Notification-only dispatch: all handlers run, results ignored,
    /// errors logged.
    pub async fn notify(&self, event: &HookEvent, ctx: &HostContext) {
        let event_type = event.event_type();
        for subscription in self.subscriptions(event_type) {
            if let Err(error) = subscription.handler.handle(event, ctx).await {
                handler_failed(&subscription.owner, event_type, &error);
            }
        }
    }
}

fn handler_failed(owner: &str, event_type: EventType, error: &anyhow::Error) {
    tracing::warn!(
        owner = owner,
        event = %event_type,
        error = %error,
        "event handler failed; treated as no opinion"
    );
}

fn ignored_outcome(owner: &str, event_type: EventType, outcome: &HookOutcome) {
    tracing::debug!(
        owner = owner,
        event = %event_type,
        ?outcome,
        "outcome does not apply to this event; ignored"
    );
}
