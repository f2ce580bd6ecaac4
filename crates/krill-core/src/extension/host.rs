//! The extension host.
//!
//! Owns the session store, the hook bus, the tool registry, and the
//! command table; installs extensions and drives every lifecycle
//! dispatch. Name collisions between independently authored extensions
//! (tools, commands, custom entry types) are rejected at install time,
//! and a failed install rolls its partial registrations back.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::api::{Command, CustomEntryHandle, Extension};
use super::InstallError;
use crate::context::{ContextUsage, HostContext};
use crate::events::{
    AgentStartOutcome, CompactOutcome, EventBus, EventHandler, EventType, HookEvent,
    InputOutcome, ToolCallVerdict,
};
use crate::session::{EntryId, EntryStore, SessionError};
use crate::tools::{ProgressSender, RegistryError, Tool, ToolRegistry, ToolResult};
use crate::ui::UiHandle;

#[derive(Clone)]
struct RegisteredCommand {
    owner: String,
    description: String,
    handler: Arc<dyn Command>,
}

/// Registration surface handed to [`Extension::setup`].
///
/// Handlers, commands, and custom-type claims apply immediately; tools
/// are collected and applied by the host after setup succeeds. Either
/// way, a failed install removes everything this extension registered.
pub struct ExtensionApi<'host> {
    host: &'host ExtensionHost,
    owner: String,
    pending_tools: Vec<Arc<dyn Tool>>,
}

impl ExtensionApi<'_> {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Subscribe a handler to an event type. Handlers run in
    /// registration order at dispatch time.
    pub fn on(&mut self, event_type: EventType, handler: Arc<dyn EventHandler>) {
        self.host.bus.subscribe(event_type, self.owner.clone(), handler);
    }

    /// Register a tool. The name must be unused across all installed
    /// extensions; the conflict surfaces when the install completes.
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        self.pending_tools.push(tool);
    }

    /// Register a command under `name`.
    pub fn register_command(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn Command>,
    ) -> Result<(), InstallError> {
        let name = name.into();
        let mut commands = self.host.commands.write();
        if let Some(existing) = commands.get(&name) {
            return Err(InstallError::DuplicateCommand {
                name,
                owner: existing.owner.clone(),
            });
        }
        commands.insert(
            name,
            RegisteredCommand {
                owner: self.owner.clone(),
                description: description.into(),
                handler,
            },
        );
        Ok(())
    }

    /// Claim a custom entry type and get its write/replay handle.
    pub fn custom_entries(
        &mut self,
        custom_type: impl Into<String>,
    ) -> Result<CustomEntryHandle, InstallError> {
        let custom_type = custom_type.into();
        let mut claims = self.host.custom_types.lock();
        if let Some(owner) = claims.get(&custom_type) {
            return Err(InstallError::DuplicateCustomType {
                custom_type,
                owner: owner.clone(),
            });
        }
        claims.insert(custom_type.clone(), self.owner.clone());
        Ok(CustomEntryHandle::new(
            custom_type,
            Arc::clone(&self.host.store),
        ))
    }
}

/// Outcome of a fork request after the `session_before_fork` gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkResult {
    /// `None` when a handler cancelled the fork.
    pub new_leaf: Option<EntryId>,
    pub skip_conversation_restore: bool,
}

pub struct ExtensionHost {
    store: Arc<EntryStore>,
    bus: EventBus,
    tools: ToolRegistry,
    commands: RwLock<HashMap<String, RegisteredCommand>>,
    custom_types: Mutex<HashMap<String, String>>,
    installed: Mutex<Vec<String>>,
    ui: Arc<dyn UiHandle>,
    context_usage: Mutex<Option<ContextUsage>>,
}

impl ExtensionHost {
    pub fn new(store: Arc<EntryStore>, ui: Arc<dyn UiHandle>) -> Self {
        Self {
            store,
            bus: EventBus::new(),
            tools: ToolRegistry::new(),
            commands: RwLock::new(HashMap::new()),
            custom_types: Mutex::new(HashMap::new()),
            installed: Mutex::new(Vec::new()),
            ui,
            context_usage: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<EntryStore> {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Update the usage the driving agent reports between turns.
    pub fn set_context_usage(&self, usage: Option<ContextUsage>) {
        *self.context_usage.lock() = usage;
    }

    /// A fresh context for one dispatch or execution.
    pub fn context(&self) -> HostContext {
        HostContext::new(
            Arc::clone(&self.store),
            Arc::clone(&self.ui),
            *self.context_usage.lock(),
        )
    }

    /// Install an extension: run its setup and apply its registrations.
    /// On any failure everything the extension registered is removed
    /// again.
    pub async fn install(&self, extension: &dyn Extension) -> Result<(), InstallError> {
        let owner = extension.name().to_string();
        if self.installed.lock().iter().any(|name| *name == owner) {
            return Err(InstallError::DuplicateExtension { name: owner });
        }

        let mut api = ExtensionApi {
            host: self,
            owner: owner.clone(),
            pending_tools: Vec::new(),
        };

        if let Err(source) = extension.setup(&mut api) {
            drop(api);
            self.rollback(&owner, &[]).await;
            return Err(InstallError::Setup {
                extension: owner,
                source,
            });
        }

        let pending_tools = std::mem::take(&mut api.pending_tools);
        drop(api);

        let mut registered_tools = Vec::new();
        for tool in pending_tools {
            let name = tool.name().to_string();
            if let Err(error) = self.tools.register(tool).await {
                self.rollback(&owner, &registered_tools).await;
                return Err(InstallError::Registry(error));
            }
            registered_tools.push(name);
        }

        self.installed.lock().push(owner.clone());
        tracing::info!(extension = %owner, "extension installed");
        Ok(())
    }

    async fn rollback(&self, owner: &str, tool_names: &[String]) {
        self.bus.unsubscribe_owner(owner);
        self.commands
            .write()
            .retain(|_, command| command.owner != owner);
        self.custom_types.lock().retain(|_, claimed| claimed != owner);
        for name in tool_names {
            self.tools.unregister(name).await;
        }
        tracing::warn!(extension = owner, "extension install rolled back");
    }

    // ------------------------------------------------------------------
    // Lifecycle dispatches
    // ------------------------------------------------------------------

    pub async fn start_session(&self) {
        self.bus.notify(&HookEvent::SessionStart, &self.context()).await;
    }

    pub async fn shutdown(&self) {
        self.bus
            .notify(&HookEvent::SessionShutdown, &self.context())
            .await;
    }

    pub async fn agent_start(&self) {
        self.bus.notify(&HookEvent::AgentStart, &self.context()).await;
    }

    pub async fn agent_end(&self) {
        self.bus.notify(&HookEvent::AgentEnd, &self.context()).await;
    }

    /// Run the `before_agent_start` dispatch for a turn.
    pub async fn before_agent_start(&self, system_prompt: &str) -> AgentStartOutcome {
        self.bus
            .dispatch_before_agent_start(system_prompt, &self.context())
            .await
    }

    /// Run raw user input through the transform pipeline.
    pub async fn submit_input(&self, text: &str) -> InputOutcome {
        self.bus.dispatch_input(text, &self.context()).await
    }

    /// Gate a tool call on the `tool_call` dispatch, then execute it.
    ///
    /// A veto or an aborted dispatch surfaces as a failed tool result
    /// carrying the reason; the driving agent reacts to it like any
    /// other tool failure. Only an unknown tool name is a hard error.
    pub async fn request_tool_call(
        &self,
        name: &str,
        call_id: &str,
        input: Value,
        cancel: &CancellationToken,
        progress: &ProgressSender,
    ) -> Result<ToolResult, RegistryError> {
        let ctx = self.context();

        match self.bus.dispatch_tool_call(name, &input, &ctx).await {
            Ok(ToolCallVerdict::Proceed) => {}
            Ok(ToolCallVerdict::Blocked { reason, by }) => {
                return Ok(ToolResult::error(format!(
                    "Tool call blocked by {by}: {reason}"
                )));
            }
            Err(error) => {
                return Ok(ToolResult::error(format!("Tool call aborted: {error}")));
            }
        }

        self.tools
            .execute(name, call_id, input, cancel, progress, &ctx)
            .await
    }

    /// Fork the session at `at`, unless a `session_before_fork` handler
    /// cancels it. Extensions replay their state from the new branch in
    /// their `session_fork` handlers.
    pub async fn fork_session(&self, at: EntryId) -> Result<ForkResult, SessionError> {
        let ctx = self.context();
        let outcome = self.bus.dispatch_before_fork(at, &ctx).await;
        if let Some(by) = &outcome.cancelled_by {
            tracing::info!(by = %by, at = %at, "fork cancelled by handler");
            return Ok(ForkResult {
                new_leaf: None,
                skip_conversation_restore: outcome.skip_conversation_restore,
            });
        }

        let new_leaf = self.store.fork(at)?;
        self.bus
            .notify(&HookEvent::SessionFork { leaf_id: new_leaf }, &ctx)
            .await;
        Ok(ForkResult {
            new_leaf: Some(new_leaf),
            skip_conversation_restore: outcome.skip_conversation_restore,
        })
    }

    /// Move the current leaf and let extensions replay from the new
    /// branch.
    pub async fn switch_session(&self, leaf: EntryId) -> Result<(), SessionError> {
        self.store.switch_branch(leaf)?;
        self.bus
            .notify(&HookEvent::SessionSwitch { leaf_id: leaf }, &self.context())
            .await;
        Ok(())
    }

    /// Ask extensions about an impending compaction. The host applies
    /// the compaction itself only when the outcome is not cancelled,
    /// preferring a handler-supplied summary.
    pub async fn compact_session(&self) -> CompactOutcome {
        self.bus.dispatch_before_compact(&self.context()).await
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    pub async fn run_command(&self, name: &str, args: &str) -> anyhow::Result<()> {
        let command = self
            .commands
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown command '{name}'"))?;
        command.handler.run(args, &self.context()).await
    }

    /// Registered command names with their descriptions, sorted.
    pub fn command_list(&self) -> Vec<(String, String)> {
        let mut commands: Vec<_> = self
            .commands
            .read()
            .iter()
            .map(|(name, command)| (name.clone(), command.description.clone()))
            .collect();
        commands.sort();
        commands
    }
}
