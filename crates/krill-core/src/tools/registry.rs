//! Tool registry and execution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::render::{self, RenderOptions};
use super::{validate_params, ProgressSender, RegistryError, ToolDefinition, ToolResult};
use crate::context::HostContext;
use crate::ui::Theme;

/// A registered, executable tool.
///
/// `execute` observes `cancel` cooperatively: the runtime cannot
/// preempt a body in progress, it only propagates the signal. Long
/// operations should poll it between steps and return an interrupted
/// result early.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable name the driver calls the tool by.
    fn name(&self) -> &str;

    /// Human label for renderers.
    fn label(&self) -> &str {
        self.name()
    }

    fn description(&self) -> &str;

    /// JSON schema for the parameters.
    fn parameters_schema(&self) -> Value;

    async fn execute(
        &self,
        call_id: &str,
        params: Value,
        cancel: &CancellationToken,
        progress: &ProgressSender,
        ctx: &HostContext,
    ) -> ToolResult;

    /// Render the pending call line. Pure; must not touch tool state.
    fn render_call(&self, input: &Value, theme: &Theme) -> Vec<String> {
        render::default_render_call(self.label(), input, theme)
    }

    /// Render a result (possibly a stale partial). Pure and safe to
    /// call repeatedly.
    fn render_result(
        &self,
        result: &ToolResult,
        options: RenderOptions,
        theme: &Theme,
    ) -> Vec<String> {
        render::default_render_result(result, options, theme)
    }
}

/// Registry of tools, keyed by name. Re-registering a name is rejected;
/// two extensions silently fighting over one name is the bug this
/// refuses.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        let mut tools = self.tools.write().await;
        if tools.contains_key(&name) {
            tracing::warn!(tool = %name, "rejected duplicate tool registration");
            return Err(RegistryError::DuplicateTool { name });
        }
        tools.insert(name, tool);
        Ok(())
    }

    pub async fn unregister(&self, name: &str) -> bool {
        self.tools.write().await.remove(name).is_some()
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().await.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Definitions for the LLM driver, sorted by name.
    pub async fn definitions(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        let mut definitions: Vec<_> = tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.parameters_schema(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Execute a tool by name.
    ///
    /// Parameters are validated against the declared schema first; a
    /// mismatch returns an `invalid_parameters` failed result without
    /// running the body. A token already cancelled at invocation start
    /// returns an interrupted result, also without running the body.
    pub async fn execute(
        &self,
        name: &str,
        call_id: &str,
        params: Value,
        cancel: &CancellationToken,
        progress: &ProgressSender,
        ctx: &HostContext,
    ) -> Result<ToolResult, RegistryError> {
        let tool = self.get(name).await.ok_or_else(|| RegistryError::UnknownTool {
            name: name.to_string(),
        })?;

        if cancel.is_cancelled() {
            tracing::info!(tool = name, call_id, "tool call cancelled before start");
            return Ok(ToolResult::interrupted());
        }

        if let Err(mismatch) = validate_params(&tool.parameters_schema(), &params) {
            tracing::info!(tool = name, call_id, %mismatch, "tool parameters rejected");
            return Ok(ToolResult::invalid_parameters(mismatch));
        }

        let result = tool.execute(call_id, params, cancel, progress, ctx).await;
        tracing::info!(
            tool = name,
            call_id,
            is_error = result.is_error,
            cancelled = result.cancelled,
            "tool execution completed"
        );
        Ok(result)
    }

    /// Execute with a deadline layered on top of cooperative
    /// cancellation: when the timeout elapses the token is cancelled and
    /// the call is treated as cancelled.
    pub async fn execute_with_timeout(
        &self,
        name: &str,
        call_id: &str,
        params: Value,
        cancel: &CancellationToken,
        progress: &ProgressSender,
        ctx: &HostContext,
        timeout: Duration,
    ) -> Result<ToolResult, RegistryError> {
        match tokio::time::timeout(
            timeout,
            self.execute(name, call_id, params, cancel, progress, ctx),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    tool = name,
                    call_id,
                    timeout_secs = timeout.as_secs(),
                    "tool execution timed out; treated as cancelled"
                );
                cancel.cancel();
                Ok(ToolResult::interrupted())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::session::EntryStore;
    use crate::ui::NullUi;

    fn test_ctx() -> HostContext {
        HostContext::new(Arc::new(EntryStore::new("test")), Arc::new(NullUi), None)
    }

    struct EchoTool {
        executions: AtomicUsize,
    }

    impl EchoTool {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                executions: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the given text back"
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"],
                "additionalProperties": false
            })
        }

        async fn execute(
            &self,
            _call_id: &str,
            params: Value,
            cancel: &CancellationToken,
            progress: &ProgressSender,
            _ctx: &HostContext,
        ) -> ToolResult {
            self.executions.fetch_add(1, Ordering::SeqCst);
            if cancel.is_cancelled() {
                return ToolResult::interrupted();
            }
            let text = params["text"].as_str().unwrap_or_default();
            progress.emit(ToolResult::text(format!("{text}...")));
            ToolResult::text(text).with_details(json!({ "length": text.len() }))
        }
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let registry = ToolRegistry::new();
        registry.register(EchoTool::new()).await.unwrap();

        let err = registry.register(EchoTool::new()).await.unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTool { name } if name == "echo"));
        assert_eq!(registry.names().await, vec!["echo".to_string()]);
    }

    #[tokio::test]
    async fn unknown_tool_is_a_registry_error() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute(
                "missing",
                "c1",
                json!({}),
                &CancellationToken::new(),
                &ProgressSender::disabled("c1"),
                &test_ctx(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownTool { .. }));
    }

    #[tokio::test]
    async fn invalid_params_fail_before_the_body_runs() {
        let registry = ToolRegistry::new();
        let tool = EchoTool::new();
        registry.register(tool.clone()).await.unwrap();

        let result = registry
            .execute(
                "echo",
                "c1",
                json!({ "text": 42 }),
                &CancellationToken::new(),
                &ProgressSender::disabled("c1"),
                &test_ctx(),
            )
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.text_content().contains("Invalid parameters"));
        assert_eq!(tool.executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pre_cancelled_call_emits_no_progress_and_skips_the_body() {
        let registry = ToolRegistry::new();
        let tool = EchoTool::new();
        registry.register(tool.clone()).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = registry
            .execute(
                "echo",
                "c1",
                json!({ "text": "hi" }),
                &cancel,
                &ProgressSender::new("c1", tx),
                &test_ctx(),
            )
            .await
            .unwrap();

        assert!(result.cancelled);
        assert!(!result.is_error);
        assert!(rx.try_recv().is_err());
        assert_eq!(tool.executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn normal_run_streams_partials_then_one_final() {
        let registry = ToolRegistry::new();
        registry.register(EchoTool::new()).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = registry
            .execute(
                "echo",
                "c7",
                json!({ "text": "hello" }),
                &CancellationToken::new(),
                &ProgressSender::new("c7", tx),
                &test_ctx(),
            )
            .await
            .unwrap();

        let partial = rx.try_recv().unwrap();
        assert_eq!(partial.call_id, "c7");
        assert_eq!(partial.result.text_content(), "hello...");
        assert!(rx.try_recv().is_err());

        assert_eq!(result.text_content(), "hello");
        assert_eq!(result.details, Some(json!({ "length": 5 })));
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Sleeps until cancelled"
        }

        fn parameters_schema(&self) -> Value {
            json!({ "type": "object" })
        }

        async fn execute(
            &self,
            _call_id: &str,
            _params: Value,
            cancel: &CancellationToken,
            _progress: &ProgressSender,
            _ctx: &HostContext,
        ) -> ToolResult {
            tokio::select! {
                () = cancel.cancelled() => ToolResult::interrupted(),
                () = tokio::time::sleep(Duration::from_secs(60)) => ToolResult::text("done"),
            }
        }
    }

    #[tokio::test]
    async fn timeout_is_treated_as_cancelled() {
        let registry = ToolRegistry::new();
        registry.register(Arc::new(SlowTool)).await.unwrap();

        let cancel = CancellationToken::new();
        let result = registry
            .execute_with_timeout(
                "slow",
                "c1",
                json!({}),
                &cancel,
                &ProgressSender::disabled("c1"),
                &test_ctx(),
                Duration::from_millis(20),
            )
            .await
            .unwrap();

        assert!(result.cancelled);
        // The cooperative signal was propagated for the abandoned body.
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn render_is_pure_and_safe_on_stale_partials() {
        let tool = EchoTool::new();
        let theme = Theme::plain();
        let stale_partial = ToolResult::text("hel...");

        let options = RenderOptions {
            is_partial: true,
            expanded: false,
        };
        let first = tool.render_result(&stale_partial, options, &theme);
        let second = tool.render_result(&stale_partial, options, &theme);
        assert_eq!(first, second);
        assert_eq!(tool.executions.load(Ordering::SeqCst), 0);
    }
}
