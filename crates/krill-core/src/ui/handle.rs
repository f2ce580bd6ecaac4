//! Host UI capabilities exposed to extensions.
//!
//! The handle is how handlers, tools, and commands ask the human for
//! something: a confirmation, a pick from a list, a fully custom modal
//! surface. In batch mode (`has_ui() == false`) every call
//! short-circuits to its neutral default so extensions behave sanely
//! without a terminal.

use async_trait::async_trait;
use serde_json::Value;

use super::input::Keybindings;
use super::surface::{Done, Surface, SurfaceHandle};
use super::theme::Theme;

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warning,
    Error,
}

/// Where a persistent widget is anchored relative to the input editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetPlacement {
    AboveInput,
    BelowInput,
}

/// Builder for a custom modal surface.
///
/// The completion value is carried as JSON so the trait stays object
/// safe; callers deserialize on their side of the channel.
pub type SurfaceBuilder =
    Box<dyn FnOnce(SurfaceHandle, Theme, Keybindings, Done<Value>) -> Box<dyn Surface> + Send>;

/// The host's interactive capabilities.
#[async_trait]
pub trait UiHandle: Send + Sync {
    /// False in non-interactive/batch mode.
    fn has_ui(&self) -> bool {
        true
    }

    /// Yes/no question. Batch default: `false`.
    async fn confirm(&self, title: &str, body: &str) -> bool;

    /// Pick one of `options`. Batch default: `None`.
    async fn select(&self, prompt: &str, options: &[String]) -> Option<String>;

    /// Transient message outside the conversation flow.
    fn notify(&self, text: &str, level: NotifyLevel);

    /// Set or clear (`None`) a keyed status line.
    fn set_status(&self, key: &str, text: Option<String>);

    /// Set or clear (`None`) a keyed widget anchored near the editor.
    fn set_widget(&self, key: &str, lines: Option<Vec<String>>, placement: WidgetPlacement);

    /// Run a custom modal surface until it completes. Batch default:
    /// `None`, without building the surface.
    async fn custom(&self, builder: SurfaceBuilder) -> Option<Value>;
}

/// Batch-mode UI: answers every question with its neutral default and
/// routes notifications to the log.
pub struct NullUi;

#[async_trait]
impl UiHandle for NullUi {
    fn has_ui(&self) -> bool {
        false
    }

    async fn confirm(&self, _title: &str, _body: &str) -> bool {
        false
    }

    async fn select(&self, _prompt: &str, _options: &[String]) -> Option<String> {
        None
    }

    fn notify(&self, text: &str, level: NotifyLevel) {
        match level {
            NotifyLevel::Info => tracing::info!(text, "notification"),
            NotifyLevel::Warning => tracing::warn!(text, "notification"),
            NotifyLevel::Error => tracing::error!(text, "notification"),
        }
    }

    fn set_status(&self, _key: &str, _text: Option<String>) {}

    fn set_widget(&self, _key: &str, _lines: Option<Vec<String>>, _placement: WidgetPlacement) {}

    async fn custom(&self, _builder: SurfaceBuilder) -> Option<Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn batch_ui_short_circuits_every_call() {
        let ui = NullUi;
        assert!(!ui.has_ui());
        assert!(!ui.confirm("Delete everything?", "Really?").await);
        assert_eq!(ui.select("Pick", &["a".to_string()]).await, None);

        let built = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let built_flag = std::sync::Arc::clone(&built);
        let result = ui
            .custom(Box::new(move |_, _, _, _| {
                built_flag.store(true, std::sync::atomic::Ordering::SeqCst);
                unreachable!("batch mode must not build surfaces")
            }))
            .await;

        assert_eq!(result, None);
        assert!(!built.load(std::sync::atomic::Ordering::SeqCst));
    }
}
