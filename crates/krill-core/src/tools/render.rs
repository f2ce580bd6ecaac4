//! Default tool renderers.
//!
//! Rendering is a pure function of the result, the options, and the
//! theme. Partials may be rendered after the final result has already
//! arrived; a renderer must not care.

use serde_json::Value;

use super::ToolResult;
use crate::ui::Theme;

/// How the caller wants a result rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// The result is a progress partial, superseded later.
    pub is_partial: bool,
    /// Show the full content instead of the summary line.
    pub expanded: bool,
}

/// One line summarizing a pending call: label plus compacted input.
pub fn default_render_call(label: &str, input: &Value, theme: &Theme) -> Vec<String> {
    let args = compact_args(input);
    if args.is_empty() {
        vec![theme.bold(label)]
    } else {
        vec![format!("{} {}", theme.bold(label), theme.dim(&args))]
    }
}

pub fn default_render_result(
    result: &ToolResult,
    options: RenderOptions,
    theme: &Theme,
) -> Vec<String> {
    if result.cancelled {
        return vec![theme.dim("cancelled")];
    }
    if options.is_partial {
        let mut line = first_line(&result.text_content());
        line.push('…');
        return vec![theme.dim(&line)];
    }
    if result.is_error {
        return vec![theme.error(&format!("✗ {}", first_line(&result.text_content())))];
    }

    let text = result.text_content();
    if options.expanded {
        let mut lines = vec![theme.success("✓")];
        lines.extend(text.lines().map(str::to_string));
        lines
    } else {
        vec![theme.success(&format!("✓ {}", first_line(&text)))]
    }
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().to_string()
}

const MAX_ARGS_WIDTH: usize = 80;

/// Compact `{"a": 1, "b": "x"}` into `a=1 b=x`, truncated for a
/// one-line summary.
fn compact_args(input: &Value) -> String {
    let rendered = match input {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{key}={s}"),
                other => format!("{key}={other}"),
            })
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null => String::new(),
        other => other.to_string(),
    };

    if rendered.chars().count() > MAX_ARGS_WIDTH {
        let truncated: String = rendered.chars().take(MAX_ARGS_WIDTH - 1).collect();
        format!("{truncated}…")
    } else {
        rendered
    }
}
