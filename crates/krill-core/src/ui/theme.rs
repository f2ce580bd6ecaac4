//! Semantic text styling.
//!
//! The core never emits escape sequences itself. A style is an opaque
//! prefix/suffix pair the host fills in (ANSI, markup, or nothing);
//! the default theme is plain text, which also keeps renderer tests
//! byte-stable.

/// One style role: text is wrapped in `prefix`/`suffix` when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub prefix: String,
    pub suffix: String,
}

impl TextStyle {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn apply(&self, text: &str) -> String {
        if self.prefix.is_empty() && self.suffix.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.prefix, text, self.suffix)
        }
    }
}

/// Palette of semantic roles used by pickers and tool renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Theme {
    pub accent_style: TextStyle,
    pub dim_style: TextStyle,
    pub error_style: TextStyle,
    pub success_style: TextStyle,
    pub bold_style: TextStyle,
}

impl Theme {
    /// A theme that decorates nothing.
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn accent(&self, text: &str) -> String {
        self.accent_style.apply(text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.dim_style.apply(text)
    }

    pub fn error(&self, text: &str) -> String {
        self.error_style.apply(text)
    }

    pub fn success(&self, text: &str) -> String {
        self.success_style.apply(text)
    }

    pub fn bold(&self, text: &str) -> String {
        self.bold_style.apply(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_theme_leaves_text_untouched() {
        let theme = Theme::plain();
        assert_eq!(theme.accent("hello"), "hello");
        assert_eq!(theme.error("bad"), "bad");
    }

    #[test]
    fn styles_wrap_with_affixes() {
        let style = TextStyle::new("<b>", "</b>");
        assert_eq!(style.apply("hi"), "<b>hi</b>");
    }
}
