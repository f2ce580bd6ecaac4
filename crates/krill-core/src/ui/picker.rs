//! List/option picker.
//!
//! A fixed two-state machine. `Browsing` moves a selection over the
//! items; picking a concrete option completes the surface, picking the
//! "enter custom value" affordance switches to `Editing`, and escape
//! dismisses with `None`. `Editing` runs an embedded line editor;
//! escape returns to `Browsing`, submit completes with the typed value.

use super::input::{InputEvent, Keybindings};
use super::surface::{Done, ModalSession, Surface, SurfaceHandle};
use super::theme::Theme;

/// One pickable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerItem {
    /// A concrete option; picking it completes with `value`.
    Choice { value: String, label: String },
    /// The "enter custom value" affordance; picking it opens the editor.
    CustomInput { label: String },
}

impl PickerItem {
    pub fn choice(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::Choice {
            label: value.clone(),
            value,
        }
    }

    pub fn choice_labelled(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Choice {
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn custom_input(label: impl Into<String>) -> Self {
        Self::CustomInput {
            label: label.into(),
        }
    }

    fn label(&self) -> &str {
        match self {
            PickerItem::Choice { label, .. } | PickerItem::CustomInput { label } => label,
        }
    }
}

/// Picker state. `Browsing` and `Editing` are the only non-terminal
/// states; completion goes through the `Done` handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    Browsing,
    Editing,
}

/// Minimal single-line text editor, embeddable as a child surface.
#[derive(Default)]
pub struct LineEditor {
    buffer: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Surface for LineEditor {
    fn render(&mut self, _width: usize) -> Vec<String> {
        vec![format!("> {}", self.buffer)]
    }

    fn handle_input(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Char(c) => self.buffer.push(*c),
            InputEvent::Backspace => {
                self.buffer.pop();
            }
            _ => {}
        }
    }
}

/// The option picker surface.
pub struct OptionPicker {
    title: String,
    items: Vec<PickerItem>,
    selected: usize,
    mode: PickerMode,
    editor: LineEditor,
    theme: Theme,
    keys: Keybindings,
    handle: SurfaceHandle,
    done: Done<String>,
}

impl OptionPicker {
    pub fn new(
        title: impl Into<String>,
        items: Vec<PickerItem>,
        handle: SurfaceHandle,
        theme: Theme,
        keys: Keybindings,
        done: Done<String>,
    ) -> Self {
        Self {
            title: title.into(),
            items,
            selected: 0,
            mode: PickerMode::Browsing,
            editor: LineEditor::new(),
            theme,
            keys,
            handle,
            done,
        }
    }

    /// Build a ready-to-drive modal session around a picker.
    pub fn session(
        title: impl Into<String>,
        items: Vec<PickerItem>,
        theme: Theme,
        keys: Keybindings,
    ) -> ModalSession<String> {
        let title = title.into();
        ModalSession::new(theme, keys, move |handle, theme, keys, done| {
            Box::new(OptionPicker::new(title, items, handle, theme, keys, done))
        })
    }

    pub fn mode(&self) -> PickerMode {
        self.mode
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    fn browse(&mut self, event: &InputEvent) {
        if self.keys.is_up(event) {
            self.selected = self.selected.saturating_sub(1);
        } else if self.keys.is_down(event) {
            if self.selected + 1 < self.items.len() {
                self.selected += 1;
            }
        } else if self.keys.is_submit(event) {
            match self.items.get(self.selected) {
                Some(PickerItem::Choice { value, .. }) => {
                    self.done.done(value.clone());
                }
                Some(PickerItem::CustomInput { .. }) => {
                    self.editor.clear();
                    self.mode = PickerMode::Editing;
                }
                None => {}
            }
        } else if self.keys.is_cancel(event) {
            self.done.cancel();
        }
    }

    fn edit(&mut self, event: &InputEvent) {
        if self.keys.is_cancel(event) {
            self.mode = PickerMode::Browsing;
        } else if self.keys.is_submit(event) {
            let value = self.editor.value().trim().to_string();
            if !value.is_empty() {
                self.done.done(value);
            }
        } else {
            // Focused child gets everything else.
            self.editor.handle_input(event);
        }
    }
}

impl Surface for OptionPicker {
    fn render(&mut self, width: usize) -> Vec<String> {
        let mut lines = vec![self.theme.accent(&self.theme.bold(&self.title))];

        for (index, item) in self.items.iter().enumerate() {
            let marker = if index == self.selected { "▶ " } else { "  " };
            let label = match item {
                PickerItem::Choice { .. } => item.label().to_string(),
                PickerItem::CustomInput { .. } => self.theme.dim(item.label()),
            };
            let mut line = format!("{marker}{label}");
            if line.chars().count() > width {
                line = line.chars().take(width).collect();
            }
            lines.push(line);
        }

        if self.mode == PickerMode::Editing {
            lines.extend(self.editor.render(width));
        }

        lines
    }

    fn handle_input(&mut self, event: &InputEvent) {
        match self.mode {
            PickerMode::Browsing => self.browse(event),
            PickerMode::Editing => self.edit(event),
        }
        self.handle.request_render();
    }

    fn invalidate(&mut self) {
        self.editor.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items_with_custom_at_index_2() -> Vec<PickerItem> {
        vec![
            PickerItem::choice("small"),
            PickerItem::choice("medium"),
            PickerItem::custom_input("enter custom value"),
            PickerItem::choice("large"),
        ]
    }

    fn picker_session() -> ModalSession<String> {
        OptionPicker::session(
            "Pick a size",
            items_with_custom_at_index_2(),
            Theme::plain(),
            Keybindings::default(),
        )
    }

    fn feed(session: &mut ModalSession<String>, events: &[InputEvent]) {
        for event in events {
            session.handle_input(event);
        }
    }

    #[tokio::test]
    async fn enter_on_a_concrete_option_completes_with_its_value() {
        let mut session = picker_session();
        feed(
            &mut session,
            &[InputEvent::Down, InputEvent::Enter],
        );
        assert_eq!(session.into_result().as_deref(), Some("medium"));
    }

    #[tokio::test]
    async fn escape_while_browsing_cancels() {
        let mut session = picker_session();
        feed(&mut session, &[InputEvent::Escape]);
        assert!(session.is_finished());
        assert_eq!(session.into_result(), None);
    }

    #[test]
    fn down_down_enter_onto_the_custom_affordance_starts_editing() {
        let handle = SurfaceHandle::new();
        let (done, _rx) = done_channel();
        let mut picker = OptionPicker::new(
            "Pick",
            items_with_custom_at_index_2(),
            handle,
            Theme::plain(),
            Keybindings::default(),
            done,
        );

        for event in [InputEvent::Down, InputEvent::Down, InputEvent::Enter] {
            picker.handle_input(&event);
        }

        assert_eq!(picker.selected(), 2);
        assert_eq!(picker.mode(), PickerMode::Editing);
    }

    #[test]
    fn escape_from_editing_returns_to_browsing_without_completing() {
        let handle = SurfaceHandle::new();
        let (done, _rx) = done_channel();
        let mut picker = OptionPicker::new(
            "Pick",
            items_with_custom_at_index_2(),
            handle,
            Theme::plain(),
            Keybindings::default(),
            done.clone(),
        );

        for event in [
            InputEvent::Down,
            InputEvent::Down,
            InputEvent::Enter,
            InputEvent::Escape,
        ] {
            picker.handle_input(&event);
        }

        assert_eq!(picker.mode(), PickerMode::Browsing);
        assert!(!done.is_resolved());
    }

    #[tokio::test]
    async fn typed_value_submits_from_editing() {
        let mut session = picker_session();
        feed(
            &mut session,
            &[InputEvent::Down, InputEvent::Down, InputEvent::Enter],
        );
        session.handle_raw("huge");
        session.handle_input(&InputEvent::Enter);

        assert_eq!(session.into_result().as_deref(), Some("huge"));
    }

    #[tokio::test]
    async fn empty_submit_stays_in_editing() {
        let mut session = picker_session();
        feed(
            &mut session,
            &[
                InputEvent::Down,
                InputEvent::Down,
                InputEvent::Enter,
                InputEvent::Enter,
            ],
        );
        assert!(!session.is_finished());
    }

    #[tokio::test]
    async fn selection_clamps_at_both_ends() {
        let mut session = picker_session();
        feed(&mut session, &[InputEvent::Up, InputEvent::Up, InputEvent::Enter]);
        assert_eq!(session.into_result().as_deref(), Some("small"));
    }

    #[tokio::test]
    async fn editor_lines_are_merged_into_the_render() {
        let mut session = picker_session();
        feed(
            &mut session,
            &[InputEvent::Down, InputEvent::Down, InputEvent::Enter],
        );
        session.handle_raw("hug");

        let lines = session.render(40);
        assert_eq!(lines.last().unwrap(), "> hug");
    }

    #[tokio::test]
    async fn input_marks_the_surface_dirty() {
        let mut session = picker_session();
        session.needs_render();
        session.handle_input(&InputEvent::Down);
        assert!(session.needs_render());
    }

    fn done_channel() -> (Done<String>, tokio::sync::oneshot::Receiver<Option<String>>) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        (Done::from_sender(tx), rx)
    }
}
