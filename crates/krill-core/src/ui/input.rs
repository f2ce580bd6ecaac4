//! Input events for modal surfaces.
//!
//! Surfaces see a small fixed set of named keys plus pass-through
//! character input. Decoding covers the common single-key escape
//! sequences; anything else arrives as characters or is dropped, and a
//! richer host can construct `InputEvent`s itself.

/// A decoded key delivered to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Up,
    Down,
    Enter,
    Escape,
    Backspace,
    Char(char),
}

/// Decode a raw input chunk into events.
pub fn decode(raw: &str) -> Vec<InputEvent> {
    let mut events = Vec::new();
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\x1b' => match chars.peek() {
                Some('[') => {
                    chars.next();
                    match chars.next() {
                        Some('A') => events.push(InputEvent::Up),
                        Some('B') => events.push(InputEvent::Down),
                        // Unhandled CSI sequence: consume to its final byte.
                        Some(mut byte) => {
                            while !('\x40'..='\x7e').contains(&byte) {
                                match chars.next() {
                                    Some(next) => byte = next,
                                    None => break,
                                }
                            }
                        }
                        None => {}
                    }
                }
                _ => events.push(InputEvent::Escape),
            },
            '\r' | '\n' => events.push(InputEvent::Enter),
            '\x7f' | '\x08' => events.push(InputEvent::Backspace),
            c if c.is_control() => {}
            c => events.push(InputEvent::Char(c)),
        }
    }

    events
}

/// Key mappings a surface consults for navigation, so hosts can offer
/// alternates (vim-style j/k, for example) without the surface knowing.
#[derive(Debug, Clone)]
pub struct Keybindings {
    pub up: Vec<InputEvent>,
    pub down: Vec<InputEvent>,
    pub submit: Vec<InputEvent>,
    pub cancel: Vec<InputEvent>,
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            up: vec![InputEvent::Up],
            down: vec![InputEvent::Down],
            submit: vec![InputEvent::Enter],
            cancel: vec![InputEvent::Escape],
        }
    }
}

impl Keybindings {
    pub fn is_up(&self, event: &InputEvent) -> bool {
        self.up.contains(event)
    }

    pub fn is_down(&self, event: &InputEvent) -> bool {
        self.down.contains(event)
    }

    pub fn is_submit(&self, event: &InputEvent) -> bool {
        self.submit.contains(event)
    }

    pub fn is_cancel(&self, event: &InputEvent) -> bool {
        self.cancel.contains(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_keys() {
        assert_eq!(decode("\x1b[A"), vec![InputEvent::Up]);
        assert_eq!(decode("\x1b[B"), vec![InputEvent::Down]);
        assert_eq!(decode("\r"), vec![InputEvent::Enter]);
        assert_eq!(decode("\x1b"), vec![InputEvent::Escape]);
        assert_eq!(decode("\x7f"), vec![InputEvent::Backspace]);
    }

    #[test]
    fn decodes_text_as_characters() {
        assert_eq!(
            decode("hi"),
            vec![InputEvent::Char('h'), InputEvent::Char('i')]
        );
    }

    #[test]
    fn unknown_csi_sequences_are_dropped() {
        // Cursor position report followed by a normal key.
        assert_eq!(decode("\x1b[12;40Rx"), vec![InputEvent::Char('x')]);
    }

    #[test]
    fn alternate_keybindings_match() {
        let keys = Keybindings {
            up: vec![InputEvent::Up, InputEvent::Char('k')],
            ..Keybindings::default()
        };
        assert!(keys.is_up(&InputEvent::Char('k')));
        assert!(!keys.is_up(&InputEvent::Char('j')));
    }
}
