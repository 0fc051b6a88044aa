//! services/app/src/tui/widgets/input.rs
//!
//! A single-line input buffer with cursor movement, shared by every form
//! and search box in the shell.

use crossterm::event::{KeyCode, KeyModifiers};

#[derive(Debug, Default, Clone)]
pub struct InputBuffer {
    value: String,
    /// Cursor position as a char index into `value`.
    cursor: usize,
    /// Render as bullets (passwords).
    pub masked: bool,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Applies a key press. Returns true if the buffer changed or moved.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match code {
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                let byte_index = self.byte_index();
                self.value.insert(byte_index, c);
                self.cursor += 1;
                true
            }
            KeyCode::Backspace => {
                if self.cursor == 0 {
                    return false;
                }
                self.cursor -= 1;
                let byte_index = self.byte_index();
                self.value.remove(byte_index);
                true
            }
            KeyCode::Delete => {
                if self.cursor >= self.value.chars().count() {
                    return false;
                }
                let byte_index = self.byte_index();
                self.value.remove(byte_index);
                true
            }
            KeyCode::Left => {
                if self.cursor == 0 {
                    return false;
                }
                self.cursor -= 1;
                true
            }
            KeyCode::Right => {
                if self.cursor >= self.value.chars().count() {
                    return false;
                }
                self.cursor += 1;
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = self.value.chars().count();
                true
            }
            _ => false,
        }
    }

    /// The rendered text, with the password mask applied.
    pub fn display(&self) -> String {
        if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(index, _)| index)
            .unwrap_or(self.value.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_at_the_cursor() {
        let mut input = InputBuffer::new();
        for c in "abc".chars() {
            input.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
        input.handle_key(KeyCode::Left, KeyModifiers::NONE);
        input.handle_key(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(input.value(), "abxc");
    }

    #[test]
    fn backspace_at_start_is_a_no_op() {
        let mut input = InputBuffer::new();
        assert!(!input.handle_key(KeyCode::Backspace, KeyModifiers::NONE));
    }

    #[test]
    fn masked_display_hides_the_value() {
        let mut input = InputBuffer::masked();
        input.set_value("secret");
        assert_eq!(input.display(), "••••••");
        assert_eq!(input.value(), "secret");
    }

    #[test]
    fn handles_multibyte_characters() {
        let mut input = InputBuffer::new();
        input.set_value("héllo");
        input.handle_key(KeyCode::Home, KeyModifiers::NONE);
        input.handle_key(KeyCode::Right, KeyModifiers::NONE);
        input.handle_key(KeyCode::Delete, KeyModifiers::NONE);
        assert_eq!(input.value(), "hllo");
    }
}
