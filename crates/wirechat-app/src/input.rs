//! Terminal-agnostic keyboard input and the line editor it drives.

/// Keyboard input abstraction.
///
/// Decouples application logic from terminal libraries (crossterm, termion,
/// etc.) enabling deterministic testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Enter/Return key (submit line).
    Enter,
    /// Backspace key (delete character before cursor).
    Backspace,
    /// Delete key (delete character at cursor).
    Delete,
    /// Escape key (quit).
    Esc,
    /// Left arrow key.
    Left,
    /// Right arrow key.
    Right,
    /// Up arrow key.
    Up,
    /// Down arrow key.
    Down,
    /// Home key (cursor to start).
    Home,
    /// End key (cursor to end).
    End,
}

/// Single-line text editor.
///
/// The cursor counts characters, not bytes, so multi-byte input edits
/// cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    buffer: String,
    cursor: usize,
}

impl InputState {
    /// Create an empty input line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters from the start.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Apply an editing key. Returns true if the line changed or the cursor
    /// moved.
    ///
    /// Enter, Esc, Up and Down are not editing keys and are ignored.
    pub fn edit(&mut self, key: KeyInput) -> bool {
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.buffer.insert(at, c);
                self.cursor = self.cursor.saturating_add(1);
                true
            },
            KeyInput::Backspace => {
                if self.cursor == 0 {
                    return false;
                }
                self.cursor = self.cursor.saturating_sub(1);
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                true
            },
            KeyInput::Delete => {
                if self.cursor >= self.len() {
                    return false;
                }
                let at = self.byte_offset(self.cursor);
                self.buffer.remove(at);
                true
            },
            KeyInput::Left => self.move_to(self.cursor.saturating_sub(1)),
            KeyInput::Right => self.move_to(self.cursor.saturating_add(1).min(self.len())),
            KeyInput::Home => self.move_to(0),
            KeyInput::End => self.move_to(self.len()),
            KeyInput::Enter | KeyInput::Esc | KeyInput::Up | KeyInput::Down => false,
        }
    }

    /// Empty the line.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn move_to(&mut self, cursor: usize) -> bool {
        let moved = cursor != self.cursor;
        self.cursor = cursor;
        moved
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> InputState {
        let mut input = InputState::new();
        for c in text.chars() {
            input.edit(KeyInput::Char(c));
        }
        input
    }

    #[test]
    fn char_input_adds_to_buffer() {
        let input = typed("hi");
        assert_eq!(input.buffer(), "hi");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn backspace_removes_char() {
        let mut input = typed("ab");
        input.edit(KeyInput::Backspace);
        assert_eq!(input.buffer(), "a");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn backspace_at_start_is_noop() {
        let mut input = typed("ab");
        input.edit(KeyInput::Home);
        assert!(!input.edit(KeyInput::Backspace));
        assert_eq!(input.buffer(), "ab");
    }

    #[test]
    fn cursor_movement() {
        let mut input = typed("abc");

        input.edit(KeyInput::Home);
        assert_eq!(input.cursor(), 0);

        input.edit(KeyInput::End);
        assert_eq!(input.cursor(), 3);

        input.edit(KeyInput::Left);
        assert_eq!(input.cursor(), 2);

        input.edit(KeyInput::Right);
        input.edit(KeyInput::Right);
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn multibyte_editing() {
        let mut input = typed("héllo");
        input.edit(KeyInput::Home);
        input.edit(KeyInput::Right);
        input.edit(KeyInput::Delete);
        assert_eq!(input.buffer(), "hllo");

        input.edit(KeyInput::Char('ü'));
        assert_eq!(input.buffer(), "hüllo");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn clear_resets_cursor() {
        let mut input = typed("test");
        input.clear();
        assert!(input.buffer().is_empty());
        assert_eq!(input.cursor(), 0);
    }
}
