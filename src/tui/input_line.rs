//! Lightweight multi-line input buffer with cursor.
//!
//! Stores a `String` and a character-offset cursor. Enter handling lives
//! in the key dispatcher (submit vs. newline); this type only edits.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Text buffer with cursor position (character offset).
#[derive(Debug, Default)]
pub struct InputLine {
    content: String,
    /// Cursor position as a character offset (0 = before first char).
    cursor: usize,
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Clear content and reset cursor.
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Set content and move cursor to end.
    pub fn set_content(&mut self, text: &str) {
        self.content = text.to_string();
        self.cursor = self.content.chars().count();
    }

    /// Insert a character at the cursor position. Bare `\r` is dropped.
    pub fn insert_char(&mut self, ch: char) {
        if ch == '\r' {
            return;
        }
        let byte_offset = self.byte_offset();
        self.content.insert(byte_offset, ch);
        self.cursor += 1;
    }

    /// Insert a string at the cursor position, normalizing line endings.
    pub fn insert_str(&mut self, s: &str) {
        let clean = s.replace("\r\n", "\n").replace('\r', "\n");
        let byte_offset = self.byte_offset();
        self.content.insert_str(byte_offset, &clean);
        self.cursor += clean.chars().count();
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Delete the character before the cursor (Backspace).
    pub fn delete_back(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.remove_at_cursor();
    }

    /// Delete the character at the cursor (Delete key).
    pub fn delete_forward(&mut self) {
        self.remove_at_cursor();
    }

    fn remove_at_cursor(&mut self) {
        let byte_offset = self.byte_offset();
        if let Some(ch) = self.content[byte_offset..].chars().next() {
            self.content
                .replace_range(byte_offset..byte_offset + ch.len_utf8(), "");
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let max = self.content.chars().count();
        if self.cursor < max {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.chars().count();
    }

    /// Delete the word before the cursor (Ctrl+W / Ctrl+Backspace).
    pub fn delete_word_back(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let chars: Vec<char> = self.content.chars().collect();
        let mut pos = self.cursor;
        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && !chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        let start_byte = self.char_to_byte(pos);
        let end_byte = self.byte_offset();
        self.content.replace_range(start_byte..end_byte, "");
        self.cursor = pos;
    }

    /// Handle an editing key. Returns `true` if the key was consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('w') if ctrl => self.delete_word_back(),
            KeyCode::Backspace if ctrl => self.delete_word_back(),
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Char(_) if ctrl => return false,
            KeyCode::Char(ch) => self.insert_char(ch),
            KeyCode::Backspace => self.delete_back(),
            KeyCode::Delete => self.delete_forward(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }

    /// Cursor as (line, column) in characters, for terminal placement.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let before: String = self.content.chars().take(self.cursor).collect();
        let line = before.matches('\n').count();
        let col = before
            .rsplit_once('\n')
            .map(|(_, tail)| tail.chars().count())
            .unwrap_or_else(|| before.chars().count());
        (line, col)
    }

    fn byte_offset(&self) -> usize {
        self.char_to_byte(self.cursor)
    }

    fn char_to_byte(&self, pos: usize) -> usize {
        self.content
            .char_indices()
            .nth(pos)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }
}
