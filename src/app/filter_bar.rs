use super::PaneSide;
use crate::domain::FilterKind;

/// Single-line editor for the filter of one pane. Every edit is applied to the
/// pane right away, so the bar only tracks text, cursor and kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilterBar {
    pub side: PaneSide,
    pub kind: FilterKind,
    pub text: String,
    pub cursor_col: usize,
}

impl FilterBar {
    pub fn new(side: PaneSide, kind: FilterKind, text: &str) -> Self {
        Self {
            side,
            kind,
            text: text.to_string(),
            cursor_col: text.chars().count(),
        }
    }

    pub fn toggle_kind(&mut self) {
        self.kind = self.kind.toggle();
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut buffer = [0u8; 4];
        self.insert_str(ch.encode_utf8(&mut buffer));
    }

    pub fn insert_str(&mut self, text: &str) {
        let cleaned: String = text.chars().filter(|ch| !ch.is_control()).collect();
        if cleaned.is_empty() {
            return;
        }
        self.clamp_cursor();
        let byte_index = char_to_byte_index(&self.text, self.cursor_col);
        self.text.insert_str(byte_index, &cleaned);
        self.cursor_col += cleaned.chars().count();
    }

    pub fn backspace(&mut self) {
        self.clamp_cursor();
        if self.cursor_col == 0 {
            return;
        }
        self.cursor_col -= 1;
        let byte_index = char_to_byte_index(&self.text, self.cursor_col);
        self.text.remove(byte_index);
    }

    pub fn delete_forward(&mut self) {
        self.clamp_cursor();
        if self.cursor_col >= self.text.chars().count() {
            return;
        }
        let byte_index = char_to_byte_index(&self.text, self.cursor_col);
        self.text.remove(byte_index);
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor_col = 0;
    }

    pub fn move_left(&mut self) {
        self.clamp_cursor();
        self.cursor_col = self.cursor_col.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor_col = (self.cursor_col + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_col = self.text.chars().count();
    }

    fn clamp_cursor(&mut self) {
        self.cursor_col = self.cursor_col.min(self.text.chars().count());
    }
}

fn char_to_byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}
