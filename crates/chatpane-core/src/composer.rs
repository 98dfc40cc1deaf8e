//! Composer state: text being typed, the picked file and the admin selectors

use crate::request::{Mode, Operation, Submission};
use crate::state::Attachment;

/// Rows the input grows to before it starts scrolling
pub const MAX_INPUT_ROWS: u16 = 6;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Clone)]
pub struct Composer {
    pub text: String,
    /// Cursor position in characters
    pub cursor: usize,
    pub attachment: Option<Attachment>,
    /// Path typed into the file picker
    pub picker_input: String,
    pub mode: Mode,
    pub operation: Operation,
    /// First visible row when the text is taller than the input
    pub scroll: u16,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            attachment: None,
            picker_input: String::new(),
            mode: Mode::Input,
            operation: Operation::Get,
            scroll: 0,
        }
    }

    /// Mode actually sent: non-admin sessions always query
    pub fn effective_mode(&self, is_admin: bool) -> Mode {
        if is_admin {
            self.mode
        } else {
            Mode::Query
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.text.trim().is_empty() || self.attachment.is_some()
    }

    /// Emit the current input and reset text, file and file picker.
    /// Returns `None` (and changes nothing) when there is nothing to send.
    pub fn submit(&mut self, is_admin: bool) -> Option<Submission> {
        if !self.can_submit() {
            return None;
        }

        let mode = self.effective_mode(is_admin);
        let operation = (mode == Mode::Data).then_some(self.operation);
        let submission = Submission {
            text: std::mem::take(&mut self.text),
            attachment: self.attachment.take(),
            mode,
            operation,
        };

        self.cursor = 0;
        self.scroll = 0;
        self.picker_input.clear();
        Some(submission)
    }

    /// Apply a query picked from the history panel. The slot is emptied so
    /// the same selection is not applied twice. Returns whether anything was
    /// applied (the caller focuses the input in that case).
    pub fn apply_selected_query(&mut self, selected: &mut Option<String>) -> bool {
        match selected.take() {
            Some(query) if !query.is_empty() => {
                self.text = query;
                self.cursor = self.text.chars().count();
                self.mode = Mode::Query;
                true
            }
            _ => false,
        }
    }

    pub fn select_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn select_operation(&mut self, operation: Operation) {
        self.operation = operation;
    }

    pub fn attach(&mut self, attachment: Attachment) {
        self.attachment = Some(attachment);
    }

    pub fn remove_attachment(&mut self) {
        self.attachment = None;
        self.picker_input.clear();
    }

    // Editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        let (_, col) = self.cursor_row_col();
        self.cursor -= col;
    }

    pub fn move_end(&mut self) {
        let rest = self.text.chars().skip(self.cursor).take_while(|&c| c != '\n').count();
        self.cursor += rest;
    }

    pub fn move_up(&mut self) {
        let (row, col) = self.cursor_row_col();
        if row > 0 {
            self.cursor = self.position_of(row - 1, col);
        }
    }

    pub fn move_down(&mut self) {
        let (row, col) = self.cursor_row_col();
        if row + 1 < self.line_count() {
            self.cursor = self.position_of(row + 1, col);
        }
    }

    // Layout

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// (row, column) of the cursor, both in characters
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let mut row = 0;
        let mut col = 0;
        for c in self.text.chars().take(self.cursor) {
            if c == '\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (row, col)
    }

    /// Character index of (row, col), clamping col to the line length
    fn position_of(&self, row: usize, col: usize) -> usize {
        let mut index = 0;
        for (i, line) in self.text.split('\n').enumerate() {
            let len = line.chars().count();
            if i == row {
                return index + col.min(len);
            }
            index += len + 1;
        }
        self.text.chars().count()
    }

    /// Rows the input should occupy: one per line, capped
    pub fn visible_rows(&self) -> u16 {
        (self.line_count() as u16).clamp(1, MAX_INPUT_ROWS)
    }

    /// Keep the cursor row inside the visible window
    pub fn scroll_to_cursor(&mut self) {
        let (row, _) = self.cursor_row_col();
        let row = row as u16;
        let rows = self.visible_rows();
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + rows {
            self.scroll = row + 1 - rows;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> Composer {
        let mut composer = Composer::new();
        for c in text.chars() {
            if c == '\n' {
                composer.insert_newline();
            } else {
                composer.insert_char(c);
            }
        }
        composer
    }

    #[test]
    fn test_cannot_submit_blank() {
        let mut composer = typed("   ");
        assert!(!composer.can_submit());
        assert_eq!(composer.submit(true), None);
        assert_eq!(composer.text, "   ");
    }

    #[test]
    fn test_submit_clears_text_file_and_picker() {
        let mut composer = typed("hi");
        composer.picker_input = "/tmp/a.png".to_string();
        composer.attach(Attachment::from_path("/tmp/a.png"));

        let submission = composer.submit(false).unwrap();
        assert_eq!(submission.text, "hi");
        assert_eq!(submission.attachment.unwrap().name, "a.png");
        assert!(composer.text.is_empty());
        assert_eq!(composer.cursor, 0);
        assert!(composer.attachment.is_none());
        assert!(composer.picker_input.is_empty());
    }

    #[test]
    fn test_file_alone_is_submittable() {
        let mut composer = Composer::new();
        composer.attach(Attachment::from_path("/tmp/a.png"));
        assert!(composer.can_submit());
        assert!(composer.submit(false).is_some());
    }

    #[test]
    fn test_non_admin_pinned_to_query() {
        let mut composer = typed("x");
        composer.select_mode(Mode::Data);
        composer.select_operation(Operation::Delete);

        let submission = composer.submit(false).unwrap();
        assert_eq!(submission.mode, Mode::Query);
        assert_eq!(submission.operation, None);
    }

    #[test]
    fn test_admin_data_mode_carries_operation() {
        let mut composer = typed("x");
        composer.select_mode(Mode::Data);
        composer.select_operation(Operation::Similarity);
        let submission = composer.submit(true).unwrap();
        assert_eq!(submission.mode, Mode::Data);
        assert_eq!(submission.operation, Some(Operation::Similarity));

        let mut composer = typed("y");
        composer.select_mode(Mode::Input);
        let submission = composer.submit(true).unwrap();
        assert_eq!(submission.mode, Mode::Input);
        assert_eq!(submission.operation, None);
    }

    #[test]
    fn test_selected_query_applies_once() {
        let mut composer = typed("draft");
        composer.select_mode(Mode::Data);
        let mut slot = Some("what is rust".to_string());

        assert!(composer.apply_selected_query(&mut slot));
        assert_eq!(composer.text, "what is rust");
        assert_eq!(composer.mode, Mode::Query);
        assert_eq!(composer.cursor, 12);
        assert!(slot.is_none());

        composer.text.clear();
        assert!(!composer.apply_selected_query(&mut slot));
        assert!(composer.text.is_empty());
    }

    #[test]
    fn test_utf8_editing() {
        let mut composer = typed("héllo");
        composer.move_left();
        composer.move_left();
        composer.backspace();
        assert_eq!(composer.text, "hélo");
        composer.move_home();
        composer.delete();
        assert_eq!(composer.text, "élo");
    }

    #[test]
    fn test_multiline_navigation() {
        let mut composer = typed("first line\nab\nthird");
        assert_eq!(composer.line_count(), 3);
        assert_eq!(composer.cursor_row_col(), (2, 5));

        composer.move_up();
        assert_eq!(composer.cursor_row_col(), (1, 2));
        composer.move_up();
        assert_eq!(composer.cursor_row_col(), (0, 2));
        composer.move_end();
        assert_eq!(composer.cursor_row_col(), (0, 10));
        composer.move_down();
        assert_eq!(composer.cursor_row_col(), (1, 2));
        composer.move_home();
        assert_eq!(composer.cursor_row_col(), (1, 0));
    }

    #[test]
    fn test_input_grows_then_scrolls() {
        let mut composer = typed("1");
        assert_eq!(composer.visible_rows(), 1);

        for i in 2..=9 {
            composer.insert_newline();
            composer.insert_char(char::from_digit(i, 10).unwrap());
            composer.scroll_to_cursor();
        }
        assert_eq!(composer.line_count(), 9);
        assert_eq!(composer.visible_rows(), MAX_INPUT_ROWS);
        assert_eq!(composer.scroll, 3);

        composer.cursor = 0;
        composer.scroll_to_cursor();
        assert_eq!(composer.scroll, 0);
    }
}
