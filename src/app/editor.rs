use unicode_segmentation::UnicodeSegmentation;

use crate::storage::Note;

const MAX_TITLE_LEN: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    Title,
    Content,
}

#[derive(Debug, Clone)]
pub struct EditorState {
    note_id: i64,
    title: String,
    content: String,
    field: EditorField,
    cursor: usize,
    dirty: bool,
}

impl EditorState {
    pub fn from_note(note: &Note) -> Self {
        Self {
            note_id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
            field: EditorField::Content,
            cursor: note.content.len(),
            dirty: false,
        }
    }

    pub fn note_id(&self) -> i64 {
        self.note_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn field(&self) -> EditorField {
        self.field
    }

    /// Byte offset inside the focused field.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            EditorField::Title => EditorField::Content,
            EditorField::Content => EditorField::Title,
        };
        self.cursor = self.buffer().len();
    }

    fn buffer(&self) -> &str {
        match self.field {
            EditorField::Title => &self.title,
            EditorField::Content => &self.content,
        }
    }

    fn buffer_mut(&mut self) -> &mut String {
        match self.field {
            EditorField::Title => &mut self.title,
            EditorField::Content => &mut self.content,
        }
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        if self.field == EditorField::Title && self.title.len() >= MAX_TITLE_LEN {
            return false;
        }
        let cursor = self.cursor;
        self.buffer_mut().insert(cursor, ch);
        self.cursor += ch.len_utf8();
        self.dirty = true;
        true
    }

    /// Titles stay on one line; Enter in the title moves to the content.
    pub fn insert_newline(&mut self) -> bool {
        if self.field == EditorField::Title {
            self.toggle_field();
            return false;
        }
        self.insert_char('\n')
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(self.buffer(), self.cursor);
        let cursor = self.cursor;
        self.buffer_mut().drain(prev..cursor);
        self.cursor = prev;
        self.dirty = true;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(self.buffer(), self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer().len() {
            return false;
        }
        self.cursor = next_grapheme_boundary(self.buffer(), self.cursor);
        true
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .grapheme_indices(true)
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|grapheme| cursor + grapheme.len())
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_marks_dirty_and_respects_graphemes() {
        let note = Note::new(1, "Title", "caf\u{65}\u{301}");
        let mut editor = EditorState::from_note(&note);
        assert!(!editor.is_dirty());
        assert!(editor.backspace());
        assert_eq!(editor.content(), "caf");
        assert!(editor.is_dirty());
    }

    #[test]
    fn tab_switches_field_and_moves_cursor_to_end() {
        let note = Note::new(1, "Plan", "body");
        let mut editor = EditorState::from_note(&note);
        editor.toggle_field();
        assert_eq!(editor.field(), EditorField::Title);
        editor.insert_char('s');
        assert_eq!(editor.title(), "Plans");
        assert!(!editor.insert_newline());
        assert_eq!(editor.field(), EditorField::Content);
        assert!(editor.insert_newline());
        assert_eq!(editor.content(), "body\n");
    }

    #[test]
    fn cursor_moves_stop_at_edges() {
        let note = Note::new(1, "", "ab");
        let mut editor = EditorState::from_note(&note);
        assert!(!editor.move_right());
        assert!(editor.move_left());
        assert!(editor.move_left());
        assert!(!editor.move_left());
        editor.insert_char('>');
        assert_eq!(editor.content(), ">ab");
    }
}
