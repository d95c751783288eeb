use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::search::{parse_query, SearchQuery};
use crate::storage::{Note, StorageHandle};

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub active: bool,
    pub input: String,
    pub query: SearchQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListDialog {
    ExportSelection,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

/// The note collection as last read from storage plus everything the grid
/// screen needs around it.
#[derive(Debug, Clone)]
pub struct AppState {
    notes: Vec<Note>,
    pub search: SearchState,
    cursor: usize,
    selection: BTreeSet<i64>,
    list_dialog: Option<ListDialog>,
    toast: Option<Toast>,
}

impl AppState {
    pub fn load(storage: &StorageHandle) -> Result<Self> {
        Ok(Self::from_notes(storage.fetch_notes()?))
    }

    pub fn from_notes(notes: Vec<Note>) -> Self {
        Self {
            notes,
            search: SearchState::default(),
            cursor: 0,
            selection: BTreeSet::new(),
            list_dialog: None,
            toast: None,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn refresh(&mut self, storage: &StorageHandle) -> Result<()> {
        let notes = storage.fetch_notes()?;
        self.replace_notes(notes);
        Ok(())
    }

    pub fn replace_notes(&mut self, notes: Vec<Note>) {
        let current = self.cursor_note().map(|note| note.id);
        self.notes = notes;
        let ids: BTreeSet<i64> = self.notes.iter().map(|note| note.id).collect();
        self.selection.retain(|id| ids.contains(id));
        self.apply_selection_flags();
        match current {
            Some(id) => self.focus_note(id),
            None => self.normalize_cursor(),
        }
    }

    /// Notes passing the current search, in grid order.
    pub fn visible_notes(&self) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|note| self.search.query.matches(note))
            .collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_note(&self) -> Option<&Note> {
        self.visible_notes().get(self.cursor).copied()
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.visible_notes().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = next as usize;
    }

    pub fn focus_note(&mut self, note_id: i64) {
        let position = self
            .visible_notes()
            .iter()
            .position(|note| note.id == note_id);
        if let Some(idx) = position {
            self.cursor = idx;
        } else {
            self.normalize_cursor();
        }
    }

    fn normalize_cursor(&mut self) {
        let len = self.visible_notes().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    pub fn begin_search(&mut self) {
        self.search.active = true;
    }

    pub fn is_search_active(&self) -> bool {
        self.search.active
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search.input.push(ch);
        self.reparse_search();
    }

    pub fn pop_search_char(&mut self) {
        if self.search.input.pop().is_some() {
            self.reparse_search();
        }
    }

    pub fn finish_search(&mut self) {
        self.search.active = false;
    }

    pub fn cancel_search(&mut self) {
        self.search = SearchState::default();
        self.normalize_cursor();
    }

    fn reparse_search(&mut self) {
        self.search.query = parse_query(&self.search.input);
        self.cursor = 0;
    }

    pub fn search_terms(&self) -> Vec<String> {
        self.search.query.highlight_terms()
    }

    /// Toggles the cursor note in the multi-select set. Returns the new state.
    pub fn toggle_selection(&mut self) -> Option<bool> {
        let id = self.cursor_note()?.id;
        let selected = if self.selection.remove(&id) {
            false
        } else {
            self.selection.insert(id);
            true
        };
        self.apply_selection_flags();
        Some(selected)
    }

    pub fn clear_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.selection.clear();
        self.apply_selection_flags();
        true
    }

    pub fn selection_len(&self) -> usize {
        self.selection.len()
    }

    pub fn selected_notes(&self) -> Vec<Note> {
        self.notes
            .iter()
            .filter(|note| note.selected)
            .cloned()
            .collect()
    }

    fn apply_selection_flags(&mut self) {
        for note in &mut self.notes {
            note.selected = self.selection.contains(&note.id);
        }
    }

    pub fn list_dialog(&self) -> Option<ListDialog> {
        self.list_dialog
    }

    pub fn open_export_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.list_dialog = Some(ListDialog::ExportSelection);
        true
    }

    pub fn close_list_dialog(&mut self) {
        self.list_dialog = None;
    }

    pub fn set_toast(&mut self, message: impl Into<String>, ttl: Duration, now: Instant) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: now + ttl,
        });
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    /// Drops an expired toast; returns whether one is still showing.
    pub fn expire_toast(&mut self, now: Instant) -> bool {
        if let Some(toast) = &self.toast {
            if now >= toast.expires_at {
                self.toast = None;
            }
        }
        self.toast.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::from_notes(vec![
            Note::new(1, "Groceries", "milk"),
            Note::new(2, "Plan", "coffee"),
            Note::new(3, "Coffee beans", "order"),
        ])
    }

    #[test]
    fn search_filters_and_resets_cursor() {
        let mut state = state();
        state.move_cursor(2);
        state.begin_search();
        for ch in "coffee".chars() {
            state.push_search_char(ch);
        }
        let ids: Vec<i64> = state.visible_notes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(state.cursor(), 0);

        state.cancel_search();
        assert_eq!(state.visible_notes().len(), 3);
        assert!(!state.is_search_active());
    }

    #[test]
    fn selection_marks_notes_and_survives_refresh() {
        let mut state = state();
        state.move_cursor(1);
        assert_eq!(state.toggle_selection(), Some(true));
        assert!(state.notes()[1].selected);
        assert!(state.open_export_selection());

        state.replace_notes(vec![Note::new(2, "Plan", "coffee"), Note::new(4, "New", "")]);
        assert_eq!(state.selection_len(), 1);
        assert_eq!(state.selected_notes()[0].id, 2);
        assert_eq!(state.cursor_note().map(|n| n.id), Some(2));

        assert!(state.clear_selection());
        assert!(state.selected_notes().is_empty());
    }

    #[test]
    fn export_selection_needs_a_selection() {
        let mut state = state();
        assert!(!state.open_export_selection());
        assert_eq!(state.list_dialog(), None);
    }

    #[test]
    fn refresh_clamps_cursor_when_notes_vanish() {
        let mut state = state();
        state.move_cursor(5);
        assert_eq!(state.cursor(), 2);
        state.replace_notes(vec![Note::new(1, "Groceries", "milk")]);
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn toast_expires() {
        let mut state = state();
        let now = Instant::now();
        state.set_toast("Saved", Duration::from_millis(10), now);
        assert!(state.expire_toast(now));
        assert!(!state.expire_toast(now + Duration::from_millis(10)));
        assert!(state.toast().is_none());
    }
}
