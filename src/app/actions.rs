use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::app::view::NoteIntent;
use crate::export::Exporter;
use crate::storage::{Note, StorageHandle};

/// What applying an intent did, so the caller can update the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Deleted { note_id: i64, existed: bool },
    Exported { paths: Vec<PathBuf> },
    EditingStarted(Note),
}

/// Applies intents from the screens to storage and the exporter.
pub struct ActionDispatcher<'a> {
    storage: &'a StorageHandle,
    exporter: &'a Exporter,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(storage: &'a StorageHandle, exporter: &'a Exporter) -> Self {
        Self { storage, exporter }
    }

    pub fn dispatch(&self, intent: NoteIntent) -> Result<IntentOutcome> {
        match intent {
            NoteIntent::DeleteNote(note) => {
                let existed = self
                    .storage
                    .delete_note(note.id)
                    .with_context(|| format!("deleting note {}", note.id))?;
                if !existed {
                    tracing::warn!(note_id = note.id, "delete requested for missing note");
                }
                Ok(IntentOutcome::Deleted {
                    note_id: note.id,
                    existed,
                })
            }
            NoteIntent::ExportNote(note) => {
                let paths = self.export_notes(std::slice::from_ref(&note))?;
                Ok(IntentOutcome::Exported { paths })
            }
            NoteIntent::StartEditing(note) => Ok(IntentOutcome::EditingStarted(note)),
        }
    }

    pub fn export_notes(&self, notes: &[Note]) -> Result<Vec<PathBuf>> {
        self.exporter.export(notes).context("exporting notes")
    }

    pub fn toggle_pin(&self, note: &Note) -> Result<bool> {
        let pinned = !note.pinned;
        self.storage.set_note_pinned(note.id, pinned)?;
        Ok(pinned)
    }

    pub fn create_note(&self) -> Result<i64> {
        self.storage.create_note("", "", false)
    }

    /// Returns whether a row was removed.
    pub fn discard_note(&self, note_id: i64) -> Result<bool> {
        self.storage
            .delete_note(note_id)
            .with_context(|| format!("discarding note {note_id}"))
    }

    pub fn save_note(&self, note_id: i64, title: &str, content: &str) -> Result<()> {
        self.storage
            .update_note(note_id, title.trim(), content)
            .with_context(|| format!("saving note {note_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportFormat;
    use crate::storage::tests::init_storage;
    use assert_matches::assert_matches;

    #[test]
    fn delete_intent_removes_note_from_storage() -> anyhow::Result<()> {
        let (temp, storage) = init_storage()?;
        let exporter = Exporter::new(temp.path().join("exports"), ExportFormat::Markdown);
        let dispatcher = ActionDispatcher::new(&storage, &exporter);
        let id = storage.create_note("Doomed", "x", false)?;
        let note = storage.fetch_note_by_id(id)?.expect("note");

        let outcome = dispatcher.dispatch(NoteIntent::DeleteNote(note.clone()))?;
        assert_eq!(outcome, IntentOutcome::Deleted { note_id: id, existed: true });
        assert!(storage.fetch_note_by_id(id)?.is_none());

        let again = dispatcher.dispatch(NoteIntent::DeleteNote(note))?;
        assert_matches!(again, IntentOutcome::Deleted { existed: false, .. });
        Ok(())
    }

    #[test]
    fn export_intent_writes_one_file() -> anyhow::Result<()> {
        let (temp, storage) = init_storage()?;
        let exporter = Exporter::new(temp.path().join("exports"), ExportFormat::Markdown);
        let dispatcher = ActionDispatcher::new(&storage, &exporter);
        let outcome = dispatcher.dispatch(NoteIntent::ExportNote(Note::new(3, "Groceries", "milk")))?;
        assert_matches!(outcome, IntentOutcome::Exported { paths } if paths.len() == 1 && paths[0].exists());
        Ok(())
    }

    #[test]
    fn pin_toggle_and_save_go_through_storage() -> anyhow::Result<()> {
        let (temp, storage) = init_storage()?;
        let exporter = Exporter::new(temp.path(), ExportFormat::Json);
        let dispatcher = ActionDispatcher::new(&storage, &exporter);
        let id = dispatcher.create_note()?;
        dispatcher.save_note(id, "  Titled  ", "content")?;
        let note = storage.fetch_note_by_id(id)?.expect("note");
        assert_eq!(note.title, "Titled");
        assert!(dispatcher.toggle_pin(&note)?);
        assert!(storage.fetch_note_by_id(id)?.expect("note").pinned);
        Ok(())
    }
}
