//! Dialog copy. Everything takes a slice so the same wording serves the
//! single-note screen and multi-select in the grid.

use crate::config::ExportFormat;
use crate::storage::Note;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogText {
    pub title: String,
    pub body: String,
}

pub fn display_title(note: &Note) -> &str {
    let trimmed = note.title.trim();
    if trimmed.is_empty() {
        "Untitled"
    } else {
        trimmed
    }
}

fn subject(notes: &[Note]) -> String {
    match notes {
        [note] => format!("\"{}\"", display_title(note)),
        _ => format!("{} notes", notes.len()),
    }
}

pub fn export_dialog_title(notes: &[Note]) -> String {
    match notes.len() {
        1 => "Export note".to_string(),
        n => format!("Export {n} notes"),
    }
}

pub fn export_dialog_body(notes: &[Note], format: ExportFormat) -> String {
    let kind = match format {
        ExportFormat::Markdown => "Markdown",
        ExportFormat::Json => "JSON",
    };
    let files = if notes.len() == 1 { "file" } else { "files" };
    format!("Save {} as {kind} {files}?", subject(notes))
}

pub fn export_success_message(notes: &[Note]) -> String {
    format!("Exported {}", subject(notes))
}

pub fn export_dialog(notes: &[Note], format: ExportFormat) -> DialogText {
    DialogText {
        title: export_dialog_title(notes),
        body: export_dialog_body(notes, format),
    }
}

pub fn delete_dialog_title(notes: &[Note]) -> String {
    match notes.len() {
        1 => "Delete note".to_string(),
        n => format!("Delete {n} notes"),
    }
}

pub fn delete_dialog_body(notes: &[Note]) -> String {
    format!("{} will be deleted permanently.", subject(notes))
}

pub fn delete_dialog(notes: &[Note]) -> DialogText {
    DialogText {
        title: delete_dialog_title(notes),
        body: delete_dialog_body(notes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_note_export_text_names_that_note() {
        let notes = [Note::new(5, "Groceries", "milk")];
        insta::assert_snapshot!(export_dialog_title(&notes), @"Export note");
        insta::assert_snapshot!(
            export_dialog_body(&notes, ExportFormat::Markdown),
            @r###"Save "Groceries" as Markdown file?"###
        );
        insta::assert_snapshot!(export_success_message(&notes), @r###"Exported "Groceries""###);
    }

    #[test]
    fn multiple_notes_are_counted() {
        let notes = [Note::new(1, "A", ""), Note::new(2, "B", "")];
        assert_eq!(export_dialog_title(&notes), "Export 2 notes");
        assert_eq!(
            export_dialog_body(&notes, ExportFormat::Json),
            "Save 2 notes as JSON files?"
        );
        assert_eq!(export_success_message(&notes), "Exported 2 notes");
        assert_eq!(delete_dialog_title(&notes), "Delete 2 notes");
    }

    #[test]
    fn blank_titles_read_as_untitled() {
        let notes = [Note::new(1, "   ", "body")];
        assert_eq!(
            delete_dialog(&notes).body,
            "\"Untitled\" will be deleted permanently."
        );
    }
}
