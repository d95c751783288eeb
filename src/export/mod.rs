use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::config::{ExportFormat, ExportOptions};
use crate::storage::Note;

static NON_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug pattern"));

#[derive(Debug, Clone)]
pub struct Exporter {
    directory: PathBuf,
    format: ExportFormat,
}

#[derive(Serialize)]
struct ExportedNote<'a> {
    id: i64,
    title: &'a str,
    content: &'a str,
    last_modified: String,
    pinned: bool,
}

impl Exporter {
    pub fn new(directory: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            directory: directory.into(),
            format,
        }
    }

    pub fn from_options(options: &ExportOptions) -> Self {
        Self::new(options.directory.clone(), options.format)
    }

    pub fn with_format(&self, format: ExportFormat) -> Self {
        Self::new(self.directory.clone(), format)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Writes one file per note and returns the written paths in order.
    pub fn export(&self, notes: &[Note]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.directory).with_context(|| {
            format!("creating export directory {}", self.directory.display())
        })?;
        let mut written = Vec::with_capacity(notes.len());
        for note in notes {
            let path = self.directory.join(file_name(note, self.format));
            let rendered = self.render(note)?;
            fs::write(&path, rendered)
                .with_context(|| format!("writing export {}", path.display()))?;
            tracing::info!(note_id = note.id, path = %path.display(), "exported note");
            written.push(path);
        }
        Ok(written)
    }

    fn render(&self, note: &Note) -> Result<String> {
        match self.format {
            ExportFormat::Markdown => Ok(render_markdown(note)),
            ExportFormat::Json => {
                let exported = ExportedNote {
                    id: note.id,
                    title: &note.title,
                    content: &note.content,
                    last_modified: OffsetDateTime::from_unix_timestamp(note.last_modified)
                        .ok()
                        .and_then(|dt| dt.format(&Rfc3339).ok())
                        .unwrap_or_else(|| note.last_modified.to_string()),
                    pinned: note.pinned,
                };
                serde_json::to_string_pretty(&exported).context("serializing note to json")
            }
        }
    }
}

fn render_markdown(note: &Note) -> String {
    let mut out = format!("# {}\n\n", note.title.trim());
    out.push_str(note.content.trim_end());
    out.push('\n');
    out
}

fn file_name(note: &Note, format: ExportFormat) -> String {
    let lowered = note.title.to_lowercase();
    let slug = NON_SLUG.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    let stem = if slug.is_empty() { "note" } else { slug };
    format!("{stem}-{}.{}", note.id, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn markdown_export_writes_title_heading() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let exporter = Exporter::new(temp.path().join("out"), ExportFormat::Markdown);
        let note = Note::new(4, "Groceries & Errands", "Milk\nEggs\n\n");
        let paths = exporter.export(std::slice::from_ref(&note))?;

        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("groceries-errands-4.md"));
        let written = fs::read_to_string(&paths[0])?;
        assert_eq!(written, "# Groceries & Errands\n\nMilk\nEggs\n");
        Ok(())
    }

    #[test]
    fn json_export_carries_rfc3339_timestamp() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let exporter = Exporter::new(temp.path(), ExportFormat::Json);
        let mut note = Note::new(9, "", "body");
        note.last_modified = 0;
        let paths = exporter.export(&[note])?;

        assert!(paths[0].ends_with("note-9.json"));
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&paths[0])?)?;
        assert_eq!(value["id"], 9);
        assert_eq!(value["last_modified"], "1970-01-01T00:00:00Z");
        Ok(())
    }
}
