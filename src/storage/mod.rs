use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use time::OffsetDateTime;

use crate::config::{ConfigPaths, StorageOptions};

mod schema;

/// A note as owned by the store. The presentation layer only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Unix epoch seconds.
    pub last_modified: i64,
    pub pinned: bool,
    /// Multi-select highlight in the grid; never persisted.
    pub selected: bool,
}

impl Note {
    pub fn new(id: i64, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            last_modified: 0,
            pinned: false,
            selected: false,
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            last_modified: row.get(3)?,
            pinned: row.get::<_, i64>(4)? != 0,
            selected: false,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("note #{0} does not exist")]
    NoteNotFound(i64),
}

#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

const NOTE_COLUMNS: &str = "id, title, content, last_modified, pinned";

impl StorageHandle {
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    pub fn fetch_notes(&self) -> Result<Vec<Note>> {
        self.with_connection(|conn| {
            let sql = format!(
                "SELECT {NOTE_COLUMNS}
                 FROM notes
                 ORDER BY pinned DESC, last_modified DESC, id DESC"
            );
            let mut stmt = conn.prepare(&sql).context("preparing note list query")?;
            let rows = stmt
                .query_map([], Note::from_row)
                .context("querying notes")?;
            let mut notes = Vec::new();
            for row in rows {
                notes.push(row.context("decoding note row")?);
            }
            Ok(notes)
        })
    }

    pub fn fetch_note_by_id(&self, note_id: i64) -> Result<Option<Note>> {
        self.with_connection(|conn| {
            let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1");
            conn.query_row(&sql, [note_id], Note::from_row)
                .optional()
                .with_context(|| format!("fetching note {note_id}"))
        })
    }

    pub fn create_note(&self, title: &str, content: &str, pinned: bool) -> Result<i64> {
        self.with_connection(|conn| {
            let now = OffsetDateTime::now_utc().unix_timestamp();
            conn.execute(
                "INSERT INTO notes (title, content, last_modified, pinned)
                 VALUES (?1, ?2, ?3, ?4)",
                params![title, content, now, pinned as i64],
            )
            .context("inserting note")?;
            let id = conn.last_insert_rowid();
            tracing::debug!(note_id = id, "created note");
            Ok(id)
        })
    }

    pub fn update_note(&self, note_id: i64, title: &str, content: &str) -> Result<()> {
        self.with_connection(|conn| {
            let now = OffsetDateTime::now_utc().unix_timestamp();
            let changed = conn
                .execute(
                    "UPDATE notes SET title = ?1, content = ?2, last_modified = ?3 WHERE id = ?4",
                    params![title, content, now, note_id],
                )
                .with_context(|| format!("updating note {note_id}"))?;
            if changed == 0 {
                return Err(StorageError::NoteNotFound(note_id).into());
            }
            Ok(())
        })
    }

    pub fn set_note_pinned(&self, note_id: i64, pinned: bool) -> Result<()> {
        self.with_connection(|conn| {
            let changed = conn
                .execute(
                    "UPDATE notes SET pinned = ?1 WHERE id = ?2",
                    params![pinned as i64, note_id],
                )
                .with_context(|| format!("updating pin for note {note_id}"))?;
            if changed == 0 {
                return Err(StorageError::NoteNotFound(note_id).into());
            }
            Ok(())
        })
    }

    /// Returns whether a row was removed.
    pub fn delete_note(&self, note_id: i64) -> Result<bool> {
        self.with_connection(|conn| {
            let removed = conn
                .execute("DELETE FROM notes WHERE id = ?1", [note_id])
                .with_context(|| format!("deleting note {note_id}"))?;
            Ok(removed > 0)
        })
    }
}

pub fn init(paths: &ConfigPaths, storage: &StorageOptions) -> Result<StorageHandle> {
    let db_path = if storage.database_path.as_os_str().is_empty() {
        &paths.database_path
    } else {
        &storage.database_path
    };
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, storage)?;
    schema::apply(&conn)?;
    if !existed && storage.seed_on_first_run {
        seed_initial_notes(&conn)?;
    }
    Ok(StorageHandle {
        db_path: Arc::new(db_path.clone()),
        options: Arc::new(storage.clone()),
    })
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )
    .context("setting wal_autocheckpoint")?;
    Ok(())
}

fn seed_initial_notes(conn: &Connection) -> Result<()> {
    let existing: Option<i64> = conn
        .query_row("SELECT id FROM notes LIMIT 1", [], |row| row.get(0))
        .optional()
        .context("checking for existing notes")?;
    if existing.is_some() {
        return Ok(());
    }

    tracing::info!("seeding first-run notes");
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let notes = [
        (
            "Welcome to notegrid",
            "Your notes live in this grid.\n\nPress Enter to open a note, `/` to search \
             and `a` to write a new one.\n",
            true,
        ),
        (
            "Keyboard shortcuts",
            "- arrows / hjkl: move around the grid\n- Enter: open note\n- m: note menu\n\
             - space: select for export\n- x: export selection\n- q: quit\n",
            false,
        ),
        ("Groceries", "Milk\nEggs\nCoffee\n", false),
    ];

    for (title, content, pinned) in notes {
        conn.execute(
            "INSERT INTO notes (title, content, last_modified, pinned)
             VALUES (?1, ?2, ?3, ?4)",
            params![title, content, now, pinned as i64],
        )
        .context("inserting seed note")?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{ConfigPaths, StorageOptions};
    use tempfile::TempDir;

    pub(crate) fn temp_paths(root: &TempDir) -> ConfigPaths {
        let base = root.path();
        let config_dir = base.join("config");
        let data_dir = base.join("data");
        let state_dir = base.join("state");
        ConfigPaths {
            config_dir: config_dir.clone(),
            config_file: config_dir.join("config.toml"),
            data_dir: data_dir.clone(),
            database_path: data_dir.join("notes.db"),
            export_dir: data_dir.join("exports"),
            log_dir: state_dir.join("logs"),
            state_dir,
        }
    }

    pub(crate) fn init_storage() -> anyhow::Result<(TempDir, StorageHandle)> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        paths.ensure_directories()?;
        let options = StorageOptions {
            seed_on_first_run: false,
            ..StorageOptions::default()
        };
        let storage = init(&paths, &options)?;
        Ok((temp, storage))
    }

    #[test]
    fn first_run_seeds_notes_when_enabled() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        paths.ensure_directories()?;
        let storage = init(&paths, &StorageOptions::default())?;
        let notes = storage.fetch_notes()?;
        assert_eq!(notes.len(), 3);
        assert!(notes[0].pinned, "pinned seed note sorts first");
        Ok(())
    }

    #[test]
    fn fetch_orders_pinned_then_recent() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let older = storage.create_note("Older", "a", false)?;
        let pinned = storage.create_note("Pinned", "b", true)?;
        let newer = storage.create_note("Newer", "c", false)?;
        storage.with_connection(|conn| {
            conn.execute(
                "UPDATE notes SET last_modified = 100 WHERE id = ?1",
                [older],
            )?;
            conn.execute(
                "UPDATE notes SET last_modified = 200 WHERE id = ?1",
                [newer],
            )?;
            Ok(())
        })?;

        let ids: Vec<i64> = storage.fetch_notes()?.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![pinned, newer, older]);
        Ok(())
    }

    #[test]
    fn update_missing_note_reports_not_found() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let err = storage.update_note(42, "t", "c").unwrap_err();
        assert_eq!(
            err.downcast_ref::<StorageError>(),
            Some(&StorageError::NoteNotFound(42))
        );
        Ok(())
    }

    #[test]
    fn delete_removes_note() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = storage.create_note("Gone", "soon", false)?;
        assert!(storage.delete_note(id)?);
        assert!(storage.fetch_note_by_id(id)?.is_none());
        assert!(!storage.delete_note(id)?);
        Ok(())
    }

    #[test]
    fn update_and_pin_round_trip_through_fetch() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let id = storage.create_note("Draft", "", false)?;
        storage.update_note(id, "Final", "body text")?;
        storage.set_note_pinned(id, true)?;
        let note = storage.fetch_note_by_id(id)?.expect("note exists");
        assert_eq!(note.title, "Final");
        assert_eq!(note.content, "body text");
        assert!(note.pinned);
        assert!(!note.selected);
        Ok(())
    }
}
