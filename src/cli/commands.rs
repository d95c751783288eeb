use std::fmt::Write as _;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;

use crate::app::format::format_card_date;
use crate::app::App;
use crate::config::{AppConfig, ExportFormat};
use crate::export::Exporter;
use crate::search::{filter_notes, parse_query};
use crate::storage::{Note, StorageHandle};

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the note (prompted if omitted)
    #[arg()]
    pub title: Option<String>,
    /// Provide the note content inline. If omitted, reads from stdin.
    #[arg(long)]
    pub content: Option<String>,
    /// Pin the new note
    #[arg(long)]
    pub pin: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Optional search terms (supports title: and is:pinned)
    #[arg()]
    pub query: Vec<String>,
    /// Limit the number of notes printed
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Identifiers of the notes to export
    #[arg(required_unless_present = "all")]
    pub ids: Vec<i64>,
    /// Export every note
    #[arg(long, conflicts_with = "ids")]
    pub all: bool,
    /// Output format (markdown or json); defaults to the configured one
    #[arg(long, value_parser = parse_format)]
    pub format: Option<ExportFormat>,
    /// Write into this directory instead of the configured export directory
    #[arg(long)]
    pub out: Option<PathBuf>,
}

fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    ExportFormat::from_str(&raw.to_ascii_lowercase())
        .map_err(|_| format!("unknown export format '{raw}' (expected markdown or json)"))
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn new_note(storage: &StorageHandle, args: NewArgs) -> Result<()> {
    let title = match args.title {
        Some(t) => t,
        None => prompt("Title")?,
    };
    let title = title.trim().to_owned();
    if title.is_empty() {
        bail!("note title cannot be empty");
    }
    let content = match args.content {
        Some(content) => content,
        None => read_stdin()?.unwrap_or_default(),
    };

    let note_id = storage
        .create_note(&title, &content, args.pin)
        .context("creating note")?;
    tracing::info!(note_id, pinned = args.pin, "note created from cli");
    println!(
        "Created note #{note_id}{}",
        if args.pin { " (pinned)" } else { "" }
    );
    Ok(())
}

pub fn list_notes(storage: &StorageHandle, args: ListArgs) -> Result<()> {
    let output = render_list(storage, &args)?;
    print!("{output}");
    Ok(())
}

fn render_list(storage: &StorageHandle, args: &ListArgs) -> Result<String> {
    let notes = storage.fetch_notes().context("loading notes")?;
    let query = parse_query(&args.query.join(" "));
    let matches = filter_notes(&notes, &query);

    let mut output = String::new();
    if matches.is_empty() {
        output.push_str("No notes found.\n");
        return Ok(output);
    }
    for note in matches.iter().take(args.limit) {
        let title = if note.title.trim().is_empty() {
            "Untitled"
        } else {
            note.title.as_str()
        };
        writeln!(
            output,
            "#{:<5} {:<7} {}{}",
            note.id,
            format_card_date(note.last_modified),
            title,
            if note.pinned { " [PINNED]" } else { "" }
        )?;
    }
    if matches.len() > args.limit {
        writeln!(output, "… {} more", matches.len() - args.limit)?;
    }
    Ok(output)
}

pub fn export_notes(config: &AppConfig, storage: &StorageHandle, args: ExportArgs) -> Result<()> {
    let mut exporter = Exporter::from_options(&config.export);
    if let Some(format) = args.format {
        exporter = exporter.with_format(format);
    }
    if let Some(dir) = &args.out {
        exporter = Exporter::new(dir.clone(), exporter.format());
    }
    let paths = run_export(&exporter, storage, &args)?;
    for path in &paths {
        println!("{}", path.display());
    }
    Ok(())
}

fn run_export(exporter: &Exporter, storage: &StorageHandle, args: &ExportArgs) -> Result<Vec<PathBuf>> {
    let notes: Vec<Note> = if args.all {
        storage.fetch_notes().context("loading notes")?
    } else {
        args.ids
            .iter()
            .map(|&id| {
                storage
                    .fetch_note_by_id(id)?
                    .ok_or_else(|| anyhow!("note #{id} not found"))
            })
            .collect::<Result<_>>()?
    };
    if notes.is_empty() {
        bail!("nothing to export");
    }
    exporter
        .export(&notes)
        .with_context(|| format!("exporting to {}", exporter.directory().display()))
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::init_storage;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    type TestResult<T = ()> = Result<T>;

    #[test]
    fn list_filters_by_query_and_marks_pinned() -> TestResult {
        let (_temp_dir, storage) = init_storage()?;
        storage.create_note("Project Plan", "Timeline overview", true)?;
        storage.create_note("Misc Note", "Just chatter", false)?;

        let args = ListArgs {
            query: vec!["timeline".into()],
            limit: 10,
        };
        let output = render_list(&storage, &args)?;

        assert!(output.contains("Project Plan"));
        assert!(output.contains("[PINNED]"));
        assert!(!output.contains("Misc Note"));
        Ok(())
    }

    #[test]
    fn list_respects_limit_and_reports_remainder() -> TestResult {
        let (_temp_dir, storage) = init_storage()?;
        for idx in 0..3 {
            storage.create_note(&format!("Note {idx}"), "", false)?;
        }
        let output = render_list(
            &storage,
            &ListArgs {
                query: Vec::new(),
                limit: 2,
            },
        )?;
        assert_eq!(output.lines().count(), 3);
        assert!(output.ends_with("… 1 more\n"));
        Ok(())
    }

    #[test]
    fn list_on_empty_store_says_so() -> TestResult {
        let (_temp_dir, storage) = init_storage()?;
        let output = render_list(
            &storage,
            &ListArgs {
                query: Vec::new(),
                limit: 5,
            },
        )?;
        assert_eq!(output, "No notes found.\n");
        Ok(())
    }

    #[test]
    fn export_writes_requested_notes() -> TestResult {
        let (_temp_dir, storage) = init_storage()?;
        let id = storage.create_note("Groceries", "milk", false)?;
        storage.create_note("Other", "", false)?;
        let out = TempDir::new()?;
        let exporter = Exporter::new(out.path(), ExportFormat::Json);

        let paths = run_export(
            &exporter,
            &storage,
            &ExportArgs {
                ids: vec![id],
                all: false,
                format: None,
                out: None,
            },
        )?;

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].extension().and_then(|ext| ext.to_str()), Some("json"));
        Ok(())
    }

    #[test]
    fn export_of_unknown_id_fails_without_writing() -> TestResult {
        let (_temp_dir, storage) = init_storage()?;
        let out = TempDir::new()?;
        let exporter = Exporter::new(out.path().join("exports"), ExportFormat::Markdown);

        let result = run_export(
            &exporter,
            &storage,
            &ExportArgs {
                ids: vec![404],
                all: false,
                format: None,
                out: None,
            },
        );

        assert_matches!(result, Err(err) if err.to_string().contains("#404"));
        assert!(!out.path().join("exports").exists());
        Ok(())
    }

    #[test]
    fn format_flag_is_case_insensitive() {
        assert_eq!(parse_format("JSON"), Ok(ExportFormat::Json));
        assert_eq!(parse_format("markdown"), Ok(ExportFormat::Markdown));
        assert!(parse_format("pdf").is_err());
    }
}
