use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::ConfigLoader;
use crate::storage;

pub mod commands;

use self::commands::{ExportArgs, ListArgs, NewArgs};

const LOG_FILE_NAME: &str = "notegrid.log";

#[derive(Parser, Debug)]
#[command(
    name = "notegrid",
    version,
    about = "Terminal notes laid out as an animated card grid"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over NOTEGRID_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over NOTEGRID_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive card grid (default)
    Tui,
    /// Create a new note from the command line
    New(NewArgs),
    /// Print notes, optionally filtered by a search query
    List(ListArgs),
    /// Export notes by id to Markdown or JSON files
    Export(ExportArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("NOTEGRID_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("NOTEGRID_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    let command = cli.command.unwrap_or(Commands::Tui);

    // The alternate screen owns stdout and stderr while the grid is up.
    let log_file = matches!(command, Commands::Tui).then(|| paths.log_dir.join(LOG_FILE_NAME));
    init_tracing(&cli.log_level, log_file.as_deref())
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let config = Arc::new(loader.load_or_init()?);
    let storage = storage::init(&paths, &config.storage)?;
    tracing::debug!(database = %storage.database_path().display(), "storage ready");

    match command {
        Commands::Tui => {
            let mut app = App::new(config, storage)?;
            commands::run_tui(&mut app)
        }
        Commands::New(args) => commands::new_note(&storage, args),
        Commands::List(args) => commands::list_notes(&storage, args),
        Commands::Export(args) => commands::export_notes(&config, &storage, args),
    }
}

fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| -> Result<()> {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match log_file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
            None => {
                fmt()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
        Ok(())
    })
    .map(|_| ())
}
