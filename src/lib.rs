//! ebookdedupe - Content-hash dedupe for e-book libraries
//!
//! Keeps a durable SHA-256 index of every file under a root, removes
//! byte-identical copies (preferring to drop the one whose name carries a
//! copy marker such as `(1)` or `副本`), counts and searches the library, and
//! renames EPUBs to the title in their metadata.

pub mod actions;
pub mod cli;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod index;
pub mod logging;
pub mod output;
pub mod progress;
pub mod query;
pub mod rename;
pub mod scanner;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, DedupeArgs, OutputFormat};
use crate::config::Config;
use crate::dedupe::{DedupeEngine, EngineConfig};
use crate::error::ExitCode;
use crate::index::SqliteIndexStore;
use crate::logging::LogStream;
use crate::output::{write_dedupe_summary, write_rename_summary, JsonOutput};
use crate::progress::Progress;

/// Run the application with the parsed command line.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the index database
/// cannot be opened, or the report cannot be written. Per-file failures are
/// reported in the output and do not produce an error.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(
        cli.verbose,
        cli.quiet,
        cli.no_color,
        LogStream::for_output(cli.json_output()),
    );

    let config = Config::load(cli.config.as_deref())?.with_cli(&cli);
    log::debug!("Effective configuration: {:?}", config);

    match cli.command() {
        Commands::RemoveDuplicates(args) => run_remove_duplicates(&config, &args, cli.quiet)?,
        Commands::Count => {
            let count = query::count_files(&config.root, config.walker_config());
            println!("{count}");
        }
        Commands::Search(args) => {
            let engine = open_engine(&config, EngineConfig::default())?;
            let mut stdout = io::stdout().lock();
            for path in engine.search(&args.query) {
                writeln!(stdout, "{}", path.display())?;
            }
        }
        Commands::Rename(args) => {
            let engine_config = EngineConfig::default().with_walker_config(config.walker_config());
            let mut engine = open_engine(&config, engine_config)?
                .with_progress(Arc::new(Progress::new(cli.quiet)));
            let summary = engine.rename_books(&args.path, &config.renamer());
            write_rename_summary(&mut io::stdout().lock(), &summary)?;
        }
        Commands::StripSubstring(args) => {
            println!("{}", rename::strip_substring(&args.data, &args.pattern));
        }
    }

    Ok(ExitCode::Success)
}

fn run_remove_duplicates(config: &Config, args: &DedupeArgs, quiet: bool) -> Result<()> {
    let mut engine = open_engine(config, config.engine_config(args))?
        .with_progress(Arc::new(Progress::new(quiet)));

    let summary = engine.remove_duplicates(&config.root);

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Text => write_dedupe_summary(&mut stdout, &summary)?,
        OutputFormat::Json => JsonOutput::new(&summary, ExitCode::Success)
            .write_to(&mut stdout, true)
            .context("Failed to write JSON report")?,
    }
    Ok(())
}

fn open_engine(
    config: &Config,
    engine_config: EngineConfig,
) -> Result<DedupeEngine<SqliteIndexStore>> {
    let store = SqliteIndexStore::open(&config.database).with_context(|| {
        format!(
            "Failed to open index database {}",
            config.database.display()
        )
    })?;
    DedupeEngine::open(store, engine_config).context("Failed to load the index")
}
