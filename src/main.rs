//! Command-line interface for the dictionary loader.
//!
//! `dict-loader <INPUT>` loads a JSON word list into the store. Subcommands
//! look words up, report row counts and delete the store.

use clap::{Parser, Subcommand};
use colored::*;
use dict_loader::{
    DEFAULT_DB_FILENAME, LoadOptions, Store,
    error::Result,
    progress::{ProgressCallback, ProgressUpdate},
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{LevelFilter, debug, error, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Load a JSON word list into a SQLite dictionary",
    long_about = None,
    after_help = "Subcommand names take precedence over INPUT. To load a file named like a \
                  subcommand, pass it as a path, e.g. `dict-loader ./stats`."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the input JSON document (prefix with `./` if it is named like a subcommand)
    input: Option<PathBuf>,

    /// Path to the database file
    #[arg(long, global = true, default_value = DEFAULT_DB_FILENAME)]
    db_path: PathBuf,

    /// Set verbosity level (use -v, -vv, or -vvv for increasing verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the stored definitions of a word
    Define {
        /// The word to define
        word: String,
    },
    /// Show how many words and definitions the database holds
    Stats,
    /// Delete the database file
    ClearDb,
}

/// Sets up logging based on verbosity level.
fn setup_logging(verbose: u8) {
    let log_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter(None, log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}

/// Creates a progress callback that drives `pb`.
fn create_progress_callback(pb: ProgressBar) -> ProgressCallback {
    Box::new(move |update: ProgressUpdate| {
        if update.current_item == 0 {
            pb.set_length(update.total_items.unwrap_or(0));
            pb.set_prefix(update.stage_description.clone());
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        pb.set_position(update.current_item);
        if let Some(msg) = &update.message {
            pb.set_message(msg.clone());
        }
        if update.is_finished() {
            pb.finish_and_clear();
        }
        true
    })
}

fn new_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    match ProgressStyle::default_bar().template(
        "{prefix:>12.cyan.bold} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} ({percent}%) {msg}",
    ) {
        Ok(style) => pb.set_style(style.progress_chars("##-")),
        Err(e) => debug!("Falling back to default progress style: {}", e),
    }
    pb
}

/// Main entry point for the CLI application.
fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        error!("Run failed: {}", e);
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = LoadOptions {
        output_path: cli.db_path,
    };

    match cli.command {
        Some(Commands::Define { word }) => handle_define(&options, &word),
        Some(Commands::Stats) => handle_stats(&options),
        Some(Commands::ClearDb) => {
            info!("Clearing database...");
            Store::clear_database(&options.output_path)?;
            println!("{}", "Database cleared successfully.".green());
            Ok(())
        }
        None => match cli.input {
            Some(input) => handle_ingest(&input, &options),
            None => {
                eprintln!("{}", "no input file provided".red());
                std::process::exit(1);
            }
        },
    }
}

/// Loads the input document into the store.
fn handle_ingest(input: &Path, options: &LoadOptions) -> Result<()> {
    info!("Loading {:?} into {:?}", input, options.output_path);
    let start = Instant::now();

    let pb = new_progress_bar();
    let callback = create_progress_callback(pb.clone());
    let result = dict_loader::ingest(input, options, Some(callback));
    pb.finish_and_clear();
    std::io::stdout().flush().ok();

    let summary = result?;
    info!(
        "Loaded {} words and {} definitions in {:?}",
        summary.words_inserted,
        summary.definitions_inserted,
        start.elapsed()
    );
    Ok(())
}

/// Handles the define command by looking up and displaying a word's definitions.
fn handle_define(options: &LoadOptions, word: &str) -> Result<()> {
    info!("Defining word: '{}'", word);
    let store = Store::open_existing(options)?;

    let Some((entry, definitions)) = store.lookup(word)? else {
        println!("No definitions found for '{}'.", word.yellow());
        return Ok(());
    };

    println!("\n{}", entry.word.bold().cyan());
    for (counter, definition) in definitions.iter().enumerate() {
        println!(
            "  {}: {}",
            (counter + 1).to_string().bold(),
            definition.definition_header.italic()
        );
        for line in definition.render_body().lines() {
            println!("     {}", line.trim());
        }
        let links = definition.links();
        if !links.is_empty() {
            println!("        {}: {}", "See also".magenta(), links.join(", ").green());
        }
    }
    println!();

    store.close()
}

fn handle_stats(options: &LoadOptions) -> Result<()> {
    let store = Store::open_existing(options)?;
    let counts = store.counts()?;
    println!("{}: {}", "Words".bold(), counts.words);
    println!("{}: {}", "Definitions".bold(), counts.definitions);
    store.close()
}
