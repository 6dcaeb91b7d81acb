// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bookslice: splits paginated books into chapter folders of half-page bitmaps
// for small monochrome reading devices.
//
// Entry point. Parses the command line, initialises logging, and dispatches
// to the batch, chapter, segment, or interactive menu runs.

mod services;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bookslice_core::ProcessingConfig;
use bookslice_core::error::{BookSliceError, Result};
use bookslice_core::human_errors::{Scope, humanize_error};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use services::batch::default_output_root;
use services::menu::Menu;
use services::runner::{BookFolder, Runner};
use services::summary::{write_batch_summary, write_document_summary};

#[derive(Parser)]
#[command(name = "bookslice")]
#[command(version)]
#[command(about = "Split books into chapter folders of half-page bitmaps", long_about = None)]
struct Cli {
    /// JSON settings file (missing fields take defaults)
    #[arg(long, global = true, value_name = "FILE", env = "BOOKSLICE_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print reports as JSON instead of a text summary
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every PDF in a folder
    Process {
        /// Folder holding the books
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Process one chapter of one book
    Chapter {
        /// The book
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Chapter number as it appears in the chapter folder name
        #[arg(value_name = "NUMBER")]
        number: u32,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the chapter tree a book would be split into
    Segment {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Interactive menu over the books in a folder
    Menu {
        /// Folder holding the books (default: current directory)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Output root (default: <DIR>/processed_books)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Output root (default: processed_books next to the input)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Only the first few pages of each book
    #[arg(long)]
    test_mode: bool,

    /// Also write a plain-text file per page
    #[arg(long)]
    text: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut ProcessingConfig) {
        config.test_mode |= self.test_mode;
        config.output.write_text |= self.text;
    }

    fn output_root(&self, input_dir: &Path) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_root(input_dir))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    tracing::info!("Bookslice starting");

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("Error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            if human.scope == Scope::Request {
                eprintln!("  Nothing was written.");
            }
            tracing::debug!(error = %err, "Run aborted");
            ExitCode::FAILURE
        }
    }
}

/// Dispatch a subcommand. `Ok(false)` means the run finished but some books
/// or pages were skipped.
fn run(cli: Cli) -> Result<bool> {
    let mut config = match &cli.config {
        Some(path) => ProcessingConfig::load(path)?,
        None => ProcessingConfig::default(),
    };
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Process { dir, run: args } => {
            args.apply(&mut config);
            let runner = Runner::new(args.output_root(&dir))?;
            let report = runner.process_all(&dir, &config)?;
            if cli.json {
                print_json(&mut stdout, &report)?;
            } else {
                write_batch_summary(&mut stdout, &report)?;
            }
            Ok(report.is_clean())
        }
        Commands::Chapter { file, number, run: args } => {
            args.apply(&mut config);
            let runner = Runner::new(args.output_root(parent_dir(&file)))?;
            let report = runner.process_chapter(&file, number, &config)?;
            if cli.json {
                print_json(&mut stdout, &report)?;
            } else {
                write_document_summary(&mut stdout, &report)?;
                writeln!(stdout, "Output: {}", runner.output_root().display())?;
            }
            Ok(report.is_clean())
        }
        Commands::Segment { file } => {
            let runner = Runner::new(default_output_root(parent_dir(&file)))?;
            let tree = runner.segment(&file, &config)?;
            if cli.json {
                print_json(&mut stdout, &tree)?;
            } else {
                write!(stdout, "{tree}")?;
            }
            Ok(true)
        }
        Commands::Menu { dir, output } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            let runner = Runner::new(output.unwrap_or_else(|| default_output_root(&dir)))?;
            let actions = BookFolder {
                runner: &runner,
                dir: &dir,
            };
            let stdin = io::stdin().lock();
            let mut menu = Menu::new(stdin, &mut stdout, config);
            menu.run(&actions)?;
            tracing::debug!(test_mode = menu.config().test_mode, "Menu closed");
            Ok(true)
        }
    }
}

fn parent_dir(file: &Path) -> &Path {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn print_json(out: &mut impl Write, value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    writeln!(out, "{json}").map_err(BookSliceError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn process_flags_override_settings() {
        let cli = Cli::try_parse_from([
            "bookslice", "process", "books", "--test-mode", "--text", "-o", "out", "--verbose",
        ])
        .expect("parse");
        assert!(cli.verbose);
        let Commands::Process { dir, run } = cli.command else {
            panic!("expected process");
        };
        let mut config = ProcessingConfig::default();
        run.apply(&mut config);
        assert!(config.test_mode);
        assert!(config.output.write_text);
        assert_eq!(run.output_root(&dir), PathBuf::from("out"));
    }

    #[test]
    fn output_root_defaults_next_to_input() {
        let cli = Cli::try_parse_from(["bookslice", "chapter", "shelf/book.pdf", "12"])
            .expect("parse");
        let Commands::Chapter { file, number, run } = cli.command else {
            panic!("expected chapter");
        };
        assert_eq!(number, 12);
        assert_eq!(
            run.output_root(parent_dir(&file)),
            Path::new("shelf").join("processed_books")
        );
        assert_eq!(parent_dir(Path::new("book.pdf")), Path::new("."));
    }

    #[test]
    fn chapter_number_must_be_numeric() {
        assert!(Cli::try_parse_from(["bookslice", "chapter", "book.pdf", "seven"]).is_err());
    }
}
