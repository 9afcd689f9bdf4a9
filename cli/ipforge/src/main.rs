//! ipforge CLI: assemble IOb peripheral descriptors into validated models.

mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use commands::Session;
use config::OutputFormat;

#[derive(Parser)]
#[command(name = "ipforge", version, about = "Peripheral descriptor assembler")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble descriptors and emit the peripheral documents
    Assemble {
        /// Descriptor TOML files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output format (json, text)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Directory to write documents into (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the compiled register map
    Regmap {
        /// Descriptor TOML file
        file: PathBuf,
        /// Output format (json, text)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Print the software macro table
    Macros {
        /// Descriptor TOML file
        file: PathBuf,
        /// Write a C header instead of printing
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Inspect the component catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Assemble descriptors and report per-file status
    Check {
        /// Descriptor TOML files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List components and interface templates
    List,
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(log_level(cli.verbose, cli.quiet))
        .init()
        .context("installing logger")?;

    let cwd = std::env::current_dir()?;
    let session = Session::open(&cwd)?;

    match cli.command {
        Commands::Assemble { files, format, output } => {
            commands::assemble::run(&session, &files, format, output.as_deref())
        }
        Commands::Regmap { file, format } => commands::regmap::run(&session, &file, format),
        Commands::Macros { file, output } => commands::macros::run(&session, &file, output.as_deref()),
        Commands::Catalog { action } => match action {
            CatalogAction::List => commands::catalog::list(&session),
        },
        Commands::Check { files } => commands::check::run(&session, &files),
    }
}
