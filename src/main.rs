//! Binary entry point for quotesync.
//!
//! This binary provides the CLI interface for the quote book.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use quotesync::cli::{self, CliContext};
use quotesync::config::QuoteSyncConfig;
use quotesync::observability::{self, LoggingConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// Quotesync - a local quote book with category filters and remote sync.
#[derive(Parser)]
#[command(name = "quotesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "QUOTESYNC_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Show a random quote from the current category.
    Show,

    /// Show the last quote viewed in this session.
    Last,

    /// Add a quote.
    Add {
        /// The quote text.
        text: String,

        /// The quote category.
        #[arg(short = 'g', long)]
        category: String,

        /// Do not post the quote to the remote.
        #[arg(long)]
        no_post: bool,
    },

    /// List quotes in the current category.
    List,

    /// List categories (the active one is marked with `*`).
    Categories,

    /// Set the category filter (`all` shows every quote).
    Filter {
        /// Category name, or `all`.
        name: String,
    },

    /// Export all quotes as JSON.
    Export {
        /// Output file (`-` for stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import quotes from a JSON file.
    Import {
        /// File containing a JSON array of quotes.
        file: PathBuf,
    },

    /// Run one sync cycle against the remote.
    Sync,

    /// Sync periodically until interrupted.
    Watch {
        /// Seconds between cycles (overrides config).
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Session management.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Show the effective configuration.
    Config,
}

/// Session subcommands.
#[derive(Subcommand)]
enum SessionAction {
    /// End the session, clearing the last viewed quote.
    End,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match QuoteSyncConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(&config.logging, cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(command: Commands, config: QuoteSyncConfig) -> quotesync::Result<()> {
    if matches!(command, Commands::Config) {
        return cli::cmd_config(&config);
    }

    let ctx = CliContext::open(config)?;
    match command {
        Commands::Show => cli::cmd_show(&ctx),
        Commands::Last => cli::cmd_last(&ctx),
        Commands::Add {
            text,
            category,
            no_post,
        } => cli::cmd_add(&ctx, &text, &category, no_post).await,
        Commands::List => cli::cmd_list(&ctx),
        Commands::Categories => cli::cmd_categories(&ctx),
        Commands::Filter { name } => cli::cmd_filter(&ctx, &name),
        Commands::Export { output } => cli::cmd_export(&ctx, output),
        Commands::Import { file } => cli::cmd_import(&ctx, &file),
        Commands::Sync => cli::cmd_sync(&ctx).await,
        Commands::Watch { interval } => cli::cmd_watch(&ctx, interval).await,
        Commands::Session {
            action: SessionAction::End,
        } => cli::cmd_session_end(&ctx),
        Commands::Config => cli::cmd_config(ctx.config()),
    }
}
