//! Waypost CLI - browse a place catalog with live walking times.
//!
//! The CLI is a thin presentation layer: it loads the catalog, feeds
//! position fixes into the engine, and renders whatever the engine's
//! public surface exposes (the visible list, cache entries, and the
//! status line).

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;

#[derive(Debug, Parser)]
#[command(
    name = "waypost",
    version,
    about = "Location-aware point-of-interest browser with live walking times"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the place list once, with walking times from a given origin
    List(commands::list::ListArgs),

    /// Follow a position stream and re-render the list as it updates
    Watch(commands::watch::WatchArgs),

    /// Write a default configuration file
    Init,

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    waypost::logging::init(cli.verbose);

    let result = match cli.command {
        Commands::List(args) => commands::list::run(cli.config.as_deref(), args).await,
        Commands::Watch(args) => commands::watch::run(cli.config.as_deref(), args).await,
        Commands::Init => commands::init::run(cli.config.as_deref()),
        Commands::Config => commands::config::run(cli.config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {}", style("error:").red().bold(), error);
            ExitCode::FAILURE
        }
    }
}
