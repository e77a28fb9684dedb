//! StreamHub CLI
//!
//! Command-line tools for inspecting StreamHub live feeds offline.
//!
//! # Commands
//!
//! - `replay` - Run a recorded session through the streaming engine
//! - `translate` - Translate one captured stream response
//! - `version` - Show version information

mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// StreamHub live feed tools.
#[derive(Parser)]
#[command(name = "streamhub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded session through the streaming engine
    Replay {
        /// Session file (JSON)
        session: PathBuf,

        /// Stop after this many entities
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Pending entities at which the feed stops requesting more
        #[arg(long, default_value = "16")]
        high_water: usize,

        /// Drop replies instead of delivering them
        #[arg(long)]
        no_replies: bool,

        /// Keep a visible list of this many entities and print it
        #[arg(long)]
        visible: Option<usize>,

        /// Insertions between two stash releases of the visible list
        #[arg(long, default_value = "5")]
        stash_interval: usize,
    },

    /// Translate one captured stream response
    Translate {
        /// Stream response file (JSON)
        response: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Drop replies instead of translating them
        #[arg(long)]
        no_replies: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            session,
            limit,
            format,
            high_water,
            no_replies,
            visible,
            stash_interval,
        } => {
            let options = commands::replay::ReplayOptions {
                limit,
                high_water_mark: high_water,
                include_replies: !no_replies,
                visible,
                stash_release_interval: stash_interval,
            };
            commands::replay::run(&session, &options, &format)?;
        }
        Commands::Translate {
            response,
            format,
            no_replies,
        } => {
            commands::translate::run(&response, !no_replies, &format)?;
        }
        Commands::Version => {
            println!("StreamHub CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
