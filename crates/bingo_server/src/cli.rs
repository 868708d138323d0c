//! Command-line interface for the bingo server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Party Bingo - authoritative multiplayer bingo server
#[derive(Parser, Debug)]
#[command(name = "bingo_server")]
#[command(about = "Multiplayer party bingo session server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the WebSocket game server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database path (overrides config)
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// List the playable groups of a prompt catalog
    Prompts {
        /// Path to the catalog JSON
        #[arg(long)]
        catalog: PathBuf,
    },
}
