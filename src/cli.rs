//! Command-line interface for switcher.

use clap::{Parser, Subcommand};

/// Switcher - authoritative server for the tile-swap board game
#[derive(Parser, Debug)]
#[command(name = "switcher")]
#[command(about = "Game server for Switcher", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Path to a TOML config file (defaults apply if missing)
        #[arg(short, long, default_value = "switcher.toml")]
        config: std::path::PathBuf,

        /// Port to bind to, overriding the config file
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to, overriding the config file
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the legal swaps of a movement card
    Moves {
        /// Card type, `MOV_01`..`MOV_07` or `1`..`7`
        card: String,
    },
}
