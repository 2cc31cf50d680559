//! Switcher - CLI entry point.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use switcher::{AppState, ServerConfig, router};
use switcher_core::{MoveCatalog, MovementType};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, port, host } => {
            let config = ServerConfig::load(Some(config.as_path()))?.with_overrides(host, port);
            run_server(config).await
        }
        Command::Moves { card } => print_moves(&card),
    }
}

/// Run the HTTP game server
async fn run_server(config: ServerConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();

    info!(?config, "Starting Switcher server");
    let app = router(AppState::in_memory(*config.notification_buffer()));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %config.bind_address(), "Server ready");
    axum::serve(listener, app).await?;
    info!("Server stopped");
    Ok(())
}

/// Print every legal swap of one movement card
#[instrument]
fn print_moves(card: &str) -> Result<()> {
    let kind = MovementType::parse(card)?;
    let mut moves: Vec<_> = MoveCatalog::global().legal_moves(kind).iter().collect();
    moves.sort();
    println!("{} ({} swaps)", kind, moves.len());
    for (from, to) in moves {
        println!("  {} <-> {}", from, to);
    }
    Ok(())
}
