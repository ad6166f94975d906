//! Arena server - unified CLI

use anyhow::Result;
use arena_server::{Cli, Command, ServerConfig};
use arena_tictactoe::{Board, Mark, best_move, score_moves};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, host, port } => run_server(config, host, port).await,
        Command::Solve { board, side } => run_solve(&board, side),
    }
}

/// Run the WebSocket game server
async fn run_server(config: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = ServerConfig::load(config.as_deref())?.with_overrides(host, port);
    initialize_tracing(config.log_filter());

    info!(addr = %config.bind_addr(), "Starting arena server");
    arena_server::serve(&config).await
}

/// Print per-move scores and the best move for a position
#[instrument]
fn run_solve(board: &str, side: Option<Mark>) -> Result<()> {
    initialize_tracing("warn");

    let board: Board = board.parse()?;
    let side = side.unwrap_or(if board.occupied_count() % 2 == 0 {
        Mark::X
    } else {
        Mark::O
    });

    println!("{}\n", board.display());
    for scored in score_moves(&board, side) {
        println!("  {} -> {:+}", scored.index, scored.score);
    }
    let index = best_move(&board, side)?;
    println!("\nBest move for {}: {}", side, index);
    Ok(())
}

fn initialize_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
