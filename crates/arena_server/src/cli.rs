//! Command-line interface for arena_server.

use arena_tictactoe::Mark;
use clap::{Parser, Subcommand};

/// Arena - real-time tic-tac-toe matchmaking server
#[derive(Parser, Debug)]
#[command(name = "arena_server")]
#[command(about = "Real-time tic-tac-toe matchmaking server", long_about = None)]
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
        config: Option<std::path::PathBuf>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the computer's move for a position
    Solve {
        /// Board as 9 squares, e.g. "X.O/.X./..." ('.' or '-' empty)
        board: String,

        /// Side to move; inferred from the mark counts if omitted
        #[arg(short, long)]
        side: Option<Mark>,
    },
}
