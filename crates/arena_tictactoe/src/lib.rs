//! Pure tic-tac-toe game logic.
//!
//! - **Engine**: board, turn and terminal status for one game, with move
//!   validation and win/draw detection.
//! - **Search**: exhaustive minimax that plays perfectly for either mark.
//!
//! Nothing here does I/O or knows about connections; the server crate owns
//! sessions and drives these types.
//!
//! # Example
//!
//! ```
//! use arena_tictactoe::{best_move, Game, GameStatus, Mark};
//!
//! let mut game = Game::new();
//! game.make_move(4).unwrap();
//! let reply = best_move(game.state().board(), Mark::O).unwrap();
//! game.make_move(reply).unwrap();
//! assert_eq!(game.state().status(), GameStatus::InProgress);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod engine;
mod rules;
mod search;
mod types;

pub use engine::{Game, GameState, MoveError, apply_move};
pub use rules::{LINES, check_winner, evaluate, is_full};
pub use search::{ScoredMove, SearchError, WIN, best_move, score_moves};
pub use types::{BOARD_SIZE, Board, BoardParseError, GameStatus, LastMove, Mark, Square};
