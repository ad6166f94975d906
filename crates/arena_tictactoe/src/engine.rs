//! Authoritative game state machine.

use super::rules::evaluate;
use super::types::{BOARD_SIZE, Board, GameStatus, LastMove, Mark, Square};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Error that can occur when applying a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// The index is outside 0-8.
    #[display("Position {} is out of bounds (must be 0-8)", _0)]
    OutOfBounds(usize),

    /// The square at the index is already occupied.
    #[display("Square {} is already occupied", _0)]
    Occupied(usize),

    /// The game is already won or drawn.
    #[display("Game is already over")]
    GameOver,
}

impl std::error::Error for MoveError {}

/// Places `mark` at `index`, returning the new board.
///
/// The input board is left untouched; the caller decides whether to keep
/// the result.
///
/// # Errors
///
/// Returns [`MoveError`] if the index is out of range, the square is
/// occupied, or the board is already terminal.
pub fn apply_move(board: &Board, index: usize, mark: Mark) -> Result<Board, MoveError> {
    if evaluate(board).is_terminal() {
        return Err(MoveError::GameOver);
    }
    if index >= BOARD_SIZE {
        return Err(MoveError::OutOfBounds(index));
    }
    if !board.is_empty(index) {
        return Err(MoveError::Occupied(index));
    }
    let mut next = *board;
    next.put(index, Square::Occupied(mark));
    Ok(next)
}

/// Complete state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    board: Board,
    current_turn: Mark,
    status: GameStatus,
    history: Vec<usize>,
}

impl GameState {
    /// A fresh game: empty board, X to move.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            current_turn: Mark::X,
            status: GameStatus::InProgress,
            history: Vec::new(),
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the mark to move next.
    pub fn current_turn(&self) -> Mark {
        self.current_turn
    }

    /// Returns the game status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Returns accepted move indices in order.
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    /// Plays `index` for the mark whose turn it is.
    ///
    /// The status is evaluated with the mover still recorded, then the
    /// turn flips. The receiver is not modified.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] when the move is rejected.
    pub fn play(&self, index: usize) -> Result<(GameState, LastMove), MoveError> {
        let mark = self.current_turn;
        let board = apply_move(&self.board, index, mark)?;
        let status = evaluate(&board);
        let mut history = self.history.clone();
        history.push(index);
        let next = GameState {
            board,
            current_turn: mark.opponent(),
            status,
            history,
        };
        Ok((next, LastMove { mark, index }))
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// Tic-tac-toe game engine owning one [`GameState`].
#[derive(Debug, Clone, Default)]
pub struct Game {
    state: GameState,
}

impl Game {
    /// Creates a new game.
    #[instrument]
    pub fn new() -> Self {
        Self {
            state: GameState::new(),
        }
    }

    /// Returns the current game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Makes a move for the current mark, replacing the state on success.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError`] and leaves the state unchanged on rejection.
    #[instrument(skip(self), fields(turn = %self.state.current_turn))]
    pub fn make_move(&mut self, index: usize) -> Result<LastMove, MoveError> {
        let (next, last) = self.state.play(index)?;
        debug!(status = ?next.status, moves = next.history.len(), "Move applied");
        self.state = next;
        Ok(last)
    }

    /// Discards the current state for a fresh one. X moves first.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.state = GameState::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_move_leaves_input_untouched() {
        let board = Board::new();
        let next = apply_move(&board, 4, Mark::X).expect("legal");
        assert_eq!(board, Board::new());
        assert_eq!(next.get(4), Some(Square::Occupied(Mark::X)));
    }

    #[test]
    fn test_apply_move_rejections() {
        let board: Board = "X../.../...".parse().expect("valid board");
        assert_eq!(apply_move(&board, 9, Mark::O), Err(MoveError::OutOfBounds(9)));
        assert_eq!(apply_move(&board, 0, Mark::O), Err(MoveError::Occupied(0)));

        let won: Board = "XXX/OO./...".parse().expect("valid board");
        assert_eq!(apply_move(&won, 8, Mark::O), Err(MoveError::GameOver));
    }

    #[test]
    fn test_turn_flips_after_win_and_mover_is_recorded() {
        let mut game = Game::new();
        for index in [0, 3, 1, 4] {
            game.make_move(index).expect("legal");
        }
        let last = game.make_move(2).expect("winning move");
        assert_eq!(last, LastMove { mark: Mark::X, index: 2 });
        assert_eq!(game.state().status(), GameStatus::Won(Mark::X));
        assert_eq!(game.state().current_turn(), Mark::O);
    }

    #[test]
    fn test_rejected_move_keeps_state() {
        let mut game = Game::new();
        game.make_move(4).expect("legal");
        let before = game.state().clone();
        assert_eq!(game.make_move(4), Err(MoveError::Occupied(4)));
        assert_eq!(game.state(), &before);
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let mut game = Game::new();
        game.make_move(0).expect("legal");
        game.make_move(1).expect("legal");
        game.reset();
        assert_eq!(game.state(), &GameState::new());
        assert_eq!(game.state().current_turn(), Mark::X);
    }
}
