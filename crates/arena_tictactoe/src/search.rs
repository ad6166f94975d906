//! Perfect-play opponent via exhaustive minimax.
//!
//! The tree is searched to full depth with no pruning, so every root move
//! gets an exact value. A 3x3 board has at most 9! move orders.
//!
//! Scores are from the optimizing side's point of view. A terminal position
//! reached `depth` plies below the root candidate scores `WIN - depth` when
//! the side wins, `depth - WIN` when it loses, and 0 for a draw, so quick
//! wins and slow losses are preferred.

use super::rules::evaluate;
use super::types::{Board, GameStatus, Mark, Square};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Raw score of a won position.
pub const WIN: i32 = 10;

/// Error returned when the search has nothing to choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SearchError {
    /// Every square is occupied.
    #[display("No legal move: the board is full")]
    NoLegalMove,
}

impl std::error::Error for SearchError {}

/// A root candidate and its minimax value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredMove {
    /// Board index (0-8).
    pub index: usize,
    /// Minimax value from the optimizing side's point of view.
    pub score: i32,
}

/// Scores every empty square for `side`, in ascending index order.
///
/// Returns an empty list for a full board.
#[instrument(skip(board), fields(occupied = board.occupied_count()))]
pub fn score_moves(board: &Board, side: Mark) -> Vec<ScoredMove> {
    let mut scratch = *board;
    let mut nodes = 0u64;
    let candidates: Vec<usize> = board.empty_squares().collect();
    let scored: Vec<ScoredMove> = candidates
        .into_iter()
        .map(|index| {
            scratch.put(index, Square::Occupied(side));
            let score = minimax(&mut scratch, side, 0, false, &mut nodes);
            scratch.put(index, Square::Empty);
            ScoredMove { index, score }
        })
        .collect();
    debug!(nodes, candidates = scored.len(), "Search complete");
    scored
}

/// Returns the optimal square for `side` to play.
///
/// Ties go to the lowest index, so the result is deterministic.
///
/// # Errors
///
/// Returns [`SearchError::NoLegalMove`] if the board is full.
#[instrument(skip(board))]
pub fn best_move(board: &Board, side: Mark) -> Result<usize, SearchError> {
    let mut best: Option<ScoredMove> = None;
    for candidate in score_moves(board, side) {
        match best {
            Some(incumbent) if candidate.score <= incumbent.score => {}
            _ => best = Some(candidate),
        }
    }
    let chosen = best.ok_or(SearchError::NoLegalMove)?;
    debug!(index = chosen.index, score = chosen.score, "Best move chosen");
    Ok(chosen.index)
}

/// Minimax value of `board` for `side`. `maximizing` is true when `side`
/// is to move. Every placement is undone before returning.
fn minimax(board: &mut Board, side: Mark, depth: i32, maximizing: bool, nodes: &mut u64) -> i32 {
    *nodes += 1;
    match evaluate(board) {
        GameStatus::Won(mark) if mark == side => return WIN - depth,
        GameStatus::Won(_) => return depth - WIN,
        GameStatus::Draw => return 0,
        GameStatus::InProgress => {}
    }

    let mover = if maximizing { side } else { side.opponent() };
    let mut best = if maximizing { i32::MIN } else { i32::MAX };
    for index in 0..board.squares().len() {
        if !board.is_empty(index) {
            continue;
        }
        board.put(index, Square::Occupied(mover));
        let score = minimax(board, side, depth + 1, !maximizing, nodes);
        board.put(index, Square::Empty);
        best = if maximizing {
            best.max(score)
        } else {
            best.min(score)
        };
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().expect("valid board")
    }

    #[test]
    fn test_full_board_has_no_move() {
        let full = board("XOX/OXX/OXO");
        assert_eq!(best_move(&full, Mark::X), Err(SearchError::NoLegalMove));
        assert!(score_moves(&full, Mark::O).is_empty());
    }

    #[test]
    fn test_takes_immediate_win() {
        // X X . / O O . / . . .  with X to play: 2 wins now.
        assert_eq!(best_move(&board("XX./OO./..."), Mark::X), Ok(2));
        // Same position with O to play: 5 wins now for O.
        assert_eq!(best_move(&board("XX./OO./..."), Mark::O), Ok(5));
    }

    #[test]
    fn test_blocks_immediate_loss() {
        // X threatens 0-1-2; O must take 2.
        assert_eq!(best_move(&board("XX./.O./..."), Mark::O), Ok(2));
    }

    #[test]
    fn test_prefers_faster_win() {
        let scores = score_moves(&board("XX./OO./..."), Mark::X);
        let win_now = scores.iter().find(|s| s.index == 2).expect("scored");
        assert_eq!(win_now.score, WIN);
        assert!(scores.iter().all(|s| s.score <= win_now.score));
    }

    #[test]
    fn test_forced_loss_scores_depth_below_win() {
        // X forks 0-1-2 and 0-3-6; whatever O plays, X wins on the next ply.
        let fork = board("XX./XO./..O");
        let scores = score_moves(&fork, Mark::O);
        assert_eq!(scores.len(), 4);
        assert!(scores.iter().all(|s| s.score == 1 - WIN));
        assert_eq!(best_move(&fork, Mark::O), Ok(2));
    }

    #[test]
    fn test_caller_board_untouched() {
        let original = board("X../.O./...");
        let copy = original;
        let _ = best_move(&original, Mark::X);
        assert_eq!(original, copy);
    }

    #[test]
    fn test_empty_board_ties_resolve_to_lowest_index() {
        // Every opening is a draw under perfect play, so the tie-break picks 0.
        assert_eq!(best_move(&Board::new(), Mark::X), Ok(0));
    }
}
