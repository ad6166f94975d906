//! Win and draw detection.
//!
//! Pure functions over a [`Board`], separated from board storage so the
//! engine and the search share one definition of a finished game.

use super::types::{Board, GameStatus, Mark, Square};

/// The 8 winning lines: rows, columns, diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the mark holding three in a row, if any.
pub fn check_winner(board: &Board) -> Option<Mark> {
    let squares = board.squares();
    LINES.iter().find_map(|&[a, b, c]| match squares[a] {
        Square::Occupied(mark) if squares[b] == squares[a] && squares[c] == squares[a] => {
            Some(mark)
        }
        _ => None,
    })
}

/// Checks if every square is occupied.
pub fn is_full(board: &Board) -> bool {
    board.squares().iter().all(|s| *s != Square::Empty)
}

/// Evaluates the board: a completed line wins, otherwise a full board draws.
pub fn evaluate(board: &Board) -> GameStatus {
    if let Some(winner) = check_winner(board) {
        GameStatus::Won(winner)
    } else if is_full(board) {
        GameStatus::Draw
    } else {
        GameStatus::InProgress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn board(s: &str) -> Board {
        s.parse().expect("valid board")
    }

    #[test]
    fn test_empty_board_in_progress() {
        assert_eq!(evaluate(&Board::new()), GameStatus::InProgress);
        assert!(!is_full(&Board::new()));
    }

    #[test]
    fn test_every_line_wins() {
        for line in LINES {
            for mark in Mark::iter() {
                let mut b = Board::new();
                for i in line {
                    b.put(i, Square::Occupied(mark));
                }
                assert_eq!(evaluate(&b), GameStatus::Won(mark), "line {:?}", line);
            }
        }
    }

    #[test]
    fn test_two_in_a_row_is_not_a_win() {
        assert_eq!(check_winner(&board("XX./OO./...")), None);
    }

    #[test]
    fn test_full_board_without_line_draws() {
        // X O X / O X X / O X O
        let b = board("XOX/OXX/OXO");
        assert!(is_full(&b));
        assert_eq!(evaluate(&b), GameStatus::Draw);
    }

    #[test]
    fn test_full_board_with_line_is_won_not_drawn() {
        let b = board("XXX/OOX/XOO");
        assert_eq!(evaluate(&b), GameStatus::Won(Mark::X));
    }
}
