//! Session error types.

use crate::identity::RoomId;
use arena_tictactoe::{MoveError, SearchError};
use derive_more::{Display, From};

/// A rejected request. Reported to the offending connection only; the
/// room's state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Display, From)]
pub enum SessionError {
    /// The engine refused the move.
    #[display("Invalid move: {}", _0)]
    #[from]
    InvalidMove(MoveError),

    /// The sender's mark is not the one to move.
    #[display("Not your turn")]
    NotYourTurn,

    /// The room does not exist (never created or already torn down).
    #[display("Room {} not found", _0)]
    RoomNotFound(RoomId),

    /// The search was asked to move on a full board.
    #[display("No legal move available")]
    NoLegalMove,

    /// The sender is not seated in the room it addressed.
    #[display("You are not a player in this game")]
    NotInSession,

    /// The sender is already queued or seated.
    #[display("Already waiting or in a game")]
    AlreadyJoined,
}

impl std::error::Error for SessionError {}

impl From<SearchError> for SessionError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::NoLegalMove => SessionError::NoLegalMove,
        }
    }
}
