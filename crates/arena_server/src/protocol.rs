//! JSON event protocol between clients and the gateway.
//!
//! Every frame is an object tagged by `event`, with the payload (if any)
//! under `data`:
//!
//! ```json
//! {"event": "makeMove", "data": {"roomId": "room-1", "index": 4}}
//! ```

use crate::identity::{Profile, RoomId};
use arena_tictactoe::{BOARD_SIZE, GameState, LastMove, Mark};
use serde::{Deserialize, Serialize};

/// Payload of `joinQueue`. The whole `data` object may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Optional persistent identity.
    #[serde(default)]
    pub profile: Option<Profile>,
}

/// Payload of `playComputer`. The whole `data` object may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputerRequest {
    /// Optional persistent identity.
    #[serde(default)]
    pub profile: Option<Profile>,
    /// Mark the human wants; X when absent.
    #[serde(default)]
    pub mark: Option<Mark>,
}

/// Events sent by clients.
///
/// Payload-carrying joins are newtype variants over `Option`, so a frame
/// without `data` parses as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Enter the matchmaking queue.
    JoinQueue(Option<JoinRequest>),
    /// Start a single-player game against the computer.
    PlayComputer(Option<ComputerRequest>),
    /// Place the sender's mark.
    MakeMove {
        /// Room the sender believes it is in.
        room_id: RoomId,
        /// Board index (0-8).
        index: usize,
    },
    /// Start the sender's room over with a fresh board.
    ResetGame,
    /// Leave the current room.
    LeaveGame,
    /// Stop waiting for an opponent.
    LeaveQueue,
}

/// Player names for both marks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Names {
    /// Name of the X player, if known.
    #[serde(rename = "X")]
    pub x: Option<String>,
    /// Name of the O player, if known.
    #[serde(rename = "O")]
    pub o: Option<String>,
}

/// Serializable snapshot of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateView {
    /// Squares in row-major order; `null` for empty.
    pub board: [Option<Mark>; BOARD_SIZE],
    /// Mark to move next.
    pub current_turn: Mark,
    /// Winning mark once the game is won.
    pub winner: Option<Mark>,
    /// True once the game is drawn.
    pub is_draw: bool,
    /// Accepted move indices in order.
    pub moves: Vec<usize>,
}

impl From<&GameState> for GameStateView {
    fn from(state: &GameState) -> Self {
        let squares = state.board().squares();
        Self {
            board: std::array::from_fn(|i| squares[i].mark()),
            current_turn: state.current_turn(),
            winner: state.status().winner(),
            is_draw: state.status() == arena_tictactoe::GameStatus::Draw,
            moves: state.history().to_vec(),
        }
    }
}

/// Events sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Queued; no opponent yet.
    WaitingForOpponent,
    /// Removed from the queue on request.
    LeftQueue,
    /// A room was created for the recipient.
    GameStart {
        /// The new room.
        room_id: RoomId,
        /// Recipient's mark.
        your_mark: Mark,
        /// Opponent's mark.
        opponent_mark: Mark,
        /// Mark to move first.
        current_turn: Mark,
        /// Names of both players.
        names: Names,
    },
    /// A move was accepted.
    GameUpdate {
        /// State after the move.
        state: GameStateView,
        /// The move just played.
        last_move: LastMove,
    },
    /// The game finished or was abandoned.
    GameEnd {
        /// Winning mark; `null` for a draw or abandonment.
        winner: Option<Mark>,
        /// Name or connection of the winner.
        winning_identity: Option<String>,
        /// True only for a drawn board.
        is_draw: bool,
        /// Human-readable summary.
        message: String,
    },
    /// The room's game was started over.
    GameReset {
        /// Fresh state.
        state: GameStateView,
    },
    /// The opponent's connection dropped.
    OpponentDisconnected,
    /// The opponent left the room.
    OpponentLeft,
    /// The recipient's last request was rejected.
    Error {
        /// Why.
        message: String,
    },
}

impl ServerMessage {
    /// Builds an error reply.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
