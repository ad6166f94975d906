//! Matchmaking queue and room lifecycle.
//!
//! [`SessionRegistry`] is the single owner of every room, the waiting
//! queue, and the identity bindings that map a connection to its room. Each
//! operation runs to completion and returns the messages it produced as
//! [`Dispatch`]es addressed to individual connections; delivering them is
//! the gateway's job.

use crate::error::SessionError;
use crate::identity::{ConnectionId, IdentityBinding, Profile, RoomId};
use crate::protocol::{GameStateView, Names, ServerMessage};
use crate::stats::{MemoryStats, Outcome, StatsRecorder};
use arena_tictactoe::{Game, GameState, GameStatus, LastMove, Mark, MoveError, best_move};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Name reported for the search opponent.
pub const COMPUTER_NAME: &str = "Computer";

/// A message addressed to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Recipient.
    pub to: ConnectionId,
    /// Payload.
    pub message: ServerMessage,
}

impl Dispatch {
    /// Addresses `message` to `to`.
    pub fn new(to: ConnectionId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

/// Who holds a mark in a room. Human marks and names live in the
/// connection's [`IdentityBinding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    /// A connected human.
    Human(ConnectionId),
    /// The search opponent.
    Computer(Mark),
}

/// How a seated connection went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Departure {
    Left,
    Disconnected,
}

type Bindings = HashMap<ConnectionId, IdentityBinding>;

/// One game instance and the participants bound to it.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    game: Game,
    participants: Vec<Participant>,
}

impl Room {
    /// Returns the room id.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Returns the current game state.
    pub fn state(&self) -> &GameState {
        self.game.state()
    }

    /// Returns every participant.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Connections seated in the room.
    pub fn humans(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.participants.iter().filter_map(|p| match p {
            Participant::Human(conn) => Some(*conn),
            Participant::Computer(_) => None,
        })
    }

    /// The computer's mark when playing single-player.
    pub fn computer_mark(&self) -> Option<Mark> {
        self.participants.iter().find_map(|p| match p {
            Participant::Computer(mark) => Some(*mark),
            Participant::Human(_) => None,
        })
    }

    /// Name of whoever holds `mark`.
    fn holder_name(&self, mark: Mark, bindings: &Bindings) -> Option<String> {
        if self.computer_mark() == Some(mark) {
            return Some(COMPUTER_NAME.to_string());
        }
        self.humans().find_map(|conn| {
            bindings
                .get(&conn)
                .filter(|binding| *binding.mark() == mark)
                .map(|binding| binding.label(conn))
        })
    }

    fn names(&self, bindings: &Bindings) -> Names {
        Names {
            x: self.holder_name(Mark::X, bindings),
            o: self.holder_name(Mark::O, bindings),
        }
    }

    fn broadcast(&self, message: &ServerMessage) -> Vec<Dispatch> {
        self.humans()
            .map(|conn| Dispatch::new(conn, message.clone()))
            .collect()
    }

    /// Broadcasts an accepted move, then either ends the game or lets the
    /// computer answer before returning.
    fn after_move(
        &mut self,
        last: LastMove,
        bindings: &Bindings,
        stats: &dyn StatsRecorder,
    ) -> Result<Vec<Dispatch>, SessionError> {
        let mut out = self.broadcast(&ServerMessage::GameUpdate {
            state: GameStateView::from(self.game.state()),
            last_move: last,
        });

        let status = self.game.state().status();
        if status.is_terminal() {
            out.extend(self.finish(status, bindings, stats));
            return Ok(out);
        }

        out.extend(self.computer_turn(bindings, stats)?);
        Ok(out)
    }

    /// Plays the computer's move if it holds the mark to move.
    fn computer_turn(
        &mut self,
        bindings: &Bindings,
        stats: &dyn StatsRecorder,
    ) -> Result<Vec<Dispatch>, SessionError> {
        let Some(mark) = self.computer_mark() else {
            return Ok(Vec::new());
        };
        if self.game.state().current_turn() != mark || self.game.state().status().is_terminal() {
            return Ok(Vec::new());
        }
        let index = best_move(self.game.state().board(), mark)?;
        let last = self.game.make_move(index)?;
        info!(room_id = %self.id, index, mark = %mark, "Computer moved");
        self.after_move(last, bindings, stats)
    }

    /// Announces a finished game and reports results for human-vs-human rooms.
    fn finish(
        &self,
        status: GameStatus,
        bindings: &Bindings,
        stats: &dyn StatsRecorder,
    ) -> Vec<Dispatch> {
        let winner = status.winner();
        let winning_identity = winner.and_then(|mark| self.holder_name(mark, bindings));
        let message = match winner {
            Some(mark) => format!("{} wins!", mark),
            None => "It's a draw!".to_string(),
        };
        info!(room_id = %self.id, ?status, "Game ended");

        if self.computer_mark().is_none() {
            self.report_results(status, bindings, stats);
        }

        self.broadcast(&ServerMessage::GameEnd {
            winner,
            winning_identity,
            is_draw: status == GameStatus::Draw,
            message,
        })
    }

    fn report_results(&self, status: GameStatus, bindings: &Bindings, stats: &dyn StatsRecorder) {
        for conn in self.humans() {
            let Some(binding) = bindings.get(&conn) else {
                continue;
            };
            let Some(user_id) = binding.user_id() else {
                continue;
            };
            let outcome = match status.winner() {
                None => Outcome::Draw,
                Some(mark) if mark == *binding.mark() => Outcome::Win,
                Some(_) => Outcome::Loss,
            };
            if let Err(e) = stats.record_result(user_id, outcome) {
                warn!(user_id = %user_id, error = %e, "Failed to record result");
            }
        }
    }
}

/// A connection waiting for an opponent.
#[derive(Debug, Clone)]
struct Waiting {
    conn: ConnectionId,
    profile: Option<Profile>,
}

/// Owns all rooms, the matchmaking queue and identity bindings.
pub struct SessionRegistry {
    rooms: HashMap<RoomId, Room>,
    queue: VecDeque<Waiting>,
    bindings: Bindings,
    stats: Arc<dyn StatsRecorder>,
    next_room: u64,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("rooms", &self.rooms.len())
            .field("queue", &self.queue.len())
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl SessionRegistry {
    /// Creates an empty registry reporting results to `stats`.
    #[instrument(skip(stats))]
    pub fn new(stats: Arc<dyn StatsRecorder>) -> Self {
        info!("Creating session registry");
        Self {
            rooms: HashMap::new(),
            queue: VecDeque::new(),
            bindings: HashMap::new(),
            stats,
            next_room: 1,
        }
    }

    /// Looks up a room.
    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    /// The binding for a seated connection.
    pub fn binding(&self, conn: ConnectionId) -> Option<&IdentityBinding> {
        self.bindings.get(&conn)
    }

    /// Whether `conn` is in the matchmaking queue.
    pub fn is_waiting(&self, conn: ConnectionId) -> bool {
        self.queue.iter().any(|w| w.conn == conn)
    }

    /// Number of queued connections.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Puts `conn` in the queue, or pairs it with the longest-waiting
    /// connection. The waiting side plays X.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyJoined`] if `conn` is queued or seated.
    #[instrument(skip(self, profile), fields(conn = %conn))]
    pub fn join_queue(
        &mut self,
        conn: ConnectionId,
        profile: Option<Profile>,
    ) -> Result<Vec<Dispatch>, SessionError> {
        self.ensure_idle(conn)?;

        match self.queue.pop_front() {
            Some(waiting) => {
                info!(opponent = %waiting.conn, "Pairing with waiting player");
                let seats = vec![
                    (waiting.conn, Mark::X, waiting.profile),
                    (conn, Mark::O, profile),
                ];
                self.open_room(seats, None)
            }
            None => {
                info!("Player added to waiting queue");
                self.queue.push_back(Waiting { conn, profile });
                Ok(vec![Dispatch::new(conn, ServerMessage::WaitingForOpponent)])
            }
        }
    }

    /// Starts a single-player room against the search opponent. The human
    /// plays `mark` (X when `None`); if the computer holds X it opens.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyJoined`] if `conn` is queued or seated.
    #[instrument(skip(self, profile), fields(conn = %conn))]
    pub fn play_computer(
        &mut self,
        conn: ConnectionId,
        profile: Option<Profile>,
        mark: Option<Mark>,
    ) -> Result<Vec<Dispatch>, SessionError> {
        self.ensure_idle(conn)?;
        let human_mark = mark.unwrap_or(Mark::X);
        self.open_room(vec![(conn, human_mark, profile)], Some(human_mark.opponent()))
    }

    /// Removes `conn` from the queue.
    #[instrument(skip(self), fields(conn = %conn))]
    pub fn leave_queue(&mut self, conn: ConnectionId) -> Vec<Dispatch> {
        if self.remove_waiting(conn) {
            vec![Dispatch::new(conn, ServerMessage::LeftQueue)]
        } else {
            Vec::new()
        }
    }

    /// Applies a move for `conn` in `room_id`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::RoomNotFound`] if the room does not exist.
    /// - [`SessionError::NotInSession`] if `conn` has no seat in it.
    /// - [`SessionError::InvalidMove`] if the game is over or the engine rejects.
    /// - [`SessionError::NotYourTurn`] if the other mark is to move.
    #[instrument(skip(self), fields(conn = %conn, room_id = %room_id))]
    pub fn make_move(
        &mut self,
        conn: ConnectionId,
        room_id: &RoomId,
        index: usize,
    ) -> Result<Vec<Dispatch>, SessionError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| SessionError::RoomNotFound(room_id.clone()))?;
        let mark = match self.bindings.get(&conn) {
            Some(binding) if binding.room_id() == room_id => *binding.mark(),
            _ => {
                warn!("Move from a connection not seated in this room");
                return Err(SessionError::NotInSession);
            }
        };

        let state = room.game.state();
        if state.status().is_terminal() {
            return Err(MoveError::GameOver.into());
        }
        if state.current_turn() != mark {
            warn!(expected = %state.current_turn(), mark = %mark, "Move out of turn");
            return Err(SessionError::NotYourTurn);
        }

        let last = room.game.make_move(index).map_err(|e| {
            warn!(error = %e, "Invalid move");
            SessionError::from(e)
        })?;
        debug!(index, mark = %mark, "Move accepted");
        room.after_move(last, &self.bindings, self.stats.as_ref())
    }

    /// Starts the sender's room over. Room and seats are kept.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotInSession`] if `conn` is not seated.
    #[instrument(skip(self), fields(conn = %conn))]
    pub fn reset(&mut self, conn: ConnectionId) -> Result<Vec<Dispatch>, SessionError> {
        let binding = self.bindings.get(&conn).ok_or(SessionError::NotInSession)?;
        let room_id = binding.room_id().clone();
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| SessionError::RoomNotFound(room_id.clone()))?;

        room.game.reset();
        info!(room_id = %room_id, "Game reset");
        let mut out = room.broadcast(&ServerMessage::GameReset {
            state: GameStateView::from(room.game.state()),
        });
        out.extend(room.computer_turn(&self.bindings, self.stats.as_ref())?);
        Ok(out)
    }

    /// Explicit leave: drops `conn` from the queue or tears down its room.
    #[instrument(skip(self), fields(conn = %conn))]
    pub fn leave(&mut self, conn: ConnectionId) -> Vec<Dispatch> {
        if self.is_waiting(conn) {
            return self.leave_queue(conn);
        }
        self.depart(conn, Departure::Left)
    }

    /// Connection loss: same teardown as [`leave`](Self::leave), nothing is
    /// sent to `conn` itself.
    #[instrument(skip(self), fields(conn = %conn))]
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<Dispatch> {
        if self.remove_waiting(conn) {
            return Vec::new();
        }
        self.depart(conn, Departure::Disconnected)
    }

    fn ensure_idle(&self, conn: ConnectionId) -> Result<(), SessionError> {
        if self.bindings.contains_key(&conn) || self.is_waiting(conn) {
            warn!(conn = %conn, "Join while already queued or seated");
            return Err(SessionError::AlreadyJoined);
        }
        Ok(())
    }

    fn remove_waiting(&mut self, conn: ConnectionId) -> bool {
        match self.queue.iter().position(|w| w.conn == conn) {
            Some(pos) => {
                self.queue.remove(pos);
                info!(conn = %conn, "Removed from waiting queue");
                true
            }
            None => false,
        }
    }

    /// Seats `seats` (connection, mark, profile) and the computer, if any,
    /// in a new room. Room and bindings are both stored before the computer
    /// opens.
    fn open_room(
        &mut self,
        seats: Vec<(ConnectionId, Mark, Option<Profile>)>,
        computer: Option<Mark>,
    ) -> Result<Vec<Dispatch>, SessionError> {
        let id = RoomId::new(format!("room-{}", self.next_room));
        self.next_room += 1;

        let mut participants: Vec<Participant> =
            seats.iter().map(|(conn, _, _)| Participant::Human(*conn)).collect();
        participants.extend(computer.map(Participant::Computer));
        let room = Room {
            id: id.clone(),
            game: Game::new(),
            participants,
        };

        for (conn, mark, profile) in &seats {
            self.bindings
                .insert(*conn, IdentityBinding::new(id.clone(), *mark, profile.as_ref()));
        }
        let names = room.names(&self.bindings);
        let current_turn = room.state().current_turn();
        let mut out: Vec<Dispatch> = seats
            .iter()
            .map(|(conn, mark, _)| {
                Dispatch::new(
                    *conn,
                    ServerMessage::GameStart {
                        room_id: id.clone(),
                        your_mark: *mark,
                        opponent_mark: mark.opponent(),
                        current_turn,
                        names: names.clone(),
                    },
                )
            })
            .collect();
        info!(room_id = %id, names = ?names, "Game started");

        let room = self.rooms.entry(id).or_insert(room);
        out.extend(room.computer_turn(&self.bindings, self.stats.as_ref())?);
        Ok(out)
    }

    fn depart(&mut self, conn: ConnectionId, departure: Departure) -> Vec<Dispatch> {
        let Some(binding) = self.bindings.remove(&conn) else {
            debug!(conn = %conn, "Departure from idle connection");
            return Vec::new();
        };
        let Some(room) = self.rooms.remove(binding.room_id()) else {
            return Vec::new();
        };

        let (notice, message) = match departure {
            Departure::Left => (ServerMessage::OpponentLeft, "Opponent left the game."),
            Departure::Disconnected => (
                ServerMessage::OpponentDisconnected,
                "Opponent disconnected. Game ended.",
            ),
        };

        let mut out = Vec::new();
        for other in room.humans().filter(|other| *other != conn) {
            self.bindings.remove(&other);
            out.push(Dispatch::new(other, notice.clone()));
            out.push(Dispatch::new(
                other,
                ServerMessage::GameEnd {
                    winner: None,
                    winning_identity: None,
                    is_draw: false,
                    message: message.to_string(),
                },
            ));
        }
        info!(room_id = %room.id, ?departure, "Room torn down");
        out
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStats::new()))
    }
}
