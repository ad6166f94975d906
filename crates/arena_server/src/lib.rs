//! Arena server library - real-time tic-tac-toe matchmaking
//!
//! # Architecture
//!
//! - **Registry**: matchmaking queue, rooms and identity bindings; the
//!   authoritative owner of every game
//! - **Gateway**: single event loop that feeds connection events to the
//!   registry and routes the resulting messages to connections
//! - **Transport**: axum WebSocket endpoint speaking the JSON protocol
//! - **Stats**: collaborator interface for finished-game results
//!
//! # Example
//!
//! ```
//! use arena_server::{ConnectionId, ServerMessage, SessionRegistry};
//!
//! let mut registry = SessionRegistry::default();
//! let a = ConnectionId::new(1);
//! let b = ConnectionId::new(2);
//!
//! registry.join_queue(a, None).unwrap();
//! let started = registry.join_queue(b, None).unwrap();
//! assert!(started
//!     .iter()
//!     .all(|d| matches!(d.message, ServerMessage::GameStart { .. })));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod cli;
mod config;
mod error;
mod gateway;
mod identity;
mod protocol;
mod registry;
mod stats;
mod ws;

// Crate-level exports - Server
pub use app::{AppState, router, serve};

// Crate-level exports - CLI and configuration
pub use cli::{Cli, Command};
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Sessions
pub use error::SessionError;
pub use gateway::{Gateway, GatewayError, GatewayEvent, GatewayHandle};
pub use identity::{ConnectionId, IdentityBinding, Profile, RoomId};
pub use registry::{COMPUTER_NAME, Dispatch, Participant, Room, SessionRegistry};

// Crate-level exports - Protocol
pub use protocol::{ClientMessage, ComputerRequest, GameStateView, JoinRequest, Names, ServerMessage};

// Crate-level exports - Stats
pub use stats::{MemoryStats, Outcome, PlayerRecord, StatsError, StatsRecorder, StatsSnapshot};
