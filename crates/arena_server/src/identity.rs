//! Connection and room identities.

use arena_tictactoe::Mark;
use derive_getters::Getters;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Identity of one live connection, assigned by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize)]
#[display("conn-{}", _0)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Opaque room token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Persistent identity supplied by the login collaborator at join time.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, derive_new::new)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Stable user id used for stats reporting.
    user_id: String,
    /// Name shown to the opponent.
    display_name: String,
}

/// What a seated connection is bound to. One per connection in a room.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct IdentityBinding {
    room_id: RoomId,
    mark: Mark,
    display_name: Option<String>,
    user_id: Option<String>,
}

impl IdentityBinding {
    /// Binds a connection to a room and mark, copying the optional profile.
    pub fn new(room_id: RoomId, mark: Mark, profile: Option<&Profile>) -> Self {
        Self {
            room_id,
            mark,
            display_name: profile.map(|p| p.display_name().clone()),
            user_id: profile.map(|p| p.user_id().clone()),
        }
    }

    /// Name shown to others: the profile's display name, else `conn`.
    pub fn label(&self, conn: ConnectionId) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| conn.to_string())
    }
}
