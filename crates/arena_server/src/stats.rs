//! Stats collaborator interface and an in-memory implementation.
//!
//! The registry reports one result per human participant of a finished
//! human-vs-human game that carries a persistent profile. Where results end
//! up is the collaborator's business.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

/// Result of a finished game from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    /// The player won.
    Win,
    /// The player lost.
    Loss,
    /// Nobody won.
    Draw,
}

/// Stats collaborator error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Stats error: {} at {}:{}", message, file, line)]
pub struct StatsError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StatsError {
    /// Creates a new stats error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Receives finished-game results.
pub trait StatsRecorder: Send + Sync {
    /// Records one player's result.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError`] if the result could not be stored.
    fn record_result(&self, user_id: &str, outcome: Outcome) -> Result<(), StatsError>;
}

/// Per-user counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    games_played: u32,
    wins: u32,
    losses: u32,
    draws: u32,
}

impl PlayerRecord {
    fn apply(&mut self, outcome: Outcome) {
        self.games_played += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
    }
}

/// Point-in-time copy of everything recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Individual results recorded (two per finished game).
    results_recorded: u64,
    /// Records keyed by user id.
    users: BTreeMap<String, PlayerRecord>,
}

/// Process-local stats store.
#[derive(Debug, Default)]
pub struct MemoryStats {
    inner: Mutex<StatsSnapshot>,
}

impl MemoryStats {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory stats store");
        Self::default()
    }

    /// Returns the record for one user.
    #[instrument(skip(self))]
    pub fn record(&self, user_id: &str) -> Option<PlayerRecord> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.users.get(user_id).copied())
    }

    /// Copies the whole store.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError`] if the store's lock is poisoned.
    #[instrument(skip(self))]
    pub fn snapshot(&self) -> Result<StatsSnapshot, StatsError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| StatsError::new(format!("Stats lock poisoned: {}", e)))?;
        Ok(inner.clone())
    }
}

impl StatsRecorder for MemoryStats {
    #[instrument(skip(self, outcome), fields(outcome = %outcome))]
    fn record_result(&self, user_id: &str, outcome: Outcome) -> Result<(), StatsError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| StatsError::new(format!("Stats lock poisoned: {}", e)))?;
        inner.results_recorded += 1;
        let record = inner.users.entry(user_id.to_string()).or_default();
        record.apply(outcome);
        debug!(games_played = record.games_played, "Result recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate_per_user() {
        let stats = MemoryStats::new();
        stats.record_result("u1", Outcome::Win).expect("recorded");
        stats.record_result("u1", Outcome::Draw).expect("recorded");
        stats.record_result("u2", Outcome::Loss).expect("recorded");

        let u1 = stats.record("u1").expect("u1 present");
        assert_eq!(*u1.games_played(), 2);
        assert_eq!(*u1.wins(), 1);
        assert_eq!(*u1.draws(), 1);
        assert_eq!(*stats.record("u2").expect("u2 present").losses(), 1);

        let snapshot = stats.snapshot().expect("snapshot");
        assert_eq!(*snapshot.results_recorded(), 3);
        assert_eq!(snapshot.users().len(), 2);
    }

    #[test]
    fn test_outcome_renders_lowercase() {
        assert_eq!(Outcome::Win.to_string(), "win");
        assert_eq!(Outcome::Loss.to_string(), "loss");
        assert_eq!(Outcome::Draw.to_string(), "draw");
    }
}
