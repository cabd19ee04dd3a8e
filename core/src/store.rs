//! Persistence boundary for matches and their event logs.
//!
//! The store keeps two independent collections keyed by match id: the
//! current `Match` row, and the ordered events of that match. Events refer
//! to their match by id only.
//!
//! # Atomicity
//!
//! A [`Commit`] is applied as one unit: the match row update, the appended
//! event, the optional event deletion (undo) and the optional highlight insert
//! either all become visible or none do.
//!
//! # Optimistic concurrency
//!
//! `Commit::expected_version` carries the match version the command was
//! decided against. If the stored version differs, the commit is rejected with
//! [`StoreError::ConcurrencyConflict`] and nothing is written.
//!
//! # Implementations
//!
//! - `PostgresMatchStore` (in `padelsense-postgres`): production
//! - `InMemoryMatchStore` (in `padelsense-testing`): fast, deterministic tests

use crate::aggregate::{Highlight, Match};
use crate::event::{EventError, MatchEvent};
use crate::types::{EventId, MatchId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// A match together with the most recent event in its log.
pub type LoadedMatch = (Match, Option<MatchEvent>);

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Expected version doesn't match the stored version.
    #[error("Concurrency conflict on match {match_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The match where the conflict occurred.
        match_id: MatchId,
        /// The version the writer expected.
        expected: u64,
        /// The version actually stored.
        actual: u64,
    },

    /// Commit targeted a match that does not exist.
    #[error("Match not found: {0}")]
    NotFound(MatchId),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<EventError> for StoreError {
    fn from(error: EventError) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Everything one command writes, applied atomically.
#[derive(Clone, Debug, PartialEq)]
pub struct Commit {
    /// The match as it must look after the command.
    pub state: Match,
    /// Version the command was decided against; `None` inserts a new match.
    pub expected_version: Option<u64>,
    /// The event recording the command.
    pub append: MatchEvent,
    /// An event removed by this command (undo).
    pub delete: Option<EventId>,
    /// A highlight created by this command.
    pub highlight: Option<Highlight>,
}

impl Commit {
    /// The match this commit writes to
    #[must_use]
    pub const fn match_id(&self) -> MatchId {
        self.state.id
    }

    /// Checks the commit is internally consistent before any write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` when the appended event does not belong
    /// to the committed match or its sequence disagrees with the new version.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.append.match_id != self.state.id {
            return Err(StoreError::Database(format!(
                "event {} belongs to match {}, not {}",
                self.append.id, self.append.match_id, self.state.id
            )));
        }
        if self.append.sequence != self.state.version {
            return Err(StoreError::Database(format!(
                "event sequence {} does not match version {}",
                self.append.sequence, self.state.version
            )));
        }
        Ok(())
    }
}

/// Store for matches, their event logs and highlights.
///
/// Uses explicit `Pin<Box<dyn Future>>` returns so the store can be held as
/// `Arc<dyn MatchStore>` by the controller.
pub trait MatchStore: Send + Sync {
    /// Load a match and the latest event of its log.
    ///
    /// Returns `Ok(None)` for an unknown match id.
    ///
    /// # Errors
    ///
    /// - `Database`: connection or query failed
    /// - `Serialization`: a stored row could not be decoded
    fn load(
        &self,
        match_id: MatchId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<LoadedMatch>, StoreError>> + Send + '_>>;

    /// Apply a commit atomically.
    ///
    /// # Errors
    ///
    /// - `ConcurrencyConflict`: stored version differs from `expected_version`
    ///   (or the match already exists on insert)
    /// - `NotFound`: update of a match that is not stored
    /// - `Database` / `Serialization`: write failed; nothing was applied
    fn commit(
        &self,
        commit: Commit,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// All events of a match, oldest first. Empty for unknown matches.
    ///
    /// # Errors
    ///
    /// - `Database` / `Serialization`: read failed
    fn events(
        &self,
        match_id: MatchId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MatchEvent>, StoreError>> + Send + '_>>;

    /// All highlights of a match, in creation order.
    ///
    /// # Errors
    ///
    /// - `Database`: read failed
    fn highlights(
        &self,
        match_id: MatchId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Highlight>, StoreError>> + Send + '_>>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::event::EventPayload;
    use crate::types::{CourtId, PlayerId, Roster};
    use chrono::Utc;

    fn commit(sequence: u64, version: u64) -> Commit {
        let mut state = Match::start(
            MatchId::new(),
            CourtId::new("court-1").unwrap(),
            Roster::new(PlayerId::new(), PlayerId::new()),
            Roster::new(PlayerId::new(), PlayerId::new()),
            Utc::now(),
        );
        state.version = version;
        Commit {
            append: MatchEvent {
                id: EventId::new(),
                match_id: state.id,
                sequence,
                created_at: Utc::now(),
                payload: EventPayload::SideChange,
            },
            state,
            expected_version: None,
            delete: None,
            highlight: None,
        }
    }

    #[test]
    fn consistent_commit_validates() {
        assert!(commit(1, 1).validate().is_ok());
    }

    #[test]
    fn sequence_must_equal_new_version() {
        assert!(matches!(
            commit(2, 1).validate(),
            Err(StoreError::Database(_))
        ));
    }

    #[test]
    fn event_must_belong_to_match() {
        let mut c = commit(1, 1);
        c.append.match_id = MatchId::new();
        assert!(c.validate().is_err());
    }

    #[test]
    fn concurrency_conflict_error_display() {
        let error = StoreError::ConcurrencyConflict {
            match_id: MatchId::new(),
            expected: 5,
            actual: 7,
        };

        let display = format!("{error}");
        assert!(display.contains("expected version 5"));
        assert!(display.contains("found 7"));
    }
}
