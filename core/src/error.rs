//! Error taxonomy for match commands.
//!
//! Every variant is a typed outcome handed back to the caller. None of them
//! are used for control flow inside the core, and the scoring engine itself
//! never produces one.

use crate::aggregate::MatchStatus;
use crate::store::StoreError;
use crate::types::MatchId;
use thiserror::Error;

/// Errors returned by match commands.
#[derive(Error, Debug)]
pub enum MatchError {
    /// No match with this id exists.
    #[error("Match not found: {0}")]
    NotFound(MatchId),

    /// The command is not allowed in the match's current status.
    #[error("Match {match_id} is {status}; command not permitted")]
    InvalidState {
        /// The match the command targeted.
        match_id: MatchId,
        /// Its status at the time of the command.
        status: MatchStatus,
    },

    /// Malformed command input (side code, roster, timestamp).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Another writer committed to the same match first. Safe to retry.
    #[error("Concurrency conflict on match {match_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The contended match.
        match_id: MatchId,
        /// Version this command was decided against.
        expected: u64,
        /// Version found in the store.
        actual: u64,
    },

    /// The persistence collaborator failed.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl MatchError {
    /// Short, stable label for metrics and error codes.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::InvalidInput(_) => "invalid_input",
            Self::ConcurrencyConflict { .. } => "concurrency_conflict",
            Self::Store(_) => "store",
        }
    }

    /// Whether the caller may simply retry the same command.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

impl From<StoreError> for MatchError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::ConcurrencyConflict {
                match_id,
                expected,
                actual,
            } => Self::ConcurrencyConflict {
                match_id,
                expected,
                actual,
            },
            StoreError::NotFound(match_id) => Self::NotFound(match_id),
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_maps_to_retryable_conflict() {
        let match_id = MatchId::new();
        let error = MatchError::from(StoreError::ConcurrencyConflict {
            match_id,
            expected: 3,
            actual: 4,
        });

        assert!(error.is_retryable());
        assert_eq!(error.kind(), "concurrency_conflict");
        let display = format!("{error}");
        assert!(display.contains("expected version 3"));
        assert!(display.contains("found 4"));
    }

    #[test]
    fn database_failure_stays_a_store_error() {
        let error = MatchError::from(StoreError::Database("connection reset".to_string()));
        assert!(matches!(error, MatchError::Store(_)));
        assert!(!error.is_retryable());
    }

    #[test]
    fn invalid_state_names_status() {
        let error = MatchError::InvalidState {
            match_id: MatchId::new(),
            status: MatchStatus::Finished,
        };
        assert!(format!("{error}").contains("finished"));
    }
}
