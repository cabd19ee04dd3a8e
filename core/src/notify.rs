//! Outbound collaborators used when a match ends.
//!
//! Both traits are consumed by the runtime's notification dispatcher, which
//! runs them on a detached task. Their failures are logged there and never
//! reach the command that ended the match.

use crate::aggregate::Match;
use crate::score::ScoreState;
use crate::types::{MatchId, PlayerId, Side};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Failure of a notification collaborator.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Could not reach the receiving service.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The receiving service answered with a non-success status.
    #[error("Rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body, for the log line
        body: String,
    },

    /// Player lookup failed.
    #[error("Directory error: {0}")]
    Directory(String),
}

/// A chat that should hear about a finished match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(i64);

impl Recipient {
    /// Wraps a Telegram chat id
    #[must_use]
    pub const fn new(telegram_id: i64) -> Self {
        Self(telegram_id)
    }

    /// The Telegram chat id
    #[must_use]
    pub const fn telegram_id(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What players are told when their match ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// The finished match
    pub match_id: MatchId,
    /// Display name of the court
    pub court_name: String,
    /// Display name of the club
    pub club_name: String,
    /// Sets won by team A
    pub sets_a: u32,
    /// Sets won by team B
    pub sets_b: u32,
    /// Score at the end of the match
    pub final_score: ScoreState,
}

impl MatchSummary {
    /// Builds the summary of a finished match.
    #[must_use]
    pub fn of(finished: &Match, court_name: impl Into<String>, club_name: impl Into<String>) -> Self {
        Self {
            match_id: finished.id,
            court_name: court_name.into(),
            club_name: club_name.into(),
            sets_a: finished.score.sets(Side::A),
            sets_b: finished.score.sets(Side::B),
            final_score: finished.score.clone(),
        }
    }

    /// Chat message sent to the players.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "🎾 Матч завершён!\n\nСчёт: {} : {}\n📍 {}, {}\n\n[🎬 Хайлайты]  [📊 Аналитика 👑]",
            self.sets_a, self.sets_b, self.club_name, self.court_name
        )
    }
}

/// Delivers match-end notifications.
pub trait Notifier: Send + Sync {
    /// Tell `recipients` that a match ended.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery failed. Callers log it and move on.
    fn notify_match_end(
        &self,
        recipients: Vec<Recipient>,
        summary: MatchSummary,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>>;
}

/// Resolves players to the chats that should be notified.
pub trait PlayerDirectory: Send + Sync {
    /// Recipient for one player, if they have one.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Directory`] when the lookup itself failed.
    fn recipient(
        &self,
        player: PlayerId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Recipient>, NotifyError>> + Send + '_>>;
}
