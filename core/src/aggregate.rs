//! The `Match` aggregate root and its highlight records.

use crate::error::MatchError;
use crate::score::ScoreState;
use crate::types::{CourtId, HighlightId, MatchId, PlayerId, Roster, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a match.
///
/// The only transition is `Active → Finished`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Match is being played; commands are accepted.
    Active,
    /// Match has ended; terminal.
    Finished,
}

impl MatchStatus {
    /// Lowercase wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }

    /// Parses the lowercase wire name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A padel match: two teams of two, one court, one running score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Match identifier
    pub id: MatchId,
    /// Court the match is played on
    pub court_id: CourtId,
    /// When the match started
    pub started_at: DateTime<Utc>,
    /// When the match ended (set by `end`)
    pub ended_at: Option<DateTime<Utc>>,
    /// Lifecycle status
    pub status: MatchStatus,
    /// Players currently listed as team A
    pub team_a: Roster,
    /// Players currently listed as team B
    pub team_b: Roster,
    /// Current score
    pub score: ScoreState,
    /// Reference to the full match recording, if one was attached
    pub full_video_url: Option<String>,
    /// Sequence number of the last event recorded for this match
    pub version: u64,
}

impl Match {
    /// Creates a freshly started match at version 0 with a zeroed score.
    #[must_use]
    pub fn start(
        id: MatchId,
        court_id: CourtId,
        team_a: Roster,
        team_b: Roster,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            court_id,
            started_at,
            ended_at: None,
            status: MatchStatus::Active,
            team_a,
            team_b,
            score: ScoreState::new(),
            full_video_url: None,
            version: 0,
        }
    }

    /// Returns true while the match accepts commands
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == MatchStatus::Active
    }

    /// Fails with `InvalidState` unless the match is active.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidState`] for a finished match.
    pub fn ensure_active(&self) -> Result<(), MatchError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(MatchError::InvalidState {
                match_id: self.id,
                status: self.status,
            })
        }
    }

    /// The roster currently playing as `side`
    #[must_use]
    pub const fn roster(&self, side: Side) -> &Roster {
        match side {
            Side::A => &self.team_a,
            Side::B => &self.team_b,
        }
    }

    /// All four players, team A first
    #[must_use]
    pub fn players(&self) -> [PlayerId; 4] {
        let [a1, a2] = *self.team_a.players();
        let [b1, b2] = *self.team_b.players();
        [a1, a2, b1, b2]
    }
}

/// A moment in the match marked for highlight extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    /// Highlight identifier
    pub id: HighlightId,
    /// Match the highlight belongs to
    pub match_id: MatchId,
    /// Offset into the match recording, in seconds
    pub timestamp_sec: f64,
    /// Clip location once the media pipeline has produced one
    pub media_url: Option<String>,
    /// When the highlight was marked
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    fn sample_match() -> Match {
        let court = CourtId::new("court-1").unwrap();
        Match::start(
            MatchId::new(),
            court,
            Roster::new(PlayerId::new(), PlayerId::new()),
            Roster::new(PlayerId::new(), PlayerId::new()),
            Utc::now(),
        )
    }

    #[test]
    fn started_match_is_active_at_version_zero() {
        let m = sample_match();
        assert!(m.is_active());
        assert_eq!(m.version, 0);
        assert_eq!(m.score, ScoreState::new());
        assert!(m.ensure_active().is_ok());
    }

    #[test]
    fn finished_match_rejects_commands() {
        let mut m = sample_match();
        m.status = MatchStatus::Finished;
        assert!(matches!(
            m.ensure_active(),
            Err(MatchError::InvalidState {
                status: MatchStatus::Finished,
                ..
            })
        ));
    }

    #[test]
    fn players_lists_team_a_first() {
        let m = sample_match();
        let players = m.players();
        assert_eq!(&players[..2], m.team_a.players());
        assert_eq!(&players[2..], m.team_b.players());
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(MatchStatus::parse("active"), Some(MatchStatus::Active));
        assert_eq!(MatchStatus::parse("done"), None);
        assert_eq!(
            serde_json::to_value(MatchStatus::Finished).ok(),
            Some(serde_json::json!("finished"))
        );
    }
}
