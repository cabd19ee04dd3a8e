//! Match commands and the pure decision step behind them.
//!
//! `decide` takes the loaded match, its latest event and a command, and
//! returns what must be written, without touching any I/O. The runtime's
//! controller wraps it with locking, loading and committing.
//!
//! ```text
//!   command ──► decide(match, latest_event) ──► Decision::Commit(commit)
//!                                           └─► Decision::Unchanged(match)   (undo with nothing to undo)
//! ```

use crate::aggregate::{Highlight, Match, MatchStatus};
use crate::engine::apply_point;
use crate::error::MatchError;
use crate::event::{EventPayload, MatchEvent};
use crate::store::{Commit, LoadedMatch};
use crate::types::{CourtId, EventId, HighlightId, MatchId, Roster, Side, validate_rosters};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How `undo` rebuilds the score before the cancelled point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndoPolicy {
    /// Restore the pre-point score stored on the point event. Exact across
    /// game and set boundaries.
    #[default]
    Snapshot,
    /// Score a point for the opposite side on the current score. Not an
    /// inverse: undoing A's first point of a game leaves 15-15, and a point
    /// that closed a game or set is never restored.
    Reapply,
}

impl FromStr for UndoPolicy {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "snapshot" => Ok(Self::Snapshot),
            "reapply" => Ok(Self::Reapply),
            other => Err(MatchError::InvalidInput(format!(
                "unknown undo policy {other:?}, expected \"snapshot\" or \"reapply\""
            ))),
        }
    }
}

impl fmt::Display for UndoPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Snapshot => "snapshot",
            Self::Reapply => "reapply",
        })
    }
}

/// Request to start a new match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartMatch {
    /// Id for the new match
    pub match_id: MatchId,
    /// Team A (court positions 1 and 2)
    pub team_a: Roster,
    /// Team B (court positions 3 and 4)
    pub team_b: Roster,
    /// Court; the configured default is used when absent
    pub court_id: Option<CourtId>,
}

/// Commands against an existing match.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchCommand {
    /// `side` won a point
    AddPoint {
        /// Scoring side
        side: Side,
    },
    /// Cancel the most recent point
    Undo,
    /// Mark a highlight at an offset into the recording
    AddHighlight {
        /// Seconds since the recording started; finite and non-negative
        timestamp_sec: f64,
    },
    /// Teams change ends
    SideChange,
    /// Finish the match
    End,
}

impl MatchCommand {
    /// Stable name for logs and metrics
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddPoint { .. } => "add_point",
            Self::Undo => "undo",
            Self::AddHighlight { .. } => "add_highlight",
            Self::SideChange => "side_change",
            Self::End => "end",
        }
    }
}

/// Inputs to a decision that would otherwise make it impure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecisionContext {
    /// Time stamped on the event (and on `ended_at` / highlights)
    pub now: DateTime<Utc>,
    /// Undo reconstruction strategy
    pub undo_policy: UndoPolicy,
    /// Id given to the event this decision appends
    pub event_id: EventId,
    /// Id given to a highlight created by this decision
    pub highlight_id: HighlightId,
}

impl DecisionContext {
    /// Context with freshly generated ids.
    #[must_use]
    pub fn new(now: DateTime<Utc>, undo_policy: UndoPolicy) -> Self {
        Self {
            now,
            undo_policy,
            event_id: EventId::new(),
            highlight_id: HighlightId::new(),
        }
    }

    fn event(&self, state: &Match, payload: EventPayload) -> MatchEvent {
        MatchEvent {
            id: self.event_id,
            match_id: state.id,
            sequence: state.version,
            created_at: self.now,
            payload,
        }
    }
}

/// Outcome of deciding a command.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    /// Write this commit.
    Commit(Commit),
    /// Nothing to write; the match is returned as it was.
    Unchanged(Match),
}

impl Decision {
    /// The match as it will look once the decision is applied
    #[must_use]
    pub const fn state(&self) -> &Match {
        match self {
            Self::Commit(commit) => &commit.state,
            Self::Unchanged(state) => state,
        }
    }

    /// The event this decision appends, if any
    #[must_use]
    pub const fn appended(&self) -> Option<&MatchEvent> {
        match self {
            Self::Commit(commit) => Some(&commit.append),
            Self::Unchanged(_) => None,
        }
    }
}

/// Decides the start of a new match.
///
/// # Errors
///
/// Returns [`MatchError::InvalidInput`] if the four players are not distinct.
pub fn decide_start(
    start: StartMatch,
    default_court: &CourtId,
    ctx: &DecisionContext,
) -> Result<Commit, MatchError> {
    validate_rosters(&start.team_a, &start.team_b)?;

    let court_id = start.court_id.unwrap_or_else(|| default_court.clone());
    let mut state = Match::start(
        start.match_id,
        court_id.clone(),
        start.team_a,
        start.team_b,
        ctx.now,
    );
    state.version = 1;

    let append = ctx.event(
        &state,
        EventPayload::Start {
            court_id,
            team_a: start.team_a,
            team_b: start.team_b,
        },
    );

    Ok(Commit {
        state,
        expected_version: None,
        append,
        delete: None,
        highlight: None,
    })
}

/// Decides a command against a loaded match.
///
/// # Errors
///
/// - [`MatchError::InvalidState`] if the match is finished
/// - [`MatchError::InvalidInput`] for a negative or non-finite highlight offset
pub fn decide(
    loaded: &LoadedMatch,
    command: MatchCommand,
    ctx: &DecisionContext,
) -> Result<Decision, MatchError> {
    let (current, latest) = loaded;
    current.ensure_active()?;

    let mut next = current.clone();
    next.version = current.version + 1;
    let mut delete = None;
    let mut highlight = None;

    let payload = match command {
        MatchCommand::AddPoint { side } => {
            next.score = apply_point(&current.score, side);
            EventPayload::Point {
                side,
                score_before: current.score.clone(),
            }
        }

        MatchCommand::Undo => {
            let Some((point, (side, score_before))) = latest
                .as_ref()
                .and_then(|event| event.as_point().map(|point| (event, point)))
            else {
                return Ok(Decision::Unchanged(current.clone()));
            };

            next.score = match ctx.undo_policy {
                UndoPolicy::Snapshot => score_before.clone(),
                UndoPolicy::Reapply => apply_point(&current.score, side.opposite()),
            };
            delete = Some(point.id);
            EventPayload::Undo {
                cancelled: point.id,
                side,
            }
        }

        MatchCommand::AddHighlight { timestamp_sec } => {
            if !timestamp_sec.is_finite() || timestamp_sec < 0.0 {
                return Err(MatchError::InvalidInput(format!(
                    "highlight timestamp must be a non-negative number of seconds, got {timestamp_sec}"
                )));
            }
            highlight = Some(Highlight {
                id: ctx.highlight_id,
                match_id: current.id,
                timestamp_sec,
                media_url: None,
                created_at: ctx.now,
            });
            EventPayload::Highlight {
                highlight_id: ctx.highlight_id,
                timestamp_sec,
            }
        }

        MatchCommand::SideChange => {
            std::mem::swap(&mut next.team_a, &mut next.team_b);
            EventPayload::SideChange
        }

        MatchCommand::End => {
            next.status = MatchStatus::Finished;
            next.ended_at = Some(ctx.now);
            EventPayload::End {
                final_score: current.score.clone(),
            }
        }
    };

    let append = ctx.event(&next, payload);
    Ok(Decision::Commit(Commit {
        state: next,
        expected_version: Some(current.version),
        append,
        delete,
        highlight,
    }))
}
