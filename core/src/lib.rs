//! # PadelSense Core
//!
//! Domain types and pure rules for scoring a padel match.
//!
//! This crate has no I/O. It defines what a match is, how a point changes
//! the score, what each command records, and the traits the runtime uses to
//! reach the outside world.
//!
//! ## Core Concepts
//!
//! - **`ScoreState`**: points, games and sets for both sides
//! - **Engine**: pure `(ScoreState, Side) → ScoreState`
//! - **`Match`**: the aggregate root; status, rosters, score, version
//! - **`MatchEvent`**: one immutable log entry per command
//! - **Decision**: pure `(Match, latest event, command) → Commit`
//! - **Collaborators**: `MatchStore`, `Notifier`, `PlayerDirectory`, `Clock`
//!
//! ## Example
//!
//! ```
//! use padelsense_core::engine::apply_point;
//! use padelsense_core::score::{PointValue, ScoreState};
//! use padelsense_core::types::Side;
//!
//! let score = apply_point(&ScoreState::new(), Side::A);
//! assert_eq!(score.points(Side::A), PointValue::Fifteen);
//! assert_eq!(score.points(Side::B), PointValue::Love);
//! ```

pub mod aggregate;
pub mod command;
pub mod engine;
pub mod environment;
pub mod error;
pub mod event;
pub mod notify;
pub mod score;
pub mod store;
pub mod types;

pub use aggregate::{Highlight, Match, MatchStatus};
pub use command::{Decision, DecisionContext, MatchCommand, StartMatch, UndoPolicy, decide, decide_start};
pub use engine::apply_point;
pub use error::MatchError;
pub use event::{Event, EventKind, EventPayload, MatchEvent};
pub use score::{PointValue, ScoreState};
pub use store::{Commit, LoadedMatch, MatchStore, StoreError};
pub use types::{CourtId, EventId, HighlightId, MatchId, PlayerId, Roster, Side};

// Re-export commonly used external types
pub use chrono::{DateTime, Utc};
