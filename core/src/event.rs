//! Match events: the append-only record of everything that happened.
//!
//! Each command that changes a match produces exactly one [`MatchEvent`].
//! Events are never edited. The one sanctioned removal is an undo deleting
//! the point it cancels.
//!
//! # Serialization
//!
//! Payloads are encoded with `bincode` for storage. Every payload variant
//! carries a versioned type name (`"Point.v1"`) that is stored alongside the
//! bytes so old rows stay decodable after a schema change.
//!
//! # Example
//!
//! ```
//! use padelsense_core::event::{Event, EventPayload};
//! use padelsense_core::score::ScoreState;
//! use padelsense_core::types::Side;
//!
//! let payload = EventPayload::Point {
//!     side: Side::A,
//!     score_before: ScoreState::new(),
//! };
//! assert_eq!(payload.event_type(), "Point.v1");
//!
//! let bytes = payload.to_bytes().unwrap();
//! assert_eq!(EventPayload::from_bytes(&bytes).unwrap(), payload);
//! ```

use crate::score::ScoreState;
use crate::types::{CourtId, EventId, HighlightId, MatchId, Roster, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),

    /// Unknown event type encountered during deserialization.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
}

/// An event that can be stored and read back.
///
/// The `event_type()` string must be stable and carry a version suffix,
/// e.g. `"Point.v1"`.
pub trait Event: Send + Sync + 'static {
    /// Returns the event type identifier for this event.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        bincode::serialize(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the bytes are corrupt or
    /// belong to an incompatible schema.
    fn from_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        bincode::deserialize(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

/// Discriminant of a match event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Match started
    Start,
    /// A point was scored
    Point,
    /// The previous point was cancelled
    Undo,
    /// A highlight was marked
    Highlight,
    /// Teams changed ends
    SideChange,
    /// Match ended
    End,
}

impl EventKind {
    /// Lowercase wire name (`"side_change"`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Point => "point",
            Self::Undo => "undo",
            Self::Highlight => "highlight",
            Self::SideChange => "side_change",
            Self::End => "end",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific content of a match event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    /// Match started with these rosters on this court.
    Start {
        /// Court
        court_id: CourtId,
        /// Team A at start
        team_a: Roster,
        /// Team B at start
        team_b: Roster,
    },

    /// `side` won a point. `score_before` is the score just before it.
    Point {
        /// Scoring side
        side: Side,
        /// Score before the point was applied
        score_before: ScoreState,
    },

    /// The point event `cancelled` (scored by `side`) was reversed.
    Undo {
        /// Id of the removed point event
        cancelled: EventId,
        /// Side that had scored the cancelled point
        side: Side,
    },

    /// A highlight was marked.
    Highlight {
        /// The stored highlight
        highlight_id: HighlightId,
        /// Offset into the recording, in seconds
        timestamp_sec: f64,
    },

    /// Team A and team B rosters were swapped.
    SideChange,

    /// The match ended with this score.
    End {
        /// Score at the end of the match
        final_score: ScoreState,
    },
}

impl EventPayload {
    /// The discriminant of this payload
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Start { .. } => EventKind::Start,
            Self::Point { .. } => EventKind::Point,
            Self::Undo { .. } => EventKind::Undo,
            Self::Highlight { .. } => EventKind::Highlight,
            Self::SideChange => EventKind::SideChange,
            Self::End { .. } => EventKind::End,
        }
    }
}

impl Event for EventPayload {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Start { .. } => "Start.v1",
            Self::Point { .. } => "Point.v1",
            Self::Undo { .. } => "Undo.v1",
            Self::Highlight { .. } => "Highlight.v1",
            Self::SideChange => "SideChange.v1",
            Self::End { .. } => "End.v1",
        }
    }
}

/// Checks a stored type name against the versions this build can decode.
///
/// # Errors
///
/// Returns `EventError::UnknownEventType` for unrecognised names.
pub fn check_event_type(event_type: &str) -> Result<EventKind, EventError> {
    match event_type {
        "Start.v1" => Ok(EventKind::Start),
        "Point.v1" => Ok(EventKind::Point),
        "Undo.v1" => Ok(EventKind::Undo),
        "Highlight.v1" => Ok(EventKind::Highlight),
        "SideChange.v1" => Ok(EventKind::SideChange),
        "End.v1" => Ok(EventKind::End),
        other => Err(EventError::UnknownEventType(other.to_string())),
    }
}

/// One entry in a match's event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    /// Event identifier
    pub id: EventId,
    /// Match this event belongs to
    pub match_id: MatchId,
    /// Position in the match's log; strictly increasing
    pub sequence: u64,
    /// When the event was recorded
    pub created_at: DateTime<Utc>,
    /// What happened
    pub payload: EventPayload,
}

impl MatchEvent {
    /// The discriminant of this event
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// For point events, the scoring side and pre-point score.
    #[must_use]
    pub const fn as_point(&self) -> Option<(Side, &ScoreState)> {
        match &self.payload {
            EventPayload::Point { side, score_before } => Some((*side, score_before)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerId;

    #[test]
    fn event_type_returns_versioned_identifier() {
        assert_eq!(EventPayload::SideChange.event_type(), "SideChange.v1");
        assert_eq!(
            EventPayload::End {
                final_score: ScoreState::new()
            }
            .event_type(),
            "End.v1"
        );
    }

    #[test]
    fn every_event_type_is_recognised() {
        let payloads = [
            EventPayload::SideChange,
            EventPayload::Undo {
                cancelled: EventId::new(),
                side: Side::B,
            },
            EventPayload::Highlight {
                highlight_id: HighlightId::new(),
                timestamp_sec: 12.5,
            },
        ];
        for payload in payloads {
            let kind = check_event_type(payload.event_type()).ok();
            assert_eq!(kind, Some(payload.kind()));
        }
        assert!(matches!(
            check_event_type("Point.v9"),
            Err(EventError::UnknownEventType(_))
        ));
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn start_payload_roundtrip() {
        let payload = EventPayload::Start {
            court_id: CourtId::new("court-2").expect("valid court"),
            team_a: Roster::new(PlayerId::new(), PlayerId::new()),
            team_b: Roster::new(PlayerId::new(), PlayerId::new()),
        };

        let bytes = payload.to_bytes().expect("serialization should succeed");
        let decoded = EventPayload::from_bytes(&bytes).expect("deserialization should succeed");

        assert_eq!(payload, decoded);
    }

    #[test]
    fn as_point_only_for_points() {
        let event = MatchEvent {
            id: EventId::new(),
            match_id: MatchId::new(),
            sequence: 2,
            created_at: Utc::now(),
            payload: EventPayload::Point {
                side: Side::B,
                score_before: ScoreState::new(),
            },
        };
        assert_eq!(event.kind(), EventKind::Point);
        assert_eq!(event.as_point().map(|(side, _)| side), Some(Side::B));

        let other = MatchEvent {
            payload: EventPayload::SideChange,
            ..event
        };
        assert!(other.as_point().is_none());
    }

    #[test]
    fn kind_wire_names() {
        assert_eq!(EventKind::SideChange.to_string(), "side_change");
        assert_eq!(EventKind::Undo.as_str(), "undo");
    }
}
