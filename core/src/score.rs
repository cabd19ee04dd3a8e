//! Score values: point levels and the full per-match score.
//!
//! `ScoreState` has no public mutators. New scores come from
//! [`crate::engine::apply_point`] or from the validating
//! [`ScoreState::from_parts`] constructor, so a score that breaks the
//! advantage or game-sequence invariants cannot exist in the process.
//!
//! # Wire format
//!
//! In human-readable formats (JSON) the score keeps the shape used by the
//! tablet and bot clients:
//!
//! ```json
//! {"sets_a":0,"sets_b":0,"games_a":[3],"games_b":[2],"points_a":40,"points_b":"adv"}
//! ```
//!
//! Binary formats (bincode) encode point levels as a compact `u8` tag.

use crate::types::Side;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Errors raised when assembling a score from raw parts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// `games_a`/`games_b` must each hold at least the open set.
    #[error("game sequences must not be empty")]
    EmptyGames,

    /// `games_a` and `games_b` must cover the same sets.
    #[error("game sequences differ in length: {a} vs {b}")]
    GamesLengthMismatch {
        /// Length of `games_a`
        a: usize,
        /// Length of `games_b`
        b: usize,
    },

    /// Advantage requires the opponent at 40, and only one side may hold it.
    #[error("invalid advantage: {points_a} / {points_b}")]
    InvalidAdvantage {
        /// Team A's level
        points_a: PointValue,
        /// Team B's level
        points_b: PointValue,
    },

    /// Unknown point level on the wire.
    #[error("invalid point level: {0}")]
    InvalidPoint(String),
}

// ============================================================================
// PointValue
// ============================================================================

/// Point level within a game.
///
/// `Advantage` is its own variant, not "41": it only exists once both sides
/// have reached 40.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PointValue {
    /// 0
    #[default]
    Love,
    /// 15
    Fifteen,
    /// 30
    Thirty,
    /// 40
    Forty,
    /// Advantage after deuce
    Advantage,
}

impl PointValue {
    const fn tag(self) -> u8 {
        match self {
            Self::Love => 0,
            Self::Fifteen => 1,
            Self::Thirty => 2,
            Self::Forty => 3,
            Self::Advantage => 4,
        }
    }

    const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Love),
            1 => Some(Self::Fifteen),
            2 => Some(Self::Thirty),
            3 => Some(Self::Forty),
            4 => Some(Self::Advantage),
            _ => None,
        }
    }

    /// Numeric tennis value; `None` for `Advantage`.
    #[must_use]
    pub const fn as_number(self) -> Option<u8> {
        match self {
            Self::Love => Some(0),
            Self::Fifteen => Some(15),
            Self::Thirty => Some(30),
            Self::Forty => Some(40),
            Self::Advantage => None,
        }
    }

    /// Parses the numeric tennis value (0, 15, 30, 40).
    #[must_use]
    pub const fn from_number(n: u64) -> Option<Self> {
        match n {
            0 => Some(Self::Love),
            15 => Some(Self::Fifteen),
            30 => Some(Self::Thirty),
            40 => Some(Self::Forty),
            _ => None,
        }
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_number() {
            Some(n) => write!(f, "{n}"),
            None => f.write_str("adv"),
        }
    }
}

impl Serialize for PointValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !serializer.is_human_readable() {
            return serializer.serialize_u8(self.tag());
        }
        match self.as_number() {
            Some(n) => serializer.serialize_u8(n),
            None => serializer.serialize_str("adv"),
        }
    }
}

struct PointVisitor {
    human_readable: bool,
}

impl Visitor<'_> for PointVisitor {
    type Value = PointValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("one of 0, 15, 30, 40 or \"adv\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<PointValue, E> {
        let parsed = if self.human_readable {
            PointValue::from_number(v)
        } else {
            u8::try_from(v).ok().and_then(PointValue::from_tag)
        };
        parsed.ok_or_else(|| E::custom(ScoreError::InvalidPoint(v.to_string())))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<PointValue, E> {
        u64::try_from(v)
            .map_err(|_| E::custom(ScoreError::InvalidPoint(v.to_string())))
            .and_then(|v| self.visit_u64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<PointValue, E> {
        match v {
            "adv" | "AD" => Ok(PointValue::Advantage),
            other => other
                .parse::<u64>()
                .ok()
                .and_then(PointValue::from_number)
                .ok_or_else(|| E::custom(ScoreError::InvalidPoint(other.to_string()))),
        }
    }
}

impl<'de> Deserialize<'de> for PointValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_any(PointVisitor {
                human_readable: true,
            })
        } else {
            deserializer.deserialize_u8(PointVisitor {
                human_readable: false,
            })
        }
    }
}

// ============================================================================
// ScoreState
// ============================================================================

/// Raw score fields, used for (de)serialization and validated construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreParts {
    /// Sets won by team A
    pub sets_a: u32,
    /// Sets won by team B
    pub sets_b: u32,
    /// Games per set for team A; last entry is the open set
    pub games_a: Vec<u32>,
    /// Games per set for team B; last entry is the open set
    pub games_b: Vec<u32>,
    /// Current point level of team A
    pub points_a: PointValue,
    /// Current point level of team B
    pub points_b: PointValue,
}

/// Complete score of a match at one instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScoreParts", into = "ScoreParts")]
pub struct ScoreState {
    pub(crate) sets_a: u32,
    pub(crate) sets_b: u32,
    pub(crate) games_a: Vec<u32>,
    pub(crate) games_b: Vec<u32>,
    pub(crate) points_a: PointValue,
    pub(crate) points_b: PointValue,
}

impl ScoreState {
    /// The score at match start: no sets, one open set at 0-0, points 0-0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sets_a: 0,
            sets_b: 0,
            games_a: vec![0],
            games_b: vec![0],
            points_a: PointValue::Love,
            points_b: PointValue::Love,
        }
    }

    /// Builds a score from raw parts, checking every invariant.
    ///
    /// # Errors
    ///
    /// Returns a [`ScoreError`] if the game sequences are empty or of unequal
    /// length, or if Advantage is held without the opponent at 40.
    pub fn from_parts(parts: ScoreParts) -> Result<Self, ScoreError> {
        if parts.games_a.is_empty() || parts.games_b.is_empty() {
            return Err(ScoreError::EmptyGames);
        }
        if parts.games_a.len() != parts.games_b.len() {
            return Err(ScoreError::GamesLengthMismatch {
                a: parts.games_a.len(),
                b: parts.games_b.len(),
            });
        }
        let advantage_ok = match (parts.points_a, parts.points_b) {
            (PointValue::Advantage, other) | (other, PointValue::Advantage) => {
                other == PointValue::Forty
            }
            _ => true,
        };
        if !advantage_ok {
            return Err(ScoreError::InvalidAdvantage {
                points_a: parts.points_a,
                points_b: parts.points_b,
            });
        }

        Ok(Self {
            sets_a: parts.sets_a,
            sets_b: parts.sets_b,
            games_a: parts.games_a,
            games_b: parts.games_b,
            points_a: parts.points_a,
            points_b: parts.points_b,
        })
    }

    /// Sets won by `side`
    #[must_use]
    pub const fn sets(&self, side: Side) -> u32 {
        match side {
            Side::A => self.sets_a,
            Side::B => self.sets_b,
        }
    }

    /// Per-set game counts for `side`
    #[must_use]
    pub fn games(&self, side: Side) -> &[u32] {
        match side {
            Side::A => &self.games_a,
            Side::B => &self.games_b,
        }
    }

    /// Games won by `side` in the open set
    #[must_use]
    pub fn current_games(&self, side: Side) -> u32 {
        self.games(side).last().copied().unwrap_or(0)
    }

    /// Point level of `side` in the current game
    #[must_use]
    pub const fn points(&self, side: Side) -> PointValue {
        match side {
            Side::A => self.points_a,
            Side::B => self.points_b,
        }
    }

    /// Both sides at 40
    #[must_use]
    pub fn is_deuce(&self) -> bool {
        self.points_a == PointValue::Forty && self.points_b == PointValue::Forty
    }

    /// The side holding Advantage, if any
    #[must_use]
    pub fn advantage(&self) -> Option<Side> {
        match (self.points_a, self.points_b) {
            (PointValue::Advantage, _) => Some(Side::A),
            (_, PointValue::Advantage) => Some(Side::B),
            _ => None,
        }
    }

    pub(crate) fn set_points(&mut self, side: Side, value: PointValue) {
        match side {
            Side::A => self.points_a = value,
            Side::B => self.points_b = value,
        }
    }

    pub(crate) fn current_games_mut(&mut self, side: Side) -> &mut u32 {
        let games = match side {
            Side::A => &mut self.games_a,
            Side::B => &mut self.games_b,
        };
        if games.is_empty() {
            games.push(0);
        }
        let last = games.len() - 1;
        &mut games[last]
    }

    pub(crate) fn sets_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::A => &mut self.sets_a,
            Side::B => &mut self.sets_b,
        }
    }
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<ScoreParts> for ScoreState {
    type Error = ScoreError;

    fn try_from(parts: ScoreParts) -> Result<Self, Self::Error> {
        Self::from_parts(parts)
    }
}

impl From<ScoreState> for ScoreParts {
    fn from(score: ScoreState) -> Self {
        Self {
            sets_a: score.sets_a,
            sets_b: score.sets_b,
            games_a: score.games_a,
            games_b: score.games_b,
            points_a: score.points_a,
            points_b: score.points_b,
        }
    }
}

impl fmt::Display for ScoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sets {}-{} games {}-{} points {}-{}",
            self.sets_a,
            self.sets_b,
            self.current_games(Side::A),
            self.current_games(Side::B),
            self.points_a,
            self.points_b
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn parts(points_a: PointValue, points_b: PointValue) -> ScoreParts {
        ScoreParts {
            sets_a: 0,
            sets_b: 0,
            games_a: vec![0],
            games_b: vec![0],
            points_a,
            points_b,
        }
    }

    #[test]
    fn new_score_is_zeroed() {
        let score = ScoreState::new();
        assert_eq!(score.sets(Side::A), 0);
        assert_eq!(score.games(Side::B), &[0]);
        assert_eq!(score.points(Side::A), PointValue::Love);
        assert_eq!(score.advantage(), None);
        assert!(!score.is_deuce());
    }

    #[test]
    fn advantage_requires_opponent_at_forty() {
        assert!(ScoreState::from_parts(parts(PointValue::Advantage, PointValue::Forty)).is_ok());
        assert!(matches!(
            ScoreState::from_parts(parts(PointValue::Advantage, PointValue::Thirty)),
            Err(ScoreError::InvalidAdvantage { .. })
        ));
        assert!(
            ScoreState::from_parts(parts(PointValue::Advantage, PointValue::Advantage)).is_err()
        );
    }

    #[test]
    fn game_sequences_must_align() {
        let mut p = parts(PointValue::Love, PointValue::Love);
        p.games_b = vec![0, 1];
        assert_eq!(
            ScoreState::from_parts(p),
            Err(ScoreError::GamesLengthMismatch { a: 1, b: 2 })
        );

        let mut p = parts(PointValue::Love, PointValue::Love);
        p.games_a.clear();
        assert_eq!(ScoreState::from_parts(p), Err(ScoreError::EmptyGames));
    }

    #[test]
    fn json_keeps_client_wire_shape() {
        let score =
            ScoreState::from_parts(parts(PointValue::Advantage, PointValue::Forty)).unwrap();
        let json = serde_json::to_value(&score).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "sets_a": 0,
                "sets_b": 0,
                "games_a": [0],
                "games_b": [0],
                "points_a": "adv",
                "points_b": 40
            })
        );

        let back: ScoreState = serde_json::from_value(json).unwrap();
        assert_eq!(back, score);
    }

    #[test]
    fn json_rejects_invalid_scores() {
        let bad_point = serde_json::json!({
            "sets_a": 0, "sets_b": 0, "games_a": [0], "games_b": [0],
            "points_a": 20, "points_b": 0
        });
        assert!(serde_json::from_value::<ScoreState>(bad_point).is_err());

        let bad_adv = serde_json::json!({
            "sets_a": 0, "sets_b": 0, "games_a": [0], "games_b": [0],
            "points_a": "adv", "points_b": 15
        });
        assert!(serde_json::from_value::<ScoreState>(bad_adv).is_err());
    }

    #[test]
    fn bincode_encodes_advantage() {
        let score =
            ScoreState::from_parts(parts(PointValue::Forty, PointValue::Advantage)).unwrap();
        let bytes = bincode::serialize(&score).unwrap();
        let back: ScoreState = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, score);
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(
            ScoreState::new().to_string(),
            "sets 0-0 games 0-0 points 0-0"
        );
    }
}
