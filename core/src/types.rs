//! Identifiers and small value types for the match domain.
//!
//! All identifiers are UUID newtypes so a `MatchId` can never be passed where a
//! `PlayerId` is expected. `CourtId` is a free-form, non-empty string because
//! courts are configured by operators, not generated.

use crate::error::MatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Creates a new random `MatchId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `MatchId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a player
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Creates a new random `PlayerId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PlayerId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a match event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a highlight marker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightId(Uuid);

impl HighlightId {
    /// Creates a new random `HighlightId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `HighlightId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for HighlightId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HighlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Court identifier (operator-assigned, e.g. `"court-1"`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourtId(String);

impl CourtId {
    /// Creates a `CourtId`, rejecting blank identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidInput`] if `id` is empty or whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, MatchError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(MatchError::InvalidInput(
                "court id cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CourtId {
    type Error = MatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CourtId> for String {
    fn from(id: CourtId) -> Self {
        id.0
    }
}

impl fmt::Display for CourtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Sides and rosters
// ============================================================================

/// One of the two teams on court.
///
/// The wire codes are `"A"` and `"B"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Team A (positions 1 and 2 at match start)
    A,
    /// Team B (positions 3 and 4 at match start)
    B,
}

impl Side {
    /// The other team
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Wire code for this side
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl FromStr for Side {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            other => Err(MatchError::InvalidInput(format!(
                "unknown side code {other:?}, expected \"A\" or \"B\""
            ))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The two players forming one team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster([PlayerId; 2]);

impl Roster {
    /// Creates a roster from two players
    #[must_use]
    pub const fn new(first: PlayerId, second: PlayerId) -> Self {
        Self([first, second])
    }

    /// The two players in court-position order
    #[must_use]
    pub const fn players(&self) -> &[PlayerId; 2] {
        &self.0
    }

    /// Returns true if `player` is on this team
    #[must_use]
    pub fn contains(&self, player: PlayerId) -> bool {
        self.0.contains(&player)
    }
}

/// Checks that two rosters name four distinct players.
///
/// # Errors
///
/// Returns [`MatchError::InvalidInput`] naming the first repeated player.
pub fn validate_rosters(team_a: &Roster, team_b: &Roster) -> Result<(), MatchError> {
    let all = team_a.players().iter().chain(team_b.players().iter());
    let mut seen: Vec<PlayerId> = Vec::with_capacity(4);
    for player in all {
        if seen.contains(player) {
            return Err(MatchError::InvalidInput(format!(
                "player {player} appears more than once in the rosters"
            )));
        }
        seen.push(*player);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_parses_wire_codes() {
        assert_eq!("A".parse::<Side>().ok(), Some(Side::A));
        assert_eq!("B".parse::<Side>().ok(), Some(Side::B));
        assert!(matches!(
            "a".parse::<Side>(),
            Err(MatchError::InvalidInput(_))
        ));
        assert!("".parse::<Side>().is_err());
    }

    #[test]
    fn opposite_side_flips() {
        assert_eq!(Side::A.opposite(), Side::B);
        assert_eq!(Side::B.opposite().opposite(), Side::B);
    }

    #[test]
    fn blank_court_id_rejected() {
        assert!(CourtId::new("   ").is_err());
        assert_eq!(
            CourtId::new("court-1").map(|c| c.to_string()).ok(),
            Some("court-1".to_string())
        );
    }

    #[test]
    fn duplicate_players_rejected() {
        let p1 = PlayerId::new();
        let p2 = PlayerId::new();
        let p3 = PlayerId::new();
        let p4 = PlayerId::new();

        assert!(validate_rosters(&Roster::new(p1, p2), &Roster::new(p3, p4)).is_ok());
        assert!(validate_rosters(&Roster::new(p1, p1), &Roster::new(p3, p4)).is_err());
        assert!(validate_rosters(&Roster::new(p1, p2), &Roster::new(p3, p2)).is_err());
    }
}
