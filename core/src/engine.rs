//! The scoring engine: one point in, one score out.
//!
//! [`apply_point`] is total over valid scores. Side validation happens before
//! a command reaches this module, so there is no error path here.
//!
//! # Rules
//!
//! ```text
//!  scorer \ opponent | 0..30        | 40            | adv
//! -------------------+--------------+---------------+-------------
//!  0 / 15 / 30       | advance      | advance       | (impossible)
//!  40                | wins game    | takes adv     | back to deuce
//!  adv               | (impossible) | wins game     | (impossible)
//! ```
//!
//! A won game may close the set: a side takes the set at six or more games
//! with a lead of at least two. There is no tie-break; 6-6 plays on until the
//! margin is reached.

use crate::score::{PointValue, ScoreState};
use crate::types::Side;

/// Games needed (at minimum) to take a set.
pub const GAMES_TO_WIN_SET: u32 = 6;

/// Required game lead to close a set.
pub const SET_WIN_MARGIN: u32 = 2;

/// What a single point did to the score, beyond moving the point levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointOutcome {
    /// Point levels moved inside the current game.
    Rally,
    /// Scorer gained Advantage from deuce.
    Advantage,
    /// Opponent's Advantage was revoked; both back at 40.
    Deuce,
    /// Scorer won the game.
    Game,
    /// Scorer won the game and with it the set.
    Set,
}

/// Applies one point for `side` and returns the new score.
#[must_use]
pub fn apply_point(score: &ScoreState, side: Side) -> ScoreState {
    score_point(score, side).0
}

/// Like [`apply_point`], also reporting what the point achieved.
#[must_use]
pub fn score_point(score: &ScoreState, side: Side) -> (ScoreState, PointOutcome) {
    let mut next = score.clone();
    let mine = score.points(side);
    let theirs = score.points(side.opposite());

    let outcome = match mine {
        PointValue::Love => {
            next.set_points(side, PointValue::Fifteen);
            PointOutcome::Rally
        }
        PointValue::Fifteen => {
            next.set_points(side, PointValue::Thirty);
            PointOutcome::Rally
        }
        PointValue::Thirty => {
            next.set_points(side, PointValue::Forty);
            PointOutcome::Rally
        }
        PointValue::Forty => match theirs {
            PointValue::Love | PointValue::Fifteen | PointValue::Thirty => {
                win_game(&mut next, side)
            }
            PointValue::Forty => {
                next.set_points(side, PointValue::Advantage);
                PointOutcome::Advantage
            }
            PointValue::Advantage => {
                next.set_points(side, PointValue::Forty);
                next.set_points(side.opposite(), PointValue::Forty);
                PointOutcome::Deuce
            }
        },
        PointValue::Advantage => win_game(&mut next, side),
    };

    (next, outcome)
}

fn win_game(score: &mut ScoreState, side: Side) -> PointOutcome {
    score.set_points(Side::A, PointValue::Love);
    score.set_points(Side::B, PointValue::Love);
    *score.current_games_mut(side) += 1;

    if set_won(score, side) {
        *score.sets_mut(side) += 1;
        score.games_a = vec![0];
        score.games_b = vec![0];
        PointOutcome::Set
    } else {
        PointOutcome::Game
    }
}

fn set_won(score: &ScoreState, side: Side) -> bool {
    let mine = score.current_games(side);
    let theirs = score.current_games(side.opposite());
    mine >= GAMES_TO_WIN_SET && mine.saturating_sub(theirs) >= SET_WIN_MARGIN
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use crate::score::ScoreParts;
    use proptest::prelude::*;

    fn score(games: (u32, u32), points: (PointValue, PointValue)) -> ScoreState {
        ScoreState::from_parts(ScoreParts {
            sets_a: 0,
            sets_b: 0,
            games_a: vec![games.0],
            games_b: vec![games.1],
            points_a: points.0,
            points_b: points.1,
        })
        .unwrap()
    }

    #[test]
    fn points_advance_love_to_forty() {
        let s = ScoreState::new();
        let s = apply_point(&s, Side::A);
        assert_eq!(s.points(Side::A), PointValue::Fifteen);
        let s = apply_point(&s, Side::A);
        assert_eq!(s.points(Side::A), PointValue::Thirty);
        let s = apply_point(&s, Side::A);
        assert_eq!(s.points(Side::A), PointValue::Forty);
        assert_eq!(s.points(Side::B), PointValue::Love);
        assert_eq!(s.current_games(Side::A), 0);
    }

    #[test]
    fn forty_against_lower_wins_game() {
        let s = score((0, 0), (PointValue::Forty, PointValue::Thirty));
        let (next, outcome) = score_point(&s, Side::A);
        assert_eq!(outcome, PointOutcome::Game);
        assert_eq!(next.current_games(Side::A), 1);
        assert_eq!(next.points(Side::A), PointValue::Love);
        assert_eq!(next.points(Side::B), PointValue::Love);
    }

    #[test]
    fn deuce_then_advantage_then_game() {
        let deuce = score((2, 2), (PointValue::Forty, PointValue::Forty));
        assert!(deuce.is_deuce());

        let (adv, outcome) = score_point(&deuce, Side::A);
        assert_eq!(outcome, PointOutcome::Advantage);
        assert_eq!(adv.points(Side::A), PointValue::Advantage);
        assert_eq!(adv.points(Side::B), PointValue::Forty);
        assert_eq!(adv.advantage(), Some(Side::A));

        let game = apply_point(&adv, Side::A);
        assert_eq!(game.points(Side::A), PointValue::Love);
        assert_eq!(game.points(Side::B), PointValue::Love);
        assert_eq!(game.current_games(Side::A), 3);
        assert_eq!(game.current_games(Side::B), 2);
    }

    #[test]
    fn advantage_revoked_back_to_deuce() {
        let adv = score((1, 1), (PointValue::Advantage, PointValue::Forty));
        let (next, outcome) = score_point(&adv, Side::B);
        assert_eq!(outcome, PointOutcome::Deuce);
        assert!(next.is_deuce());
        assert_eq!(next.current_games(Side::A), 1);
        assert_eq!(next.current_games(Side::B), 1);
    }

    #[test]
    fn six_four_closes_set() {
        let s = score((5, 4), (PointValue::Forty, PointValue::Love));
        let (next, outcome) = score_point(&s, Side::A);
        assert_eq!(outcome, PointOutcome::Set);
        assert_eq!(next.sets(Side::A), 1);
        assert_eq!(next.sets(Side::B), 0);
        assert_eq!(next.games(Side::A), &[0]);
        assert_eq!(next.games(Side::B), &[0]);
        assert_eq!(next.points(Side::A), PointValue::Love);
    }

    #[test]
    fn six_five_plays_on() {
        let s = score((5, 5), (PointValue::Forty, PointValue::Love));
        let (next, outcome) = score_point(&s, Side::A);
        assert_eq!(outcome, PointOutcome::Game);
        assert_eq!(next.sets(Side::A), 0);
        assert_eq!(next.current_games(Side::A), 6);
        assert_eq!(next.current_games(Side::B), 5);
    }

    #[test]
    fn no_tiebreak_at_six_all() {
        let s = score((6, 6), (PointValue::Love, PointValue::Forty));
        let next = apply_point(&s, Side::B);
        assert_eq!(next.current_games(Side::B), 7);
        assert_eq!(next.sets(Side::B), 0);

        let next = apply_point(&score((6, 7), (PointValue::Love, PointValue::Forty)), Side::B);
        assert_eq!(next.sets(Side::B), 1);
        assert_eq!(next.games(Side::A), &[0]);
    }

    #[test]
    fn side_b_mirrors_side_a() {
        let s = score((0, 0), (PointValue::Thirty, PointValue::Forty));
        let next = apply_point(&s, Side::B);
        assert_eq!(next.current_games(Side::B), 1);
        assert_eq!(next.current_games(Side::A), 0);
    }

    fn arb_side() -> impl Strategy<Value = Side> {
        prop_oneof![Just(Side::A), Just(Side::B)]
    }

    proptest! {
        #[test]
        fn never_decreases_sets_or_games(sides in proptest::collection::vec(arb_side(), 0..400)) {
            let mut s = ScoreState::new();
            for side in sides {
                let next = apply_point(&s, side);

                prop_assert!(next.sets(Side::A) >= s.sets(Side::A));
                prop_assert!(next.sets(Side::B) >= s.sets(Side::B));
                if next.sets(Side::A) == s.sets(Side::A) && next.sets(Side::B) == s.sets(Side::B) {
                    prop_assert!(next.current_games(Side::A) >= s.current_games(Side::A));
                    prop_assert!(next.current_games(Side::B) >= s.current_games(Side::B));
                }

                // Re-validating through the checked constructor proves the
                // advantage invariant still holds.
                let parts = ScoreParts::from(next.clone());
                prop_assert!(ScoreState::from_parts(parts).is_ok());
                prop_assert_eq!(next.games(Side::A).len(), next.games(Side::B).len());

                s = next;
            }
        }

        #[test]
        fn deterministic(sides in proptest::collection::vec(arb_side(), 0..100)) {
            let run = |sides: &[Side]| {
                sides.iter().fold(ScoreState::new(), |s, side| apply_point(&s, *side))
            };
            prop_assert_eq!(run(&sides), run(&sides));
        }
    }
}
