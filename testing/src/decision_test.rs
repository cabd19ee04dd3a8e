//! Ergonomic testing utilities for match decisions
//!
//! This module provides a fluent API for testing `decide` with readable
//! Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // DecisionTest is the natural name

use crate::{fixtures, test_clock};
use padelsense_core::aggregate::Match;
use padelsense_core::command::{Decision, DecisionContext, MatchCommand, UndoPolicy, decide};
use padelsense_core::environment::Clock;
use padelsense_core::error::MatchError;
use padelsense_core::store::{Commit, LoadedMatch};

/// Type alias for state assertion functions
type StateAssertion = Box<dyn FnOnce(&Match)>;

/// Type alias for commit assertion functions
type CommitAssertion = Box<dyn FnOnce(Option<&Commit>)>;

/// Type alias for error assertion functions
type ErrorAssertion = Box<dyn FnOnce(&MatchError)>;

/// Fluent API for testing match decisions with Given-When-Then syntax
///
/// `given_*` sets up the loaded match, `and_given` replays earlier commands
/// onto it, `when_command` is the command under test.
///
/// # Example
///
/// ```
/// use padelsense_core::command::{MatchCommand, UndoPolicy};
/// use padelsense_core::score::PointValue;
/// use padelsense_core::types::Side;
/// use padelsense_testing::DecisionTest;
///
/// DecisionTest::new()
///     .with_undo_policy(UndoPolicy::Snapshot)
///     .given_started()
///     .and_given(MatchCommand::AddPoint { side: Side::B })
///     .when_command(MatchCommand::Undo)
///     .then_state(|m| assert_eq!(m.score.points(Side::B), PointValue::Love))
///     .then_commit(|commit| assert!(commit.is_some_and(|c| c.delete.is_some())))
///     .run();
/// ```
pub struct DecisionTest {
    undo_policy: UndoPolicy,
    loaded: Option<LoadedMatch>,
    history: Vec<MatchCommand>,
    command: Option<MatchCommand>,
    state_assertions: Vec<StateAssertion>,
    commit_assertions: Vec<CommitAssertion>,
    error_assertions: Vec<ErrorAssertion>,
}

impl Default for DecisionTest {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTest {
    /// Create a new decision test
    #[must_use]
    pub fn new() -> Self {
        Self {
            undo_policy: UndoPolicy::default(),
            loaded: None,
            history: Vec::new(),
            command: None,
            state_assertions: Vec::new(),
            commit_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Set the undo policy used for every decision in the test
    #[must_use]
    pub const fn with_undo_policy(mut self, policy: UndoPolicy) -> Self {
        self.undo_policy = policy;
        self
    }

    /// Start from a freshly started match (Given)
    #[must_use]
    pub fn given_started(self) -> Self {
        self.given(fixtures::started())
    }

    /// Start from this match and latest event (Given)
    #[must_use]
    pub fn given(mut self, loaded: LoadedMatch) -> Self {
        self.loaded = Some(loaded);
        self
    }

    /// Start from this match with no latest event (Given)
    #[must_use]
    pub fn given_match(self, state: Match) -> Self {
        self.given((state, None))
    }

    /// Replay a command before the one under test (Given)
    #[must_use]
    pub fn and_given(mut self, command: MatchCommand) -> Self {
        self.history.push(command);
        self
    }

    /// Set the command to test (When)
    #[must_use]
    pub fn when_command(mut self, command: MatchCommand) -> Self {
        self.command = Some(command);
        self
    }

    /// Add an assertion about the resulting match (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Match) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the commit; `None` means nothing is written (Then)
    #[must_use]
    pub fn then_commit<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(Option<&Commit>) + 'static,
    {
        self.commit_assertions.push(Box::new(assertion));
        self
    }

    /// Expect the command to be rejected (Then)
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&MatchError) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if no match or command is set, if a replayed command fails,
    /// if the outcome (success or error) is not the one asserted on, or if
    /// any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut loaded = self
            .loaded
            .expect("Initial match must be set with given() or given_started()");
        let command = self
            .command
            .expect("Command must be set with when_command()");
        let policy = self.undo_policy;

        for earlier in self.history {
            let decision = decide(&loaded, earlier, &context(policy))
                .expect("Replayed commands must succeed");
            loaded = advance(&loaded, decision);
        }

        match decide(&loaded, command, &context(policy)) {
            Ok(decision) => {
                assert!(
                    self.error_assertions.is_empty(),
                    "Expected the command to fail, but it produced {decision:?}"
                );
                for assertion in self.state_assertions {
                    assertion(decision.state());
                }
                let commit = match &decision {
                    Decision::Commit(commit) => Some(commit),
                    Decision::Unchanged(_) => None,
                };
                for assertion in self.commit_assertions {
                    assertion(commit);
                }
            }
            Err(error) => {
                assert!(
                    !self.error_assertions.is_empty(),
                    "Command failed unexpectedly: {error}"
                );
                for assertion in self.error_assertions {
                    assertion(&error);
                }
            }
        }
    }
}

fn context(policy: UndoPolicy) -> DecisionContext {
    DecisionContext::new(test_clock().now(), policy)
}

/// Applies a decision the way a store would: the committed state becomes
/// current and the appended event becomes the latest one.
#[must_use]
pub fn advance(loaded: &LoadedMatch, decision: Decision) -> LoadedMatch {
    match decision {
        Decision::Commit(commit) => (commit.state, Some(commit.append)),
        Decision::Unchanged(state) => (state, loaded.1.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padelsense_core::aggregate::MatchStatus;
    use padelsense_core::score::PointValue;
    use padelsense_core::types::Side;

    #[test]
    fn replays_history_before_command() {
        DecisionTest::new()
            .given_started()
            .and_given(MatchCommand::AddPoint { side: Side::A })
            .and_given(MatchCommand::AddPoint { side: Side::A })
            .when_command(MatchCommand::AddPoint { side: Side::A })
            .then_state(|m| {
                assert_eq!(m.score.points(Side::A), PointValue::Forty);
                assert_eq!(m.version, 4);
            })
            .run();
    }

    #[test]
    fn error_assertions_run_on_rejection() {
        DecisionTest::new()
            .given_started()
            .and_given(MatchCommand::End)
            .when_command(MatchCommand::SideChange)
            .then_error(|error| {
                assert!(matches!(
                    error,
                    MatchError::InvalidState {
                        status: MatchStatus::Finished,
                        ..
                    }
                ));
            })
            .run();
    }

    #[test]
    fn unchanged_decision_has_no_commit() {
        DecisionTest::new()
            .given_started()
            .when_command(MatchCommand::Undo)
            .then_commit(|commit| assert!(commit.is_none()))
            .run();
    }
}
