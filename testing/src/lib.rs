//! # PadelSense Testing
//!
//! Testing utilities and helpers for PadelSense.
//!
//! This crate provides:
//! - In-memory implementations of the collaborator traits
//! - A Given-When-Then builder for the pure decision step
//! - Fixtures for started matches
//!
//! ## Example
//!
//! ```
//! use padelsense_core::command::MatchCommand;
//! use padelsense_core::score::PointValue;
//! use padelsense_core::types::Side;
//! use padelsense_testing::DecisionTest;
//!
//! DecisionTest::new()
//!     .given_started()
//!     .when_command(MatchCommand::AddPoint { side: Side::A })
//!     .then_state(|m| assert_eq!(m.score.points(Side::A), PointValue::Fifteen))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use padelsense_core::environment::Clock;

pub mod decision_test;
pub mod store_mocks;

/// Mock implementations of the environment and notification traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use padelsense_core::notify::{MatchSummary, Notifier, NotifyError, PlayerDirectory, Recipient};
    use padelsense_core::types::PlayerId;
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use padelsense_testing::mocks::FixedClock;
    /// use padelsense_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    type Delivery = (Vec<Recipient>, MatchSummary);

    /// Notifier that records every delivery.
    ///
    /// Deliveries happen on a detached task, so tests await them with
    /// [`RecordingNotifier::wait_for`].
    #[derive(Clone, Debug, Default)]
    pub struct RecordingNotifier {
        deliveries: Arc<Mutex<Vec<Delivery>>>,
    }

    impl RecordingNotifier {
        /// Create an empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of everything delivered so far
        #[must_use]
        #[allow(clippy::unwrap_used)] // Test infrastructure
        pub fn deliveries(&self) -> Vec<Delivery> {
            self.deliveries.lock().unwrap().clone()
        }

        /// Polls until at least `count` deliveries were recorded or `timeout`
        /// elapsed, then returns what was recorded.
        pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Delivery> {
            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                let seen = self.deliveries();
                if seen.len() >= count || tokio::time::Instant::now() >= deadline {
                    return seen;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    }

    impl Notifier for RecordingNotifier {
        #[allow(clippy::unwrap_used)] // Test infrastructure
        fn notify_match_end(
            &self,
            recipients: Vec<Recipient>,
            summary: MatchSummary,
        ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
            Box::pin(async move {
                self.deliveries.lock().unwrap().push((recipients, summary));
                Ok(())
            })
        }
    }

    /// Notifier that always fails, counting attempts.
    #[derive(Clone, Debug, Default)]
    pub struct FailingNotifier {
        attempts: Arc<AtomicUsize>,
    }

    impl FailingNotifier {
        /// Create a failing notifier
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of delivery attempts so far
        #[must_use]
        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl Notifier for FailingNotifier {
        fn notify_match_end(
            &self,
            _recipients: Vec<Recipient>,
            _summary: MatchSummary,
        ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
            Box::pin(async move {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                Err(NotifyError::Transport("bot unreachable".to_string()))
            })
        }
    }

    /// Player directory backed by a fixed map, counting lookups.
    #[derive(Clone, Debug, Default)]
    pub struct StaticDirectory {
        entries: Arc<HashMap<PlayerId, Recipient>>,
        lookups: Arc<AtomicUsize>,
    }

    impl StaticDirectory {
        /// Directory knowing exactly these players
        #[must_use]
        pub fn new(entries: impl IntoIterator<Item = (PlayerId, Recipient)>) -> Self {
            Self {
                entries: Arc::new(entries.into_iter().collect()),
                lookups: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Number of lookups served so far
        #[must_use]
        pub fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    impl PlayerDirectory for StaticDirectory {
        fn recipient(
            &self,
            player: PlayerId,
        ) -> Pin<Box<dyn Future<Output = Result<Option<Recipient>, NotifyError>> + Send + '_>>
        {
            Box::pin(async move {
                self.lookups.fetch_add(1, Ordering::SeqCst);
                Ok(self.entries.get(&player).copied())
            })
        }
    }
}

/// Ready-made matches for tests.
pub mod fixtures {
    use padelsense_core::aggregate::Match;
    use padelsense_core::command::{DecisionContext, StartMatch, UndoPolicy, decide_start};
    use padelsense_core::environment::Clock;
    use padelsense_core::store::LoadedMatch;
    use padelsense_core::types::{CourtId, MatchId, PlayerId, Roster};

    /// Court used by fixtures
    #[must_use]
    #[allow(clippy::expect_used)] // Constant id is never blank
    pub fn court() -> CourtId {
        CourtId::new("court-1").expect("fixture court id is not blank")
    }

    /// Two rosters of four fresh, distinct players
    #[must_use]
    pub fn rosters() -> (Roster, Roster) {
        (
            Roster::new(PlayerId::new(), PlayerId::new()),
            Roster::new(PlayerId::new(), PlayerId::new()),
        )
    }

    /// A match just started on [`court`] at the test clock's time, with its
    /// start event as the latest event.
    #[must_use]
    #[allow(clippy::expect_used)] // Fresh rosters are always distinct
    pub fn started() -> LoadedMatch {
        let (team_a, team_b) = rosters();
        let ctx = DecisionContext::new(super::test_clock().now(), UndoPolicy::default());
        let commit = decide_start(
            StartMatch {
                match_id: MatchId::new(),
                team_a,
                team_b,
                court_id: None,
            },
            &court(),
            &ctx,
        )
        .expect("fresh rosters are distinct");
        (commit.state, Some(commit.append))
    }

    /// Just the match of [`started`]
    #[must_use]
    pub fn started_match() -> Match {
        started().0
    }
}

// Re-export commonly used items
pub use decision_test::DecisionTest;
pub use mocks::{FailingNotifier, FixedClock, RecordingNotifier, StaticDirectory, test_clock};
pub use store_mocks::InMemoryMatchStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[test]
    fn fixture_match_is_active_at_version_one() {
        let (state, latest) = fixtures::started();
        assert!(state.is_active());
        assert_eq!(state.version, 1);
        assert_eq!(latest.map(|e| e.sequence), Some(1));
    }
}
