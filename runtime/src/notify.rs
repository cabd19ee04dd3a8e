//! Match-end notification dispatch.
//!
//! Runs on a detached task: the command that ended the match has already
//! committed and returned by the time players are looked up and messaged.

use crate::metrics::NotifyMetrics;
use padelsense_core::aggregate::Match;
use padelsense_core::notify::{MatchSummary, Notifier, NotifyError, PlayerDirectory, Recipient};
use padelsense_core::types::PlayerId;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Looks up players and hands the summary to the notifier.
#[derive(Clone)]
pub struct NotificationDispatcher {
    directory: Arc<dyn PlayerDirectory>,
    notifier: Arc<dyn Notifier>,
    court_name: String,
    club_name: String,
}

impl NotificationDispatcher {
    /// Create a dispatcher naming matches after this court and club.
    #[must_use]
    pub fn new(
        directory: Arc<dyn PlayerDirectory>,
        notifier: Arc<dyn Notifier>,
        court_name: impl Into<String>,
        club_name: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            notifier,
            court_name: court_name.into(),
            club_name: club_name.into(),
        }
    }

    /// Notify the players of `finished` in the background.
    ///
    /// Failures are logged and counted; the returned handle never yields an
    /// error and may be dropped.
    pub fn dispatch(&self, finished: &Match) -> JoinHandle<()> {
        let dispatcher = self.clone();
        let players = finished.players();
        let summary = MatchSummary::of(finished, &self.court_name, &self.club_name);

        tokio::spawn(async move {
            let match_id = summary.match_id;
            match dispatcher.deliver(&players, summary).await {
                Ok(0) => {
                    tracing::info!(match_id = %match_id, "No recipients for match; skip notifications");
                }
                Ok(count) => {
                    NotifyMetrics::record_sent();
                    tracing::info!(match_id = %match_id, recipients = count, "Match-end notification sent");
                }
                Err(error) => {
                    NotifyMetrics::record_failure();
                    tracing::warn!(match_id = %match_id, error = %error, "Match-end notification failed");
                }
            }
        })
    }

    async fn deliver(
        &self,
        players: &[PlayerId],
        summary: MatchSummary,
    ) -> Result<usize, NotifyError> {
        let mut recipients: Vec<Recipient> = Vec::with_capacity(players.len());
        for player in players {
            match self.directory.recipient(*player).await {
                Ok(Some(recipient)) => recipients.push(recipient),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(player = %player, error = %error, "Player lookup failed");
                }
            }
        }

        if recipients.is_empty() {
            return Ok(0);
        }
        let count = recipients.len();
        self.notifier.notify_match_end(recipients, summary).await?;
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use padelsense_testing::{FailingNotifier, RecordingNotifier, StaticDirectory, fixtures};
    use std::time::Duration;

    #[tokio::test]
    async fn delivers_to_known_players_only() {
        let finished = fixtures::started_match();
        let [a1, _, b1, _] = finished.players();
        let directory = StaticDirectory::new([(a1, Recipient::new(11)), (b1, Recipient::new(33))]);
        let notifier = RecordingNotifier::new();
        let dispatcher = NotificationDispatcher::new(
            Arc::new(directory),
            Arc::new(notifier.clone()),
            "Корт 1",
            "PadelClub",
        );

        dispatcher.dispatch(&finished).await.unwrap();

        let deliveries = notifier.wait_for(1, Duration::from_secs(1)).await;
        assert_eq!(deliveries.len(), 1);
        let (recipients, summary) = &deliveries[0];
        assert_eq!(recipients, &vec![Recipient::new(11), Recipient::new(33)]);
        assert_eq!(summary.match_id, finished.id);
        assert_eq!(summary.club_name, "PadelClub");
    }

    #[tokio::test]
    async fn skips_when_nobody_resolves() {
        let notifier = RecordingNotifier::new();
        let dispatcher = NotificationDispatcher::new(
            Arc::new(StaticDirectory::new([])),
            Arc::new(notifier.clone()),
            "Корт 1",
            "PadelClub",
        );

        dispatcher.dispatch(&fixtures::started_match()).await.unwrap();
        assert!(notifier.deliveries().is_empty());
    }

    #[tokio::test]
    async fn notifier_failure_is_swallowed() {
        let finished = fixtures::started_match();
        let [a1, ..] = finished.players();
        let notifier = FailingNotifier::new();
        let dispatcher = NotificationDispatcher::new(
            Arc::new(StaticDirectory::new([(a1, Recipient::new(1))])),
            Arc::new(notifier.clone()),
            "Корт 1",
            "PadelClub",
        );

        let joined = dispatcher.dispatch(&finished).await;
        assert!(joined.is_ok());
        assert_eq!(notifier.attempts(), 1);
    }
}
