//! The single mutation entry point for matches.
//!
//! Every command follows the same path:
//!
//! ```text
//! lock(match_id) → load → decide → commit → unlock → (end only) dispatch notification
//! ```
//!
//! Commands on one match are serialized by a per-match async lock; commands
//! on different matches never contend. The store's version check catches
//! writers in other processes.

use crate::metrics::CommandMetrics;
use crate::notify::NotificationDispatcher;
use padelsense_core::aggregate::{Highlight, Match};
use padelsense_core::command::{
    Decision, DecisionContext, MatchCommand, StartMatch, UndoPolicy, decide, decide_start,
};
use padelsense_core::environment::Clock;
use padelsense_core::error::MatchError;
use padelsense_core::event::MatchEvent;
use padelsense_core::store::{Commit, MatchStore};
use padelsense_core::types::{CourtId, MatchId, Roster, Side};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::OwnedMutexGuard;

/// Runtime settings for the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Court used when `start` names none
    pub default_court: CourtId,
    /// How `undo` rebuilds the previous score
    pub undo_policy: UndoPolicy,
}

impl ControllerConfig {
    /// Configuration with the given default court.
    #[must_use]
    pub fn new(default_court: CourtId) -> Self {
        Self {
            default_court,
            undo_policy: UndoPolicy::default(),
        }
    }

    /// Set the undo policy
    #[must_use]
    pub const fn with_undo_policy(mut self, undo_policy: UndoPolicy) -> Self {
        self.undo_policy = undo_policy;
        self
    }
}

/// Per-match async locks.
///
/// Entries nobody holds or waits on are pruned whenever a lock is taken.
#[derive(Debug, Default)]
struct LockRegistry {
    locks: Mutex<HashMap<MatchId, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockRegistry {
    async fn acquire(&self, match_id: MatchId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|id, lock| *id == match_id || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(match_id).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Result of a command that was applied (or found nothing to do).
struct Applied {
    state: Match,
    highlight: Option<Highlight>,
}

/// Match state machine over a [`MatchStore`].
///
/// # Example
///
/// ```
/// use padelsense_core::types::{CourtId, PlayerId, Roster, Side};
/// use padelsense_runtime::{ControllerConfig, MatchController};
/// use padelsense_testing::{InMemoryMatchStore, test_clock};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let controller = MatchController::new(
///     Arc::new(InMemoryMatchStore::new()),
///     Arc::new(test_clock()),
///     ControllerConfig::new(CourtId::new("court-1")?),
/// );
///
/// let team_a = Roster::new(PlayerId::new(), PlayerId::new());
/// let team_b = Roster::new(PlayerId::new(), PlayerId::new());
/// let started = controller.start(team_a, team_b, None).await?;
/// let scored = controller.add_point(started.id, Side::A).await?;
/// assert_eq!(scored.version, 2);
/// # Ok(())
/// # }
/// ```
pub struct MatchController {
    store: Arc<dyn MatchStore>,
    clock: Arc<dyn Clock>,
    config: ControllerConfig,
    notifications: Option<NotificationDispatcher>,
    locks: LockRegistry,
}

impl MatchController {
    /// Create a controller without match-end notifications.
    #[must_use]
    pub fn new(store: Arc<dyn MatchStore>, clock: Arc<dyn Clock>, config: ControllerConfig) -> Self {
        Self {
            store,
            clock,
            config,
            notifications: None,
            locks: LockRegistry::default(),
        }
    }

    /// Notify players through `dispatcher` when a match ends.
    #[must_use]
    pub fn with_notifications(mut self, dispatcher: NotificationDispatcher) -> Self {
        self.notifications = Some(dispatcher);
        self
    }

    /// The controller's configuration
    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Start a new match.
    ///
    /// # Errors
    ///
    /// - [`MatchError::InvalidInput`] if a player appears twice
    /// - [`MatchError::Store`] if the insert failed
    #[tracing::instrument(skip_all, fields(court_id = tracing::field::Empty))]
    pub async fn start(
        &self,
        team_a: Roster,
        team_b: Roster,
        court_id: Option<CourtId>,
    ) -> Result<Match, MatchError> {
        const COMMAND: &str = "start";
        CommandMetrics::record_command(COMMAND);

        let result: Result<Match, MatchError> = async {
            let ctx = self.context();
            let start = StartMatch {
                match_id: MatchId::new(),
                team_a,
                team_b,
                court_id,
            };
            let commit = decide_start(start, &self.config.default_court, &ctx)?;
            tracing::Span::current().record("court_id", commit.state.court_id.as_str());
            let state = commit.state.clone();
            self.commit(commit).await?;
            tracing::info!(match_id = %state.id, "Match started");
            Ok(state)
        }
        .await;

        observe(COMMAND, result)
    }

    /// Record a point for `side`.
    ///
    /// # Errors
    ///
    /// - [`MatchError::NotFound`] for an unknown match
    /// - [`MatchError::InvalidState`] if the match is finished
    /// - [`MatchError::ConcurrencyConflict`] / [`MatchError::Store`] if the commit failed
    #[tracing::instrument(skip(self), fields(match_id = %match_id))]
    pub async fn add_point(&self, match_id: MatchId, side: Side) -> Result<Match, MatchError> {
        self.execute(match_id, MatchCommand::AddPoint { side })
            .await
            .map(|applied| applied.state)
    }

    /// Cancel the most recent point. A no-op when the latest event is not a
    /// point.
    ///
    /// # Errors
    ///
    /// - [`MatchError::NotFound`] for an unknown match
    /// - [`MatchError::InvalidState`] if the match is finished
    /// - [`MatchError::ConcurrencyConflict`] / [`MatchError::Store`] if the commit failed
    #[tracing::instrument(skip(self), fields(match_id = %match_id))]
    pub async fn undo(&self, match_id: MatchId) -> Result<Match, MatchError> {
        self.execute(match_id, MatchCommand::Undo)
            .await
            .map(|applied| applied.state)
    }

    /// Mark a highlight `timestamp_sec` seconds into the recording.
    ///
    /// # Errors
    ///
    /// - [`MatchError::NotFound`] for an unknown match
    /// - [`MatchError::InvalidState`] if the match is finished
    /// - [`MatchError::InvalidInput`] for a negative or non-finite offset
    /// - [`MatchError::ConcurrencyConflict`] / [`MatchError::Store`] if the commit failed
    #[tracing::instrument(skip(self), fields(match_id = %match_id))]
    pub async fn add_highlight(
        &self,
        match_id: MatchId,
        timestamp_sec: f64,
    ) -> Result<(Match, Highlight), MatchError> {
        let applied = self
            .execute(match_id, MatchCommand::AddHighlight { timestamp_sec })
            .await?;
        match applied.highlight {
            Some(highlight) => Ok((applied.state, highlight)),
            None => Err(MatchError::InvalidInput(
                "highlight was not recorded".to_string(),
            )),
        }
    }

    /// Swap the team A and team B rosters.
    ///
    /// # Errors
    ///
    /// - [`MatchError::NotFound`] for an unknown match
    /// - [`MatchError::InvalidState`] if the match is finished
    /// - [`MatchError::ConcurrencyConflict`] / [`MatchError::Store`] if the commit failed
    #[tracing::instrument(skip(self), fields(match_id = %match_id))]
    pub async fn side_change(&self, match_id: MatchId) -> Result<Match, MatchError> {
        self.execute(match_id, MatchCommand::SideChange)
            .await
            .map(|applied| applied.state)
    }

    /// Finish the match and notify its players in the background.
    ///
    /// # Errors
    ///
    /// - [`MatchError::NotFound`] for an unknown match
    /// - [`MatchError::InvalidState`] if the match is already finished
    /// - [`MatchError::ConcurrencyConflict`] / [`MatchError::Store`] if the commit failed
    #[tracing::instrument(skip(self), fields(match_id = %match_id))]
    pub async fn end(&self, match_id: MatchId) -> Result<Match, MatchError> {
        let finished = self.execute(match_id, MatchCommand::End).await?.state;

        match &self.notifications {
            Some(dispatcher) => {
                dispatcher.dispatch(&finished);
            }
            None => tracing::debug!("Notifications disabled; skip match-end notice"),
        }
        Ok(finished)
    }

    /// Current state of a match.
    ///
    /// # Errors
    ///
    /// - [`MatchError::NotFound`] for an unknown match
    /// - [`MatchError::Store`] if the read failed
    pub async fn get(&self, match_id: MatchId) -> Result<Match, MatchError> {
        self.store
            .load(match_id)
            .await?
            .map(|(state, _)| state)
            .ok_or(MatchError::NotFound(match_id))
    }

    /// The match's event log, oldest first.
    ///
    /// # Errors
    ///
    /// - [`MatchError::NotFound`] for an unknown match
    /// - [`MatchError::Store`] if the read failed
    pub async fn events(&self, match_id: MatchId) -> Result<Vec<MatchEvent>, MatchError> {
        self.get(match_id).await?;
        Ok(self.store.events(match_id).await?)
    }

    /// The match's highlights, in creation order.
    ///
    /// # Errors
    ///
    /// - [`MatchError::NotFound`] for an unknown match
    /// - [`MatchError::Store`] if the read failed
    pub async fn highlights(&self, match_id: MatchId) -> Result<Vec<Highlight>, MatchError> {
        self.get(match_id).await?;
        Ok(self.store.highlights(match_id).await?)
    }

    async fn execute(&self, match_id: MatchId, command: MatchCommand) -> Result<Applied, MatchError> {
        let name = command.name();
        CommandMetrics::record_command(name);

        let result: Result<Applied, MatchError> = async {
            let _guard = self.locks.acquire(match_id).await;

            let loaded = self
                .store
                .load(match_id)
                .await?
                .ok_or(MatchError::NotFound(match_id))?;

            match decide(&loaded, command, &self.context())? {
                Decision::Unchanged(state) => {
                    tracing::debug!(command = name, "Nothing to apply");
                    Ok(Applied {
                        state,
                        highlight: None,
                    })
                }
                Decision::Commit(commit) => {
                    let state = commit.state.clone();
                    let highlight = commit.highlight.clone();
                    let kind = commit.append.kind();
                    self.commit(commit).await?;
                    tracing::info!(
                        command = name,
                        event = %kind,
                        version = state.version,
                        score = %state.score,
                        "Match updated"
                    );
                    Ok(Applied { state, highlight })
                }
            }
        }
        .await;

        observe(name, result)
    }

    async fn commit(&self, commit: Commit) -> Result<(), MatchError> {
        let started = Instant::now();
        let result = self.store.commit(commit).await;
        CommandMetrics::record_commit(started.elapsed());
        Ok(result?)
    }

    fn context(&self) -> DecisionContext {
        DecisionContext::new(self.clock.now(), self.config.undo_policy)
    }

    #[cfg(test)]
    fn lock_entries(&self) -> usize {
        self.locks.len()
    }
}

/// Counts and logs a failed command, passing the result through.
fn observe<T>(command: &'static str, result: Result<T, MatchError>) -> Result<T, MatchError> {
    if let Err(error) = &result {
        CommandMetrics::record_failure(command, error.kind());
        match error {
            MatchError::Store(_) => {
                tracing::error!(command, error = %error, "Command failed");
            }
            _ => tracing::warn!(command, error = %error, "Command rejected"),
        }
    }
    result
}
