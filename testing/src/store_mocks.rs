//! In-memory match store for fast, deterministic testing.
//!
//! - [`InMemoryMatchStore`]: `HashMap`-based storage with the same commit
//!   semantics as the Postgres store, plus failure injection

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

use padelsense_core::aggregate::{Highlight, Match};
use padelsense_core::event::MatchEvent;
use padelsense_core::store::{Commit, LoadedMatch, MatchStore, StoreError};
use padelsense_core::types::MatchId;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::time::Duration;

#[derive(Debug, Default)]
struct Tables {
    matches: HashMap<MatchId, Match>,
    events: HashMap<MatchId, Vec<MatchEvent>>,
    highlights: HashMap<MatchId, Vec<Highlight>>,
    fail_next_commit: bool,
    commits: usize,
}

/// In-memory match store.
///
/// Commits are all-or-nothing and version-checked exactly like the
/// production store.
///
/// # Example
///
/// ```
/// use padelsense_core::store::MatchStore;
/// use padelsense_core::types::MatchId;
/// use padelsense_testing::InMemoryMatchStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryMatchStore::new();
/// assert!(store.load(MatchId::new()).await?.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryMatchStore {
    tables: Arc<RwLock<Tables>>,
    commit_delay: Option<Duration>,
}

impl InMemoryMatchStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before every commit, widening race windows in
    /// concurrency tests.
    #[must_use]
    pub const fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = Some(delay);
        self
    }

    /// Make the next commit fail with a database error, writing nothing.
    pub fn fail_next_commit(&self) {
        self.tables.write().unwrap().fail_next_commit = true;
    }

    /// Number of successful commits
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.tables.read().unwrap().commits
    }

    /// Number of events currently logged for a match
    #[must_use]
    pub fn event_count(&self, match_id: MatchId) -> usize {
        self.tables
            .read()
            .unwrap()
            .events
            .get(&match_id)
            .map_or(0, Vec::len)
    }

    /// Number of stored matches
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.read().unwrap().matches.len()
    }

    /// Check if the store holds no matches
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.read().unwrap().matches.is_empty()
    }

    fn apply(&self, commit: Commit) -> Result<(), StoreError> {
        commit.validate()?;
        let match_id = commit.match_id();
        let mut tables = self.tables.write().unwrap();

        if tables.fail_next_commit {
            tables.fail_next_commit = false;
            return Err(StoreError::Database("injected commit failure".to_string()));
        }

        let stored = tables.matches.get(&match_id).map(|m| m.version);
        match (commit.expected_version, stored) {
            (None, Some(actual)) => {
                return Err(StoreError::ConcurrencyConflict {
                    match_id,
                    expected: 0,
                    actual,
                });
            }
            (Some(_), None) => return Err(StoreError::NotFound(match_id)),
            (Some(expected), Some(actual)) if expected != actual => {
                return Err(StoreError::ConcurrencyConflict {
                    match_id,
                    expected,
                    actual,
                });
            }
            _ => {}
        }

        let log = tables.events.entry(match_id).or_default();
        if let Some(deleted) = commit.delete {
            log.retain(|event| event.id != deleted);
        }
        log.push(commit.append);

        if let Some(highlight) = commit.highlight {
            tables.highlights.entry(match_id).or_default().push(highlight);
        }
        tables.matches.insert(match_id, commit.state);
        tables.commits += 1;
        Ok(())
    }
}

impl MatchStore for InMemoryMatchStore {
    fn load(
        &self,
        match_id: MatchId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<LoadedMatch>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let tables = self.tables.read().unwrap();
            Ok(tables.matches.get(&match_id).map(|m| {
                let latest = tables
                    .events
                    .get(&match_id)
                    .and_then(|log| log.last())
                    .cloned();
                (m.clone(), latest)
            }))
        })
    }

    fn commit(
        &self,
        commit: Commit,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async move {
            if let Some(delay) = self.commit_delay {
                tokio::time::sleep(delay).await;
            }
            self.apply(commit)
        })
    }

    fn events(
        &self,
        match_id: MatchId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MatchEvent>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            Ok(self
                .tables
                .read()
                .unwrap()
                .events
                .get(&match_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn highlights(
        &self,
        match_id: MatchId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Highlight>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            Ok(self
                .tables
                .read()
                .unwrap()
                .highlights
                .get(&match_id)
                .cloned()
                .unwrap_or_default())
        })
    }
}
