//! `PostgreSQL` match store.
//!
//! # Schema
//!
//! See `migrations/0001_init.sql`. The match row holds the current state
//! (score as JSONB, in the same shape the clients read), `match_events`
//! holds the log keyed by `(match_id, sequence)`.
//!
//! # Commit
//!
//! A [`Commit`] runs in a single transaction:
//!
//! 1. Insert the match row (`expected_version = None`), or update it guarded
//!    by `WHERE version = $expected`
//! 2. Append the event
//! 3. Delete the cancelled event, if any
//! 4. Insert the highlight, if any
//!
//! Any failure drops the transaction, which rolls everything back.

use chrono::{DateTime, Utc};
use padelsense_core::aggregate::{Highlight, Match, MatchStatus};
use padelsense_core::event::{Event, EventPayload, MatchEvent, check_event_type};
use padelsense_core::score::ScoreState;
use padelsense_core::store::{Commit, LoadedMatch, MatchStore, StoreError};
use padelsense_core::types::{CourtId, EventId, HighlightId, MatchId, PlayerId, Roster};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

const MATCH_COLUMNS: &str = "id, court_id, started_at, ended_at, status, team_a_player_ids, \
                             team_b_player_ids, score, full_video_url, version";

/// PostgreSQL-backed [`MatchStore`].
#[derive(Clone)]
pub struct PostgresMatchStore {
    pool: PgPool,
}

impl PostgresMatchStore {
    /// Create a store using an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    async fn apply(&self, commit: Commit) -> Result<(), StoreError> {
        commit.validate()?;
        let match_id = commit.match_id();
        let mut tx = self.pool.begin().await.map_err(db("begin transaction"))?;

        write_match(&mut tx, &commit.state, commit.expected_version).await?;
        append_event(&mut tx, &commit.append).await?;

        if let Some(cancelled) = commit.delete {
            sqlx::query("DELETE FROM match_events WHERE id = $1 AND match_id = $2")
                .bind(*cancelled.as_uuid())
                .bind(*match_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(db("delete event"))?;
        }

        if let Some(highlight) = &commit.highlight {
            sqlx::query(
                "INSERT INTO highlights (id, match_id, timestamp_sec, url, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(*highlight.id.as_uuid())
            .bind(*highlight.match_id.as_uuid())
            .bind(highlight.timestamp_sec)
            .bind(highlight.media_url.as_deref())
            .bind(highlight.created_at)
            .execute(&mut *tx)
            .await
            .map_err(db("insert highlight"))?;
        }

        tx.commit().await.map_err(db("commit transaction"))?;

        tracing::debug!(
            match_id = %match_id,
            version = commit.state.version,
            event_type = commit.append.payload.event_type(),
            "Match commit applied"
        );
        Ok(())
    }
}

impl MatchStore for PostgresMatchStore {
    fn load(
        &self,
        match_id: MatchId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<LoadedMatch>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
                .bind(*match_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db("load match"))?;

            let Some(row) = row else {
                return Ok(None);
            };
            let state = match_from_row(&row)?;

            let latest = sqlx::query(
                "SELECT id, match_id, sequence, event_type, payload, created_at
                 FROM match_events
                 WHERE match_id = $1
                 ORDER BY sequence DESC
                 LIMIT 1",
            )
            .bind(*match_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db("load latest event"))?
            .map(|row| event_from_row(&row))
            .transpose()?;

            Ok(Some((state, latest)))
        })
    }

    fn commit(
        &self,
        commit: Commit,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(self.apply(commit))
    }

    fn events(
        &self,
        match_id: MatchId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MatchEvent>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT id, match_id, sequence, event_type, payload, created_at
                 FROM match_events
                 WHERE match_id = $1
                 ORDER BY sequence ASC",
            )
            .bind(*match_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db("load events"))?;

            rows.iter().map(event_from_row).collect()
        })
    }

    fn highlights(
        &self,
        match_id: MatchId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Highlight>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let rows: Vec<(Uuid, Uuid, f64, Option<String>, DateTime<Utc>)> = sqlx::query_as(
                "SELECT id, match_id, timestamp_sec, url, created_at
                 FROM highlights
                 WHERE match_id = $1
                 ORDER BY seq ASC",
            )
            .bind(*match_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db("load highlights"))?;

            Ok(rows
                .into_iter()
                .map(|(id, match_id, timestamp_sec, media_url, created_at)| Highlight {
                    id: HighlightId::from_uuid(id),
                    match_id: MatchId::from_uuid(match_id),
                    timestamp_sec,
                    media_url,
                    created_at,
                })
                .collect())
        })
    }
}

async fn write_match(
    tx: &mut Transaction<'_, Postgres>,
    state: &Match,
    expected_version: Option<u64>,
) -> Result<(), StoreError> {
    let score = serde_json::to_value(&state.score)
        .map_err(|e| StoreError::Serialization(format!("Failed to encode score: {e}")))?;
    let version = to_db(state.version)?;

    let query = match expected_version {
        None => sqlx::query(
            "INSERT INTO matches (id, court_id, started_at, ended_at, status, team_a_player_ids,
                                  team_b_player_ids, score, full_video_url, version)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (id) DO NOTHING",
        ),
        Some(_) => sqlx::query(
            "UPDATE matches
             SET court_id = $2, started_at = $3, ended_at = $4, status = $5,
                 team_a_player_ids = $6, team_b_player_ids = $7, score = $8,
                 full_video_url = $9, version = $10
             WHERE id = $1 AND version = $11",
        ),
    }
    .bind(*state.id.as_uuid())
    .bind(state.court_id.as_str())
    .bind(state.started_at)
    .bind(state.ended_at)
    .bind(state.status.as_str())
    .bind(roster_uuids(&state.team_a))
    .bind(roster_uuids(&state.team_b))
    .bind(Json(score))
    .bind(state.full_video_url.as_deref())
    .bind(version);
    let query = match expected_version {
        Some(expected) => query.bind(to_db(expected)?),
        None => query,
    };

    let written = query
        .execute(&mut **tx)
        .await
        .map_err(db("write match"))?
        .rows_affected();

    if written == 1 {
        return Ok(());
    }

    // Nothing written: find out whether the row is missing or moved on.
    let current: Option<(i64,)> = sqlx::query_as("SELECT version FROM matches WHERE id = $1")
        .bind(*state.id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(db("read match version"))?;

    match (current, expected_version) {
        (None, Some(_)) => Err(StoreError::NotFound(state.id)),
        (None, None) => Err(StoreError::Database(format!(
            "insert of match {} wrote no row",
            state.id
        ))),
        (Some((actual,)), expected) => {
            metrics::counter!("match_store_conflicts_total").increment(1);
            tracing::warn!(
                match_id = %state.id,
                expected = expected.unwrap_or(0),
                actual,
                "Optimistic concurrency check failed"
            );
            Err(StoreError::ConcurrencyConflict {
                match_id: state.id,
                expected: expected.unwrap_or(0),
                actual: from_db(actual)?,
            })
        }
    }
}

async fn append_event(
    tx: &mut Transaction<'_, Postgres>,
    event: &MatchEvent,
) -> Result<(), StoreError> {
    let payload = event.payload.to_bytes()?;

    sqlx::query(
        "INSERT INTO match_events (id, match_id, sequence, event_type, payload, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(*event.id.as_uuid())
    .bind(*event.match_id.as_uuid())
    .bind(to_db(event.sequence)?)
    .bind(event.payload.event_type())
    .bind(payload)
    .bind(event.created_at)
    .execute(&mut **tx)
    .await
    .map_err(db("append event"))?;

    Ok(())
}

fn match_from_row(row: &PgRow) -> Result<Match, StoreError> {
    let id: Uuid = column(row, "id")?;
    let court_id: String = column(row, "court_id")?;
    let status: String = column(row, "status")?;
    let Json(score): Json<ScoreState> = column(row, "score")?;
    let version: i64 = column(row, "version")?;

    Ok(Match {
        id: MatchId::from_uuid(id),
        court_id: CourtId::new(court_id)
            .map_err(|e| StoreError::Serialization(format!("Invalid court id: {e}")))?,
        started_at: column(row, "started_at")?,
        ended_at: column(row, "ended_at")?,
        status: MatchStatus::parse(&status)
            .ok_or_else(|| StoreError::Serialization(format!("Unknown match status: {status}")))?,
        team_a: roster_from(column(row, "team_a_player_ids")?)?,
        team_b: roster_from(column(row, "team_b_player_ids")?)?,
        score,
        full_video_url: column(row, "full_video_url")?,
        version: from_db(version)?,
    })
}

fn event_from_row(row: &PgRow) -> Result<MatchEvent, StoreError> {
    let event_type: String = column(row, "event_type")?;
    let kind = check_event_type(&event_type)?;
    let bytes: Vec<u8> = column(row, "payload")?;
    let payload = EventPayload::from_bytes(&bytes)?;
    if payload.kind() != kind {
        return Err(StoreError::Serialization(format!(
            "payload decodes as {} but is stored as {event_type}",
            payload.kind()
        )));
    }

    let id: Uuid = column(row, "id")?;
    let match_id: Uuid = column(row, "match_id")?;
    let sequence: i64 = column(row, "sequence")?;

    Ok(MatchEvent {
        id: EventId::from_uuid(id),
        match_id: MatchId::from_uuid(match_id),
        sequence: from_db(sequence)?,
        created_at: column(row, "created_at")?,
        payload,
    })
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Serialization(format!("Failed to read column {name}: {e}")))
}

fn roster_uuids(roster: &Roster) -> Vec<Uuid> {
    roster.players().iter().map(|p| *p.as_uuid()).collect()
}

fn roster_from(ids: Vec<Uuid>) -> Result<Roster, StoreError> {
    match ids.as_slice() {
        [first, second] => Ok(Roster::new(
            PlayerId::from_uuid(*first),
            PlayerId::from_uuid(*second),
        )),
        other => Err(StoreError::Serialization(format!(
            "team must have 2 players, found {}",
            other.len()
        ))),
    }
}

fn to_db(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Database(format!("{value} exceeds BIGINT")))
}

fn from_db(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Serialization(format!("negative counter {value}")))
}

fn db(context: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| StoreError::Database(format!("Failed to {context}: {e}"))
}
