//! Match endpoints.
//!
//! Every mutating route answers with the match as it looks after the
//! command, in the shape the tablet and bot clients read.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, SecondsFormat, Utc};
use padelsense_core::aggregate::{Highlight, Match};
use padelsense_core::event::{EventKind, EventPayload, MatchEvent};
use padelsense_core::score::ScoreState;
use padelsense_core::types::{CourtId, MatchId, PlayerId, Roster, Side};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /matches/start`. Positions 1 and 2 are team A.
#[derive(Debug, Deserialize)]
pub struct StartMatchRequest {
    /// Team A, first player
    pub position_1_user_id: Uuid,
    /// Team A, second player
    pub position_2_user_id: Uuid,
    /// Team B, first player
    pub position_3_user_id: Uuid,
    /// Team B, second player
    pub position_4_user_id: Uuid,
    /// Court; the configured default when absent or blank
    #[serde(default)]
    pub court_id: Option<String>,
}

/// Body of `POST /matches/:id/point`.
#[derive(Debug, Deserialize)]
pub struct PointRequest {
    /// `"A"` or `"B"`
    pub team: String,
}

/// Query of `POST /matches/:id/highlight`.
#[derive(Debug, Default, Deserialize)]
pub struct HighlightQuery {
    /// Offset into the recording, in seconds
    #[serde(default)]
    pub timestamp_sec: f64,
}

/// A match as returned by every match route.
#[derive(Debug, Serialize)]
pub struct MatchResponse {
    /// Match id
    pub id: Uuid,
    /// Court id
    pub court_id: String,
    /// RFC 3339 start time
    pub started_at: String,
    /// RFC 3339 end time, once finished
    pub ended_at: Option<String>,
    /// `"active"` or `"finished"`
    pub status: &'static str,
    /// Current team A
    pub team_a_player_ids: Vec<Uuid>,
    /// Current team B
    pub team_b_player_ids: Vec<Uuid>,
    /// Full score
    pub score: ScoreState,
}

impl From<&Match> for MatchResponse {
    fn from(m: &Match) -> Self {
        Self {
            id: *m.id.as_uuid(),
            court_id: m.court_id.to_string(),
            started_at: timestamp(m.started_at),
            ended_at: m.ended_at.map(timestamp),
            status: m.status.as_str(),
            team_a_player_ids: roster_ids(&m.team_a),
            team_b_player_ids: roster_ids(&m.team_b),
            score: m.score.clone(),
        }
    }
}

/// One event of a match log.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Event id
    pub id: Uuid,
    /// Position in the log
    pub sequence: u64,
    /// Event kind
    pub kind: EventKind,
    /// RFC 3339 time the event was recorded
    pub created_at: String,
    /// Event details
    pub payload: EventPayload,
}

impl From<MatchEvent> for EventResponse {
    fn from(event: MatchEvent) -> Self {
        Self {
            id: *event.id.as_uuid(),
            sequence: event.sequence,
            kind: event.kind(),
            created_at: timestamp(event.created_at),
            payload: event.payload,
        }
    }
}

/// One highlight of a match.
#[derive(Debug, Serialize)]
pub struct HighlightResponse {
    /// Highlight id
    pub id: Uuid,
    /// Match id
    pub match_id: Uuid,
    /// Offset into the recording, in seconds
    pub timestamp_sec: f64,
    /// Clip location, once produced
    pub url: Option<String>,
    /// RFC 3339 time the highlight was marked
    pub created_at: String,
}

impl From<Highlight> for HighlightResponse {
    fn from(h: Highlight) -> Self {
        Self {
            id: *h.id.as_uuid(),
            match_id: *h.match_id.as_uuid(),
            timestamp_sec: h.timestamp_sec,
            url: h.media_url,
            created_at: timestamp(h.created_at),
        }
    }
}

/// `POST /matches/start`
///
/// # Errors
///
/// 422 when players repeat.
pub async fn start_match(
    State(state): State<AppState>,
    Json(request): Json<StartMatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let team_a = Roster::new(
        PlayerId::from_uuid(request.position_1_user_id),
        PlayerId::from_uuid(request.position_2_user_id),
    );
    let team_b = Roster::new(
        PlayerId::from_uuid(request.position_3_user_id),
        PlayerId::from_uuid(request.position_4_user_id),
    );
    let court_id = request
        .court_id
        .filter(|id| !id.trim().is_empty())
        .map(CourtId::new)
        .transpose()?;

    let m = state.controller.start(team_a, team_b, court_id).await?;
    Ok(Json(MatchResponse::from(&m)))
}

/// `GET /matches/:id`
///
/// # Errors
///
/// 404 for an unknown match.
pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, AppError> {
    let m = state.controller.get(MatchId::from_uuid(id)).await?;
    Ok(Json(MatchResponse::from(&m)))
}

/// `POST /matches/:id/point`
///
/// # Errors
///
/// 404 unknown match, 409 finished match, 422 unknown team code.
pub async fn add_point(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PointRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let side: Side = request.team.parse()?;
    let m = state
        .controller
        .add_point(MatchId::from_uuid(id), side)
        .await?;
    Ok(Json(MatchResponse::from(&m)))
}

/// `POST /matches/:id/undo`
///
/// # Errors
///
/// 404 unknown match, 409 finished match.
pub async fn undo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, AppError> {
    let m = state.controller.undo(MatchId::from_uuid(id)).await?;
    Ok(Json(MatchResponse::from(&m)))
}

/// `POST /matches/:id/highlight?timestamp_sec=<f64>`
///
/// # Errors
///
/// 404 unknown match, 409 finished match, 422 negative offset.
pub async fn add_highlight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<HighlightQuery>,
) -> Result<Json<MatchResponse>, AppError> {
    let (m, _) = state
        .controller
        .add_highlight(MatchId::from_uuid(id), query.timestamp_sec)
        .await?;
    Ok(Json(MatchResponse::from(&m)))
}

/// `POST /matches/:id/side-change`
///
/// # Errors
///
/// 404 unknown match, 409 finished match.
pub async fn side_change(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, AppError> {
    let m = state.controller.side_change(MatchId::from_uuid(id)).await?;
    Ok(Json(MatchResponse::from(&m)))
}

/// `POST /matches/:id/end`
///
/// # Errors
///
/// 404 unknown match, 409 already finished.
pub async fn end_match(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, AppError> {
    let m = state.controller.end(MatchId::from_uuid(id)).await?;
    Ok(Json(MatchResponse::from(&m)))
}

/// `GET /matches/:id/events`
///
/// # Errors
///
/// 404 for an unknown match.
pub async fn list_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let events = state.controller.events(MatchId::from_uuid(id)).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

/// `GET /matches/:id/highlights`
///
/// # Errors
///
/// 404 for an unknown match.
pub async fn list_highlights(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<HighlightResponse>>, AppError> {
    let highlights = state.controller.highlights(MatchId::from_uuid(id)).await?;
    Ok(Json(
        highlights.into_iter().map(HighlightResponse::from).collect(),
    ))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn roster_ids(roster: &Roster) -> Vec<Uuid> {
    roster.players().iter().map(|p| *p.as_uuid()).collect()
}
