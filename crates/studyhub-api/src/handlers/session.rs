//! Study session handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use studyhub_core::AppError;
use studyhub_entity::session::StudySession;

use crate::error::ApiError;
use crate::extractors::RequesterId;
use crate::state::AppState;

/// Request body for logging a completed manual session.
#[derive(Debug, Deserialize, Validate)]
pub struct ManualSessionRequest {
    /// Free-text subject.
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    /// Minutes studied; one full day at most.
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: i32,
    /// When the block started; defaults to `duration_minutes` ago.
    pub start_time: Option<DateTime<Utc>>,
    /// Group to attribute the block to, if any.
    pub group_id: Option<Uuid>,
}

/// POST /api/sessions/manual — log a completed study block.
pub async fn create_manual(
    State(state): State<AppState>,
    RequesterId(user_id): RequesterId,
    Json(body): Json<ManualSessionRequest>,
) -> Result<(StatusCode, Json<StudySession>), ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let session = state
        .manual_sessions
        .log_session(
            user_id,
            &body.subject,
            body.duration_minutes,
            body.start_time,
            body.group_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// Query parameters for session history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum entries to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// GET /api/sessions — the requester's session history, newest first.
pub async fn list_sessions(
    State(state): State<AppState>,
    RequesterId(user_id): RequesterId,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<StudySession>>, ApiError> {
    let limit = query.limit.clamp(1, 100);
    Ok(Json(
        state.sessions.find_recent_by_user(user_id, limit).await?,
    ))
}

/// GET /api/sessions/active — the requester's active session, if any.
pub async fn active_session(
    State(state): State<AppState>,
    RequesterId(user_id): RequesterId,
) -> Result<Json<Option<StudySession>>, ApiError> {
    Ok(Json(state.sessions.find_active_by_user(user_id).await?))
}

/// DELETE /api/sessions/{id} — delete a manual session, reversing its
/// credited totals.
pub async fn delete_session(
    State(state): State<AppState>,
    RequesterId(user_id): RequesterId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.manual_sessions.delete_session(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
