//! Profile and leaderboard handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use studyhub_core::AppError;
use studyhub_entity::profile::{CreateProfile, Profile};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for provisioning a profile (invoked by the identity
/// provider's signup hook).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfileRequest {
    /// User id issued by the identity provider.
    pub id: Uuid,
    /// Unique handle.
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    /// Display name.
    #[validate(length(min = 1, max = 64))]
    pub display_name: String,
}

/// POST /api/profiles — provision a profile.
pub async fn create_profile(
    State(state): State<AppState>,
    Json(body): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let profile = state
        .profiles
        .create(&CreateProfile {
            id: body.id,
            username: body.username,
            display_name: body.display_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/profiles/{id} — fetch a profile.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state
        .profiles
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Profile {id} not found")))?;
    Ok(Json(profile))
}

/// Query parameters for the leaderboard.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// Maximum entries to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

/// GET /api/leaderboard — top profiles by total study time.
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let limit = query.limit.clamp(1, 100);
    Ok(Json(state.profiles.leaderboard(limit).await?))
}
