//! Achievement handlers.

use axum::Json;
use axum::extract::State;

use studyhub_entity::achievement::AchievementProgress;

use crate::error::ApiError;
use crate::extractors::RequesterId;
use crate::state::AppState;

/// GET /api/achievements — the catalog with the requester's progress.
pub async fn list_achievements(
    State(state): State<AppState>,
    RequesterId(user_id): RequesterId,
) -> Result<Json<Vec<AchievementProgress>>, ApiError> {
    Ok(Json(state.achievements.progress_for(user_id).await?))
}
