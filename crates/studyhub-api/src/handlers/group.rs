//! Study group handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use studyhub_core::AppError;
use studyhub_entity::group::{CreateStudyGroup, GroupMember, GroupMemberProfile, StudyGroup};

use crate::error::ApiError;
use crate::extractors::RequesterId;
use crate::state::AppState;

/// Request body for creating a study group.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGroupRequest {
    /// Group name.
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    /// Optional description.
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Main subject.
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
}

/// GET /api/groups — list all groups.
pub async fn list_groups(
    State(state): State<AppState>,
) -> Result<Json<Vec<StudyGroup>>, ApiError> {
    Ok(Json(state.groups.list().await?))
}

/// POST /api/groups — create a group; the requester becomes its first
/// member.
pub async fn create_group(
    State(state): State<AppState>,
    RequesterId(user_id): RequesterId,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<StudyGroup>), ApiError> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let group = state
        .groups
        .create(&CreateStudyGroup {
            name: body.name,
            description: body.description,
            subject: body.subject,
            created_by: user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /api/groups/{id}/members — list a group's members.
pub async fn list_members(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<GroupMemberProfile>>, ApiError> {
    require_group(&state, group_id).await?;
    Ok(Json(state.groups.list_members(group_id).await?))
}

/// POST /api/groups/{id}/members — join a group.
pub async fn join_group(
    State(state): State<AppState>,
    RequesterId(user_id): RequesterId,
    Path(group_id): Path<Uuid>,
) -> Result<(StatusCode, Json<GroupMember>), ApiError> {
    require_group(&state, group_id).await?;
    let member = state.groups.add_member(group_id, user_id).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// DELETE /api/groups/{id}/members — leave a group.
pub async fn leave_group(
    State(state): State<AppState>,
    RequesterId(user_id): RequesterId,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = state.groups.remove_member(group_id, user_id).await?;
    if !removed {
        return Err(AppError::not_found("Not a member of this group").into());
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/groups/{id}/membership — whether the requester is a member.
///
/// Clients call this before subscribing to the group's presence room.
pub async fn check_membership(
    State(state): State<AppState>,
    RequesterId(user_id): RequesterId,
    Path(group_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let is_member = state.groups.is_member(group_id, user_id).await?;
    Ok(Json(serde_json::json!({ "is_member": is_member })))
}

async fn require_group(state: &AppState, group_id: Uuid) -> Result<StudyGroup, ApiError> {
    state
        .groups
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Group {group_id} not found")).into())
}
