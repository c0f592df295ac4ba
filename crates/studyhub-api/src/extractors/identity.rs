//! Requester identity extractor.
//!
//! Authentication is an external collaborator: the deployment's identity
//! proxy authenticates the user and injects the `x-user-id` header. This
//! extractor only parses that header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use studyhub_core::AppError;

use crate::error::ApiError;

/// The authenticated user id taken from the `x-user-id` header.
#[derive(Debug, Clone, Copy)]
pub struct RequesterId(pub Uuid);

impl<S> FromRequestParts<S> for RequesterId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError(AppError::validation("Missing x-user-id header")))?;

        let user_id = header
            .parse::<Uuid>()
            .map_err(|_| ApiError(AppError::validation("Invalid x-user-id header")))?;

        Ok(Self(user_id))
    }
}
