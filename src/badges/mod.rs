//! REST endpoints for the badge catalog and per-user awards.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::middleware::CurrentUser;
use crate::state::AppState;
use crate::storage::models::Badge;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBadgeRequest {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub requirement: String,
}

async fn require_admin(state: &AppState, user_id: i64) -> Result<(), StatusCode> {
    let user = state
        .store
        .user(user_id)
        .await
        .map_err(|e| e.status())?
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if !user.is_admin {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(())
}

/// GET /api/badges — The badge catalog.
pub async fn list_badges(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<Badge>>, StatusCode> {
    let badges = state.store.badges().await.map_err(|e| e.status())?;
    Ok(Json(badges))
}

/// GET /api/users/{id}/badges — Badges a user has earned.
pub async fn user_badges(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Badge>>, StatusCode> {
    let badges = state
        .store
        .user_badges(user_id)
        .await
        .map_err(|e| e.status())?;
    Ok(Json(badges))
}

/// POST /api/badges — Add a badge to the catalog. Admin only.
pub async fn create_badge(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CreateBadgeRequest>,
) -> Result<(StatusCode, Json<Badge>), StatusCode> {
    require_admin(&state, current.id).await?;

    let badge = state
        .store
        .create_badge(body.name, body.description, body.image_url, body.requirement)
        .await
        .map_err(|e| e.status())?;
    Ok((StatusCode::CREATED, Json(badge)))
}

/// POST /api/users/{id}/badges/{badge_id} — Award a badge. Admin only.
pub async fn award_badge(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, badge_id)): Path<(i64, i64)>,
) -> Result<StatusCode, StatusCode> {
    require_admin(&state, current.id).await?;

    state
        .store
        .award_badge(user_id, badge_id)
        .await
        .map_err(|e| e.status())?;
    Ok(StatusCode::NO_CONTENT)
}
