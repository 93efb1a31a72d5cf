//! REST endpoints for groups and membership.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::middleware::CurrentUser;
use crate::state::AppState;
use crate::storage::models::Group;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_private: bool,
}

/// POST /api/groups — Create a group. The creator joins it immediately.
pub async fn create_group(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), StatusCode> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let group = state
        .store
        .create_group(name, body.description, body.image_url, body.is_private)
        .await
        .map_err(|e| e.status())?;

    state
        .store
        .join_group(current.id, group.id)
        .await
        .map_err(|e| e.status())?;

    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /api/groups
pub async fn list_groups(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<Group>>, StatusCode> {
    let groups = state.store.groups().await.map_err(|e| e.status())?;
    Ok(Json(groups))
}

/// POST /api/groups/{id}/join
pub async fn join_group(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(group_id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    state
        .store
        .join_group(current.id, group_id)
        .await
        .map_err(|e| e.status())?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/groups/{id}/leave — Idempotent.
pub async fn leave_group(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(group_id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    state
        .store
        .leave_group(current.id, group_id)
        .await
        .map_err(|e| e.status())?;
    Ok(StatusCode::NO_CONTENT)
}
