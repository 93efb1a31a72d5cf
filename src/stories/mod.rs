//! REST endpoints for ephemeral stories (24h lifetime).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::CurrentUser;
use crate::state::AppState;
use crate::storage::models::Story;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoryViewsResponse {
    pub views: i64,
}

/// POST /api/stories — Publish a story; it expires 24 hours later.
pub async fn create_story(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CreateStoryRequest>,
) -> Result<(StatusCode, Json<Story>), StatusCode> {
    let content = body.content.trim().to_string();
    if content.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let story = state
        .store
        .create_story(current.id, content, body.image_url)
        .await
        .map_err(|e| e.status())?;
    Ok((StatusCode::CREATED, Json(story)))
}

/// GET /api/stories — Stories that have not yet expired, newest-first.
pub async fn list_stories(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<Story>>, StatusCode> {
    let stories = state
        .store
        .active_stories()
        .await
        .map_err(|e| e.status())?;
    Ok(Json(stories))
}

/// POST /api/stories/{id}/view — Record that the caller viewed a story.
/// Repeat views collapse; returns the current distinct view count.
pub async fn view_story(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(story_id): Path<i64>,
) -> Result<Json<StoryViewsResponse>, StatusCode> {
    state
        .store
        .record_story_view(story_id, current.id)
        .await
        .map_err(|e| e.status())?;

    let views = state
        .store
        .story_view_count(story_id)
        .await
        .map_err(|e| e.status())?;
    Ok(Json(StoryViewsResponse { views }))
}
