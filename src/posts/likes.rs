//! REST endpoints for post likes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::auth::middleware::CurrentUser;
use crate::notify::{self, KIND_LIKE};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub liked: bool,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct LikeCountResponse {
    pub count: i64,
}

/// POST /api/posts/{id}/like — Toggle the caller's like on a post.
/// Notifies the post author when a like is added (not on removal, and not
/// for self-likes).
pub async fn toggle_like(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(post_id): Path<i64>,
) -> Result<Json<LikeResponse>, StatusCode> {
    let post = state
        .store
        .post(post_id)
        .await
        .map_err(|e| e.status())?
        .ok_or(StatusCode::NOT_FOUND)?;

    let liked = state
        .store
        .toggle_like(current.id, post_id)
        .await
        .map_err(|e| e.status())?;
    let count = state
        .store
        .like_count(post_id)
        .await
        .map_err(|e| e.status())?;

    if liked && post.post.user_id != current.id {
        let author = state
            .store
            .user(current.id)
            .await
            .map_err(|e| e.status())?
            .ok_or(StatusCode::UNAUTHORIZED)?;
        let text = format!("{} a aimé votre post", author.username);
        notify::notify(&state, post.post.user_id, KIND_LIKE, &text, post_id).await;
    }

    Ok(Json(LikeResponse { liked, count }))
}

/// GET /api/posts/{id}/likes — Current like count.
pub async fn like_count(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(post_id): Path<i64>,
) -> Result<Json<LikeCountResponse>, StatusCode> {
    let count = state
        .store
        .like_count(post_id)
        .await
        .map_err(|e| e.status())?;
    Ok(Json(LikeCountResponse { count }))
}
