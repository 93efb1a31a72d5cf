//! REST endpoints for comments on posts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::middleware::CurrentUser;
use crate::notify::{self, KIND_COMMENT};
use crate::state::AppState;
use crate::storage::models::{Comment, CommentWithAuthor};

const MAX_CONTENT_LENGTH: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// POST /api/posts/{id}/comments — Comment on a post.
/// The post author is notified unless they commented on their own post;
/// mentioned users are notified as well.
pub async fn create_comment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(post_id): Path<i64>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), StatusCode> {
    let content = body.content.trim().to_string();
    if content.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if content.len() > MAX_CONTENT_LENGTH {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let post = state
        .store
        .post(post_id)
        .await
        .map_err(|e| e.status())?
        .ok_or(StatusCode::NOT_FOUND)?;

    let author = state
        .store
        .user(current.id)
        .await
        .map_err(|e| e.status())?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let comment = state
        .store
        .create_comment(current.id, post_id, content.clone())
        .await
        .map_err(|e| e.status())?;

    // Notification fan-out happens after the comment is durable and never
    // affects the response.
    if post.post.user_id != current.id {
        let text = format!("{} a commenté votre post", author.username);
        notify::notify(&state, post.post.user_id, KIND_COMMENT, &text, post_id).await;
    }
    notify::notify_mentions(&state, &author.username, author.id, &content, post_id).await;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/posts/{id}/comments — Comments oldest-first, with authors.
pub async fn list_comments(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(post_id): Path<i64>,
) -> Result<Json<Vec<CommentWithAuthor>>, StatusCode> {
    let comments = state
        .store
        .comments(post_id)
        .await
        .map_err(|e| e.status())?;
    Ok(Json(comments))
}
