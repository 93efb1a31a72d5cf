//! REST endpoints for posts.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::middleware::CurrentUser;
use crate::notify;
use crate::state::AppState;
use crate::storage::models::{Post, PostWithAuthor};

/// Maximum post content length (chars).
const MAX_CONTENT_LENGTH: usize = 4000;
/// Experience awarded for publishing a post.
const POST_XP: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub content: String,
    pub category_id: i64,
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_project: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsQuery {
    pub category_id: Option<i64>,
    #[serde(default)]
    pub recommended: bool,
}

/// POST /api/posts — Publish a post. Awards experience and notifies
/// mentioned users as final side effects.
pub async fn create_post(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), StatusCode> {
    let content = body.content.trim().to_string();
    if content.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if content.len() > MAX_CONTENT_LENGTH {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let author = state
        .store
        .user(current.id)
        .await
        .map_err(|e| e.status())?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let post = state
        .store
        .create_post(
            current.id,
            content.clone(),
            body.category_id,
            body.image_url,
            body.is_project,
        )
        .await
        .map_err(|e| e.status())?;

    if let Err(e) = state.store.add_experience(current.id, POST_XP).await {
        // XP accrual is best-effort; the post is already published.
        tracing::warn!(user_id = current.id, error = %e, "failed to award post experience");
    }

    notify::notify_mentions(&state, &author.username, author.id, &content, post.id).await;

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/posts?categoryId={id}&recommended=true
/// Newest-first by default; `recommended` sorts by like count.
pub async fn list_posts(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<PostWithAuthor>>, StatusCode> {
    let posts = if query.recommended {
        state.store.recommended_posts(query.category_id).await
    } else {
        state.store.posts(query.category_id).await
    }
    .map_err(|e| e.status())?;
    Ok(Json(posts))
}

/// GET /api/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<PostWithAuthor>, StatusCode> {
    let post = state
        .store
        .post(id)
        .await
        .map_err(|e| e.status())?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(post))
}
