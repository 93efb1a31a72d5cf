//! Account endpoints: register, login, logout, current user, profile update.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::auth::middleware::CurrentUser;
use crate::auth::session::{hash_password, issue_session, revoke_session, verify_password};
use crate::state::AppState;
use crate::storage::models::{NewUser, ProfileUpdate, User};

/// Username constraints: 3-32 chars, alphanumeric plus underscore.
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;
const PASSWORD_MIN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

fn valid_username(username: &str) -> bool {
    (USERNAME_MIN..=USERNAME_MAX).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// POST /api/auth/register — Create an account and open a session.
/// The first account registered becomes the server admin.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), StatusCode> {
    if !valid_username(&body.username) || body.password.len() < PASSWORD_MIN {
        return Err(StatusCode::BAD_REQUEST);
    }

    let is_first_account = state.store.user_count().await.map_err(|e| e.status())? == 0;

    let user = state
        .store
        .create_user(NewUser {
            username: body.username,
            password_digest: hash_password(&body.password),
            is_admin: is_first_account,
        })
        .await
        .map_err(|e| e.status())?;

    tracing::info!(user_id = user.id, username = %user.username, "account registered");

    let token = issue_session(&state.sessions, user.id);
    Ok((StatusCode::CREATED, Json(SessionResponse { token, user })))
}

/// POST /api/auth/login — Verify credentials and open a session.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, StatusCode> {
    let user = state
        .store
        .user_by_username(&body.username)
        .await
        .map_err(|e| e.status())?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !verify_password(&body.password, &user.password_digest) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let token = issue_session(&state.sessions, user.id);
    Ok(Json(SessionResponse { token, user }))
}

/// POST /api/auth/logout — Revoke the caller's session token.
pub async fn logout(State(state): State<AppState>, current: CurrentUser) -> StatusCode {
    revoke_session(&state.sessions, &current.token);
    StatusCode::NO_CONTENT
}

/// GET /api/auth/me — The authenticated user's own record.
pub async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<User>, StatusCode> {
    let user = state
        .store
        .user(current.id)
        .await
        .map_err(|e| e.status())?
        .ok_or(StatusCode::UNAUTHORIZED)?;
    Ok(Json(user))
}

/// PUT /api/users/me — Update own profile fields.
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(changes): Json<ProfileUpdate>,
) -> Result<Json<User>, StatusCode> {
    let user = state
        .store
        .update_profile(current.id, changes)
        .await
        .map_err(|e| e.status())?;
    Ok(Json(user))
}

/// GET /api/users/{id} — Public profile lookup.
pub async fn get_user(
    State(state): State<AppState>,
    _current: CurrentUser,
    axum::extract::Path(id): axum::extract::Path<i64>,
) -> Result<Json<User>, StatusCode> {
    let user = state
        .store
        .user(id)
        .await
        .map_err(|e| e.status())?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(user))
}
