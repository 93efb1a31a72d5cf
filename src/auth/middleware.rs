use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

use crate::auth::session::{resolve_session, SessionMap};

/// Session map handle stored in request extensions by a middleware layer,
/// so the extractor below can resolve tokens without access to AppState.
#[derive(Clone)]
pub struct Sessions(pub SessionMap);

/// Authenticated caller, extracted from `Authorization: Bearer <token>`.
/// Rejects with 401 when the token is missing, unknown, or expired.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    /// The bearer token itself, kept so logout can revoke it.
    pub token: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let sessions = parts
            .extensions
            .get::<Sessions>()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

        let user_id = resolve_session(&sessions.0, token).ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(CurrentUser {
            id: user_id,
            token: token.to_string(),
        })
    }
}
