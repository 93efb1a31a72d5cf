//! Notification records: REST surface, creation helpers, mention scanning.

pub mod dispatcher;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::auth::middleware::CurrentUser;
use crate::state::AppState;
use crate::storage::models::Notification;

/// Notification kinds. An open set of tags; these are the ones the server
/// itself produces.
pub const KIND_COMMENT: &str = "comment";
pub const KIND_LIKE: &str = "like";
pub const KIND_MENTION: &str = "mention";
pub const KIND_MESSAGE: &str = "message";

/// Default page size for the notification list.
const DEFAULT_LIMIT: usize = 50;
/// Maximum page size for the notification list.
const MAX_LIMIT: usize = 100;

/// Record a notification and hand it to the dispatcher.
///
/// This is the post-commit hook every domain write calls as its final side
/// effect. It never propagates failure: a storage error is logged and the
/// originating action proceeds, and the dispatcher send is fire-and-forget.
pub async fn notify(state: &AppState, user_id: i64, kind: &str, content: &str, related_id: i64) {
    match state
        .store
        .create_notification(user_id, kind, content, related_id)
        .await
    {
        Ok(notification) => {
            // Receiver can only be gone during shutdown; the record is
            // already durable in the store either way.
            let _ = state.notification_tx.send(notification);
        }
        Err(e) => {
            tracing::warn!(user_id, kind, error = %e, "failed to record notification");
        }
    }
}

/// Scan content for `@username` mentions and notify each mentioned user.
/// Unknown usernames and self-mentions are skipped.
pub async fn notify_mentions(state: &AppState, author: &str, author_id: i64, content: &str, related_id: i64) {
    for username in mention_targets(content) {
        let target = match state.store.user_by_username(&username).await {
            Ok(Some(user)) => user,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(username = %username, error = %e, "mention lookup failed");
                continue;
            }
        };
        if target.id == author_id {
            continue;
        }
        let text = format!("{author} vous a mentionné");
        notify(state, target.id, KIND_MENTION, &text, related_id).await;
    }
}

/// Usernames referenced as `@name` tokens. Word characters only; a token
/// ends at the first other character.
pub fn mention_targets(content: &str) -> Vec<String> {
    let mut targets = Vec::new();
    let mut rest = content;
    while let Some(at) = rest.find('@') {
        rest = &rest[at + 1..];
        let end = rest
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .unwrap_or(rest.len());
        if end > 0 {
            let name = rest[..end].to_string();
            if !targets.contains(&name) {
                targets.push(name);
            }
        }
        rest = &rest[end..];
    }
    targets
}

// --- REST handlers ---

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Exclusive id cursor: return notifications older than this id.
    pub before: Option<i64>,
    pub limit: Option<usize>,
}

/// GET /api/notifications?before={id}&limit={n}
/// The caller's notifications, newest-first.
pub async fn list_notifications(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>, StatusCode> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let notifications = state
        .store
        .notifications_for_user(current.id, query.before, limit)
        .await
        .map_err(|e| e.status())?;
    Ok(Json(notifications))
}

/// POST /api/notifications/{id}/read — Mark one notification read.
/// Idempotent; succeeds even if the id is unknown or already read.
pub async fn mark_read(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    state
        .store
        .mark_notification_read(current.id, id)
        .await
        .map_err(|e| e.status())?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/notifications/{id} — Delete one notification. Idempotent.
pub async fn delete_notification(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    state
        .store
        .delete_notification(current.id, id)
        .await
        .map_err(|e| e.status())?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::mention_targets;

    #[test]
    fn finds_mentions_in_text() {
        assert_eq!(
            mention_targets("salut @alice et @bob_42, regardez ça"),
            vec!["alice".to_string(), "bob_42".to_string()]
        );
    }

    #[test]
    fn deduplicates_and_ignores_bare_at() {
        assert_eq!(mention_targets("@alice @alice @ rien"), vec!["alice"]);
        assert!(mention_targets("pas de mention ici").is_empty());
    }
}
