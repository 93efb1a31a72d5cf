//! Domain record types returned by the storage layer.
//! Serialized field names are camelCase to match the HTTP API contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered account. The password digest never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
    pub level: i64,
    pub experience: i64,
    pub is_admin: bool,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub discord: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for account creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_digest: String,
    pub is_admin: bool,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub profile_pic: Option<String>,
    pub bio: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub discord: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub is_project: bool,
    pub created_at: DateTime<Utc>,
}

/// Post joined with its author, as returned by list/get endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub requirement: String,
}

/// Post category. `kind` is either "anime" or "tech".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
}

/// Ephemeral story, visible until `expires_at`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification record. Created by domain actions, mutated only by the
/// recipient marking it read, deleted only by the recipient.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub related_id: i64,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
