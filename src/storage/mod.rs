//! Storage interface and the in-memory reference backend.
//!
//! The trait is async so a persistent backend can suspend on I/O; the
//! in-memory implementation never does. Handlers hold the store as
//! `Arc<dyn Storage>` so the backend can be swapped without touching them.

pub mod memory;
pub mod models;

use async_trait::async_trait;

use crate::error::StorageError;
use models::{
    Badge, Category, Comment, CommentWithAuthor, DirectMessage, Group, NewUser, Notification,
    Post, PostWithAuthor, ProfileUpdate, Story, User,
};

#[async_trait]
pub trait Storage: Send + Sync {
    // --- Users ---

    /// Create an account. Fails with `UsernameTaken` on a duplicate username.
    async fn create_user(&self, new: NewUser) -> Result<User, StorageError>;
    async fn user(&self, id: i64) -> Result<Option<User>, StorageError>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;
    async fn user_count(&self) -> Result<i64, StorageError>;
    async fn update_profile(&self, id: i64, changes: ProfileUpdate) -> Result<User, StorageError>;

    /// Add experience points; the user levels up once experience reaches
    /// `level * 1000`.
    async fn add_experience(&self, user_id: i64, amount: i64) -> Result<User, StorageError>;

    // --- Posts ---

    async fn create_post(
        &self,
        user_id: i64,
        content: String,
        category_id: i64,
        image_url: Option<String>,
        is_project: bool,
    ) -> Result<Post, StorageError>;

    /// Posts newest-first, optionally filtered by category.
    async fn posts(&self, category_id: Option<i64>) -> Result<Vec<PostWithAuthor>, StorageError>;

    /// Posts ordered by like count descending, optionally filtered by category.
    async fn recommended_posts(
        &self,
        category_id: Option<i64>,
    ) -> Result<Vec<PostWithAuthor>, StorageError>;

    async fn post(&self, id: i64) -> Result<Option<PostWithAuthor>, StorageError>;

    // --- Comments ---

    async fn create_comment(
        &self,
        user_id: i64,
        post_id: i64,
        content: String,
    ) -> Result<Comment, StorageError>;

    /// Comments on a post, oldest-first.
    async fn comments(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>, StorageError>;

    // --- Likes ---

    /// Toggle a like. Returns true if the like now exists, false if removed.
    async fn toggle_like(&self, user_id: i64, post_id: i64) -> Result<bool, StorageError>;
    async fn like_count(&self, post_id: i64) -> Result<i64, StorageError>;

    // --- Groups ---

    async fn create_group(
        &self,
        name: String,
        description: Option<String>,
        image_url: Option<String>,
        is_private: bool,
    ) -> Result<Group, StorageError>;
    async fn groups(&self) -> Result<Vec<Group>, StorageError>;
    async fn join_group(&self, user_id: i64, group_id: i64) -> Result<(), StorageError>;
    async fn leave_group(&self, user_id: i64, group_id: i64) -> Result<(), StorageError>;

    // --- Badges ---

    async fn create_badge(
        &self,
        name: String,
        description: String,
        image_url: String,
        requirement: String,
    ) -> Result<Badge, StorageError>;
    async fn badges(&self) -> Result<Vec<Badge>, StorageError>;
    async fn user_badges(&self, user_id: i64) -> Result<Vec<Badge>, StorageError>;
    async fn award_badge(&self, user_id: i64, badge_id: i64) -> Result<(), StorageError>;

    // --- Categories ---

    async fn categories(&self) -> Result<Vec<Category>, StorageError>;
    async fn create_category(
        &self,
        name: String,
        kind: String,
        description: Option<String>,
    ) -> Result<Category, StorageError>;

    // --- Stories ---

    async fn create_story(
        &self,
        user_id: i64,
        content: String,
        image_url: Option<String>,
    ) -> Result<Story, StorageError>;

    /// Stories that have not yet expired, newest-first.
    async fn active_stories(&self) -> Result<Vec<Story>, StorageError>;
    async fn record_story_view(&self, story_id: i64, user_id: i64) -> Result<(), StorageError>;
    async fn story_view_count(&self, story_id: i64) -> Result<i64, StorageError>;

    // --- Direct messages ---

    async fn create_message(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content: String,
    ) -> Result<DirectMessage, StorageError>;

    /// Full conversation between two users, oldest-first.
    async fn conversation(
        &self,
        user_a: i64,
        user_b: i64,
    ) -> Result<Vec<DirectMessage>, StorageError>;

    /// Mark all messages from `sender_id` to `receiver_id` as read.
    async fn mark_messages_read(
        &self,
        receiver_id: i64,
        sender_id: i64,
    ) -> Result<(), StorageError>;

    // --- Notifications ---

    /// Record a notification for a user. Assigns id and timestamp;
    /// the record starts unread.
    async fn create_notification(
        &self,
        user_id: i64,
        kind: &str,
        content: &str,
        related_id: i64,
    ) -> Result<Notification, StorageError>;

    /// Notifications for one user, newest-first. `before` is an exclusive
    /// id cursor; `limit` is clamped by the caller.
    async fn notifications_for_user(
        &self,
        user_id: i64,
        before: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Notification>, StorageError>;

    /// Idempotent: no-op when the notification is missing, already read,
    /// or belongs to someone else.
    async fn mark_notification_read(&self, user_id: i64, id: i64) -> Result<(), StorageError>;

    /// Idempotent: no-op when missing or owned by someone else.
    async fn delete_notification(&self, user_id: i64, id: i64) -> Result<(), StorageError>;
}
