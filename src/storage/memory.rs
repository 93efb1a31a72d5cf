//! In-memory storage backend.
//!
//! Every table is a DashMap and every operation is a single atomic map
//! mutation, so logically-concurrent requests cannot observe a torn
//! read-modify-write. Nothing is persisted; the process starts empty.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::StorageError;
use crate::storage::models::{
    Badge, Category, Comment, CommentWithAuthor, DirectMessage, Group, NewUser, Notification,
    Post, PostWithAuthor, ProfileUpdate, Story, User,
};
use crate::storage::Storage;

/// How long a story stays visible.
const STORY_TTL_HOURS: i64 = 24;

pub struct MemStorage {
    next_id: AtomicI64,
    users: DashMap<i64, User>,
    /// Unique username index: username -> user id.
    usernames: DashMap<String, i64>,
    posts: DashMap<i64, Post>,
    comments: DashMap<i64, Comment>,
    /// (post_id, user_id) -> like id. Toggling is atomic per key.
    likes: DashMap<(i64, i64), i64>,
    groups: DashMap<i64, Group>,
    /// (user_id, group_id) -> is_admin.
    group_members: DashMap<(i64, i64), bool>,
    badges: DashMap<i64, Badge>,
    /// (user_id, badge_id) -> earned_at.
    user_badges: DashMap<(i64, i64), DateTime<Utc>>,
    categories: DashMap<i64, Category>,
    stories: DashMap<i64, Story>,
    /// (story_id, user_id) -> viewed_at.
    story_views: DashMap<(i64, i64), DateTime<Utc>>,
    messages: DashMap<i64, DirectMessage>,
    notifications: DashMap<i64, Notification>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            users: DashMap::new(),
            usernames: DashMap::new(),
            posts: DashMap::new(),
            comments: DashMap::new(),
            likes: DashMap::new(),
            groups: DashMap::new(),
            group_members: DashMap::new(),
            badges: DashMap::new(),
            user_badges: DashMap::new(),
            categories: DashMap::new(),
            stories: DashMap::new(),
            story_views: DashMap::new(),
            messages: DashMap::new(),
            notifications: DashMap::new(),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn author(&self, user_id: i64) -> Option<User> {
        self.users.get(&user_id).map(|u| u.clone())
    }

    fn like_counts(&self) -> HashMap<i64, i64> {
        let mut counts = HashMap::new();
        for entry in self.likes.iter() {
            *counts.entry(entry.key().0).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn create_user(&self, new: NewUser) -> Result<User, StorageError> {
        let id = self.next_id();
        // The username index is the uniqueness gate; claim it first.
        match self.usernames.entry(new.username.clone()) {
            Entry::Occupied(_) => return Err(StorageError::UsernameTaken),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let user = User {
            id,
            username: new.username,
            password_digest: new.password_digest,
            profile_pic: None,
            bio: None,
            level: 1,
            experience: 0,
            is_admin: new.is_admin,
            twitter: None,
            github: None,
            discord: None,
            email: None,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn user(&self, id: i64) -> Result<Option<User>, StorageError> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let id = match self.usernames.get(username) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn user_count(&self) -> Result<i64, StorageError> {
        Ok(self.users.len() as i64)
    }

    async fn update_profile(&self, id: i64, changes: ProfileUpdate) -> Result<User, StorageError> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or(StorageError::NotFound("user"))?;

        if let Some(pic) = changes.profile_pic {
            user.profile_pic = Some(pic);
        }
        if let Some(bio) = changes.bio {
            user.bio = Some(bio);
        }
        if let Some(twitter) = changes.twitter {
            user.twitter = Some(twitter);
        }
        if let Some(github) = changes.github {
            user.github = Some(github);
        }
        if let Some(discord) = changes.discord {
            user.discord = Some(discord);
        }
        if let Some(email) = changes.email {
            user.email = Some(email);
        }
        Ok(user.clone())
    }

    async fn add_experience(&self, user_id: i64, amount: i64) -> Result<User, StorageError> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or(StorageError::NotFound("user"))?;

        user.experience += amount;
        if user.experience >= user.level * 1000 {
            user.level += 1;
        }
        Ok(user.clone())
    }

    async fn create_post(
        &self,
        user_id: i64,
        content: String,
        category_id: i64,
        image_url: Option<String>,
        is_project: bool,
    ) -> Result<Post, StorageError> {
        if !self.categories.contains_key(&category_id) {
            return Err(StorageError::NotFound("category"));
        }

        let post = Post {
            id: self.next_id(),
            user_id,
            category_id,
            content,
            image_url,
            is_project,
            created_at: Utc::now(),
        };
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn posts(&self, category_id: Option<i64>) -> Result<Vec<PostWithAuthor>, StorageError> {
        let mut posts: Vec<PostWithAuthor> = self
            .posts
            .iter()
            .filter(|p| category_id.is_none_or(|c| p.category_id == c))
            .filter_map(|p| {
                let user = self.author(p.user_id)?;
                Some(PostWithAuthor {
                    post: p.clone(),
                    user,
                })
            })
            .collect();

        posts.sort_by(|a, b| {
            b.post
                .created_at
                .cmp(&a.post.created_at)
                .then(b.post.id.cmp(&a.post.id))
        });
        Ok(posts)
    }

    async fn recommended_posts(
        &self,
        category_id: Option<i64>,
    ) -> Result<Vec<PostWithAuthor>, StorageError> {
        let counts = self.like_counts();
        let mut posts = self.posts(category_id).await?;
        posts.sort_by(|a, b| {
            let la = counts.get(&a.post.id).copied().unwrap_or(0);
            let lb = counts.get(&b.post.id).copied().unwrap_or(0);
            lb.cmp(&la).then(b.post.id.cmp(&a.post.id))
        });
        Ok(posts)
    }

    async fn post(&self, id: i64) -> Result<Option<PostWithAuthor>, StorageError> {
        let post = match self.posts.get(&id) {
            Some(p) => p.clone(),
            None => return Ok(None),
        };
        let user = self
            .author(post.user_id)
            .ok_or(StorageError::NotFound("user"))?;
        Ok(Some(PostWithAuthor { post, user }))
    }

    async fn create_comment(
        &self,
        user_id: i64,
        post_id: i64,
        content: String,
    ) -> Result<Comment, StorageError> {
        if !self.posts.contains_key(&post_id) {
            return Err(StorageError::NotFound("post"));
        }

        let comment = Comment {
            id: self.next_id(),
            post_id,
            user_id,
            content,
            created_at: Utc::now(),
        };
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn comments(&self, post_id: i64) -> Result<Vec<CommentWithAuthor>, StorageError> {
        let mut comments: Vec<CommentWithAuthor> = self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let user = self.author(c.user_id)?;
                Some(CommentWithAuthor {
                    comment: c.clone(),
                    user,
                })
            })
            .collect();

        comments.sort_by(|a, b| {
            a.comment
                .created_at
                .cmp(&b.comment.created_at)
                .then(a.comment.id.cmp(&b.comment.id))
        });
        Ok(comments)
    }

    async fn toggle_like(&self, user_id: i64, post_id: i64) -> Result<bool, StorageError> {
        if !self.posts.contains_key(&post_id) {
            return Err(StorageError::NotFound("post"));
        }

        match self.likes.entry((post_id, user_id)) {
            Entry::Occupied(existing) => {
                existing.remove();
                Ok(false)
            }
            Entry::Vacant(slot) => {
                slot.insert(self.next_id());
                Ok(true)
            }
        }
    }

    async fn like_count(&self, post_id: i64) -> Result<i64, StorageError> {
        Ok(self
            .likes
            .iter()
            .filter(|entry| entry.key().0 == post_id)
            .count() as i64)
    }

    async fn create_group(
        &self,
        name: String,
        description: Option<String>,
        image_url: Option<String>,
        is_private: bool,
    ) -> Result<Group, StorageError> {
        let group = Group {
            id: self.next_id(),
            name,
            description,
            image_url,
            is_private,
            created_at: Utc::now(),
        };
        self.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn groups(&self) -> Result<Vec<Group>, StorageError> {
        let mut groups: Vec<Group> = self.groups.iter().map(|g| g.clone()).collect();
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }

    async fn join_group(&self, user_id: i64, group_id: i64) -> Result<(), StorageError> {
        if !self.groups.contains_key(&group_id) {
            return Err(StorageError::NotFound("group"));
        }
        self.group_members.insert((user_id, group_id), false);
        Ok(())
    }

    async fn leave_group(&self, user_id: i64, group_id: i64) -> Result<(), StorageError> {
        self.group_members.remove(&(user_id, group_id));
        Ok(())
    }

    async fn create_badge(
        &self,
        name: String,
        description: String,
        image_url: String,
        requirement: String,
    ) -> Result<Badge, StorageError> {
        let badge = Badge {
            id: self.next_id(),
            name,
            description,
            image_url,
            requirement,
        };
        self.badges.insert(badge.id, badge.clone());
        Ok(badge)
    }

    async fn badges(&self) -> Result<Vec<Badge>, StorageError> {
        let mut badges: Vec<Badge> = self.badges.iter().map(|b| b.clone()).collect();
        badges.sort_by_key(|b| b.id);
        Ok(badges)
    }

    async fn user_badges(&self, user_id: i64) -> Result<Vec<Badge>, StorageError> {
        let mut badges: Vec<Badge> = self
            .user_badges
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .filter_map(|entry| self.badges.get(&entry.key().1).map(|b| b.clone()))
            .collect();
        badges.sort_by_key(|b| b.id);
        Ok(badges)
    }

    async fn award_badge(&self, user_id: i64, badge_id: i64) -> Result<(), StorageError> {
        if !self.users.contains_key(&user_id) {
            return Err(StorageError::NotFound("user"));
        }
        if !self.badges.contains_key(&badge_id) {
            return Err(StorageError::NotFound("badge"));
        }
        self.user_badges.insert((user_id, badge_id), Utc::now());
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<Category>, StorageError> {
        let mut categories: Vec<Category> = self.categories.iter().map(|c| c.clone()).collect();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn create_category(
        &self,
        name: String,
        kind: String,
        description: Option<String>,
    ) -> Result<Category, StorageError> {
        let category = Category {
            id: self.next_id(),
            name,
            kind,
            description,
        };
        self.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn create_story(
        &self,
        user_id: i64,
        content: String,
        image_url: Option<String>,
    ) -> Result<Story, StorageError> {
        let now = Utc::now();
        let story = Story {
            id: self.next_id(),
            user_id,
            content,
            image_url,
            expires_at: now + Duration::hours(STORY_TTL_HOURS),
            created_at: now,
        };
        self.stories.insert(story.id, story.clone());
        Ok(story)
    }

    async fn active_stories(&self) -> Result<Vec<Story>, StorageError> {
        let now = Utc::now();
        let mut stories: Vec<Story> = self
            .stories
            .iter()
            .filter(|s| s.expires_at > now)
            .map(|s| s.clone())
            .collect();
        stories.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(stories)
    }

    async fn record_story_view(&self, story_id: i64, user_id: i64) -> Result<(), StorageError> {
        if !self.stories.contains_key(&story_id) {
            return Err(StorageError::NotFound("story"));
        }
        // Repeat views by the same user collapse into one entry.
        self.story_views
            .entry((story_id, user_id))
            .or_insert_with(Utc::now);
        Ok(())
    }

    async fn story_view_count(&self, story_id: i64) -> Result<i64, StorageError> {
        Ok(self
            .story_views
            .iter()
            .filter(|entry| entry.key().0 == story_id)
            .count() as i64)
    }

    async fn create_message(
        &self,
        sender_id: i64,
        receiver_id: i64,
        content: String,
    ) -> Result<DirectMessage, StorageError> {
        if !self.users.contains_key(&receiver_id) {
            return Err(StorageError::NotFound("user"));
        }

        let message = DirectMessage {
            id: self.next_id(),
            sender_id,
            receiver_id,
            content,
            read: false,
            created_at: Utc::now(),
        };
        self.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn conversation(
        &self,
        user_a: i64,
        user_b: i64,
    ) -> Result<Vec<DirectMessage>, StorageError> {
        let mut messages: Vec<DirectMessage> = self
            .messages
            .iter()
            .filter(|m| {
                (m.sender_id == user_a && m.receiver_id == user_b)
                    || (m.sender_id == user_b && m.receiver_id == user_a)
            })
            .map(|m| m.clone())
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn mark_messages_read(
        &self,
        receiver_id: i64,
        sender_id: i64,
    ) -> Result<(), StorageError> {
        for mut entry in self.messages.iter_mut() {
            if entry.receiver_id == receiver_id && entry.sender_id == sender_id {
                entry.read = true;
            }
        }
        Ok(())
    }

    async fn create_notification(
        &self,
        user_id: i64,
        kind: &str,
        content: &str,
        related_id: i64,
    ) -> Result<Notification, StorageError> {
        let notification = Notification {
            id: self.next_id(),
            user_id,
            kind: kind.to_string(),
            content: content.to_string(),
            related_id,
            read: false,
            created_at: Utc::now(),
        };
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn notifications_for_user(
        &self,
        user_id: i64,
        before: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Notification>, StorageError> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| before.is_none_or(|b| n.id < b))
            .map(|n| n.clone())
            .collect();

        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        notifications.truncate(limit);
        Ok(notifications)
    }

    async fn mark_notification_read(&self, user_id: i64, id: i64) -> Result<(), StorageError> {
        if let Some(mut notification) = self.notifications.get_mut(&id) {
            if notification.user_id == user_id {
                notification.read = true;
            }
        }
        Ok(())
    }

    async fn delete_notification(&self, user_id: i64, id: i64) -> Result<(), StorageError> {
        self.notifications.remove_if(&id, |_, n| n.user_id == user_id);
        Ok(())
    }
}
