use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity with its admin-curated ranking flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    /// Owning user, fixed at creation
    pub user_id: Uuid,
    pub is_pinned: bool,
    pub is_boosted: bool,
    /// Only meaningful while `is_pinned`; rank 1 sorts first
    pub pinned_rank: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(
        user_id: Uuid,
        title: String,
        description: String,
        image_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            image_url,
            user_id,
            is_pinned: false,
            is_boosted: false,
            pinned_rank: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Like record - at most one per (post, user)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostLike {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A post with its like-set and comment-set back-references
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub post: Post,
    pub likes: Vec<PostLike>,
    pub comment_ids: Vec<Uuid>,
}

impl PostRecord {
    pub fn liked_by(&self, user_id: Uuid) -> bool {
        self.likes.iter().any(|like| like.user_id == user_id)
    }
}

/// Which posts a listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    OwnedBy(Uuid),
    NotOwnedBy(Uuid),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::OwnedBy(owner) => post.user_id == *owner,
            PostFilter::NotOwnedBy(owner) => post.user_id != *owner,
        }
    }
}

/// Partial pin/boost update
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostFlagsUpdate {
    pub is_pinned: Option<bool>,
    pub is_boosted: Option<bool>,
}

impl PostFlagsUpdate {
    pub fn is_empty(&self) -> bool {
        self.is_pinned.is_none() && self.is_boosted.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PinnedRank {
    pub post_id: Uuid,
    pub rank: i32,
}

/// Partial content edit; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}
