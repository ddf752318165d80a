use std::sync::Arc;

use chrono::Utc;
use error_types::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::engagement::draft_for_owner;
use super::require_account;
use crate::models::{Comment, NotificationType, UserSummary};
use crate::repository::{CommentRepository, PostRepository, Repositories, UserRepository};

/// A comment with its author snapshot (`None` once the account is deleted)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: Option<UserSummary>,
}

/// Attach author snapshots, keeping the input order
pub async fn with_authors(
    users: &dyn UserRepository,
    comments: Vec<Comment>,
) -> ServiceResult<Vec<CommentView>> {
    let mut author_ids: Vec<Uuid> = comments.iter().map(|c| c.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let authors = users.user_summaries(&author_ids).await?;

    Ok(comments
        .into_iter()
        .map(|comment| CommentView {
            author: authors.get(&comment.user_id).cloned(),
            comment,
        })
        .collect())
}

pub struct CommentService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    notify_self: bool,
}

impl CommentService {
    pub fn new(repos: &Repositories, notify_self: bool) -> Self {
        Self {
            users: repos.users.clone(),
            posts: repos.posts.clone(),
            comments: repos.comments.clone(),
            notify_self,
        }
    }

    pub async fn add_comment(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
        text: &str,
    ) -> ServiceResult<CommentView> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation(
                "Comment text is required".to_string(),
            ));
        }

        let actor = require_account(self.users.as_ref(), actor_id).await?;
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Post not found".to_string()))?;

        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            user_id: actor_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        let notification = draft_for_owner(
            &actor,
            &post,
            NotificationType::PostCommented,
            self.notify_self,
        );

        let comment = self.comments.insert_comment(comment, notification).await?;
        info!(comment_id = %comment.id, post_id = %post_id, "Comment added");

        Ok(CommentView {
            comment,
            author: Some(actor.summary()),
        })
    }

    /// Oldest first
    pub async fn list_comments(&self, post_id: Uuid) -> ServiceResult<Vec<CommentView>> {
        if self.posts.find_post(post_id).await?.is_none() {
            return Err(ServiceError::NotFound("Post not found".to_string()));
        }

        let comments = self.comments.comments_for_post(post_id).await?;
        with_authors(self.users.as_ref(), comments).await
    }

    /// Allowed for the comment's author or an admin
    pub async fn delete_comment(&self, actor_id: Uuid, comment_id: Uuid) -> ServiceResult<()> {
        let comment = self
            .comments
            .find_comment(comment_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Comment not found".to_string()))?;

        if comment.user_id != actor_id {
            let actor = self.users.find_user(actor_id).await?;
            if !actor.is_some_and(|a| a.account_type.is_admin()) {
                return Err(ServiceError::Forbidden(
                    "You can only delete your own comments".to_string(),
                ));
            }
        }

        if !self.comments.delete_comment(comment_id).await? {
            return Err(ServiceError::NotFound("Comment not found".to_string()));
        }
        info!(comment_id = %comment_id, "Comment deleted");
        Ok(())
    }
}
