use std::sync::Arc;

use chrono::{DateTime, Utc};
use error_types::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::comments::{with_authors, CommentView};
use super::feed::{annotate, FeedPost};
use super::{non_blank, require_account, require_admin};
use crate::models::{Post, PostEdit, PostFilter, UserSummary};
use crate::repository::{CommentRepository, PostRepository, Repositories, UserRepository};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LikeView {
    pub id: Uuid,
    pub user: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

/// Full post page: author, likers and comments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostDetails {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<UserSummary>,
    pub likes: Vec<LikeView>,
    pub like_count: usize,
    pub comments: Vec<CommentView>,
    pub comment_count: usize,
}

pub struct PostService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl PostService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
            posts: repos.posts.clone(),
            comments: repos.comments.clone(),
        }
    }

    pub async fn create_post(&self, actor_id: Uuid, input: PostInput) -> ServiceResult<Post> {
        require_admin(self.users.as_ref(), actor_id).await?;

        let (Some(title), Some(description)) =
            (non_blank(input.title), non_blank(input.description))
        else {
            return Err(ServiceError::Validation(
                "Title and description are required".to_string(),
            ));
        };

        let post = self
            .posts
            .insert_post(Post::new(actor_id, title, description, non_blank(input.image_url)))
            .await?;
        info!(post_id = %post.id, user_id = %actor_id, "Post created");
        Ok(post)
    }

    pub async fn get_post_details(&self, post_id: Uuid) -> ServiceResult<PostDetails> {
        let record = self
            .posts
            .find_record(post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Post not found".to_string()))?;

        let comments = self.comments.comments_for_post(post_id).await?;
        let comments = with_authors(self.users.as_ref(), comments).await?;

        let mut user_ids: Vec<Uuid> = record.likes.iter().map(|l| l.user_id).collect();
        user_ids.push(record.post.user_id);
        user_ids.sort_unstable();
        user_ids.dedup();
        let people = self.users.user_summaries(&user_ids).await?;

        let likes: Vec<LikeView> = record
            .likes
            .iter()
            .map(|like| LikeView {
                id: like.id,
                user: people.get(&like.user_id).cloned(),
                created_at: like.created_at,
            })
            .collect();

        Ok(PostDetails {
            author: people.get(&record.post.user_id).cloned(),
            like_count: likes.len(),
            likes,
            comment_count: comments.len(),
            comments,
            post: record.post,
        })
    }

    /// Blank fields are ignored
    pub async fn edit_post(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
        input: PostInput,
    ) -> ServiceResult<Post> {
        require_admin(self.users.as_ref(), actor_id).await?;

        let edit = PostEdit {
            title: non_blank(input.title),
            description: non_blank(input.description),
            image_url: non_blank(input.image_url),
        };
        let post = self
            .posts
            .update_content(post_id, edit)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Post not found".to_string()))?;

        info!(post_id = %post_id, "Post edited");
        Ok(post)
    }

    /// Owner or admin; likes and comments go with the post
    pub async fn delete_post(&self, actor_id: Uuid, post_id: Uuid) -> ServiceResult<()> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Post not found".to_string()))?;

        if post.user_id != actor_id {
            let actor = self.users.find_user(actor_id).await?;
            if !actor.is_some_and(|a| a.account_type.is_admin()) {
                return Err(ServiceError::Forbidden(
                    "You are not authorized to delete this post".to_string(),
                ));
            }
        }

        if !self.posts.delete_post_cascade(post_id).await? {
            return Err(ServiceError::NotFound("Post not found".to_string()));
        }
        info!(post_id = %post_id, user_id = %actor_id, "Post deleted");
        Ok(())
    }

    /// Every post not owned by the calling admin, newest first
    pub async fn list_all_posts(&self, actor_id: Uuid) -> ServiceResult<Vec<FeedPost>> {
        require_admin(self.users.as_ref(), actor_id).await?;

        let records = self
            .posts
            .load_records(PostFilter::NotOwnedBy(actor_id))
            .await?;
        annotate(self.users.as_ref(), records, actor_id).await
    }

    pub async fn list_my_posts(&self, actor_id: Uuid) -> ServiceResult<Vec<FeedPost>> {
        require_account(self.users.as_ref(), actor_id).await?;

        let records = self.posts.load_records(PostFilter::OwnedBy(actor_id)).await?;
        annotate(self.users.as_ref(), records, actor_id).await
    }

    pub async fn count_posts(&self, actor_id: Uuid) -> ServiceResult<i64> {
        require_admin(self.users.as_ref(), actor_id).await?;
        self.posts
            .count_posts(PostFilter::NotOwnedBy(actor_id))
            .await
    }

    pub async fn count_my_posts(&self, actor_id: Uuid) -> ServiceResult<i64> {
        self.posts.count_posts(PostFilter::OwnedBy(actor_id)).await
    }
}
