use std::sync::Arc;

use error_types::{ServiceError, ServiceResult};
use tracing::info;
use uuid::Uuid;

use crate::models::{NotificationDraft, NotificationType, Post, ReferenceModel, User};
use crate::repository::{
    LikeRepository, LikeState, LikeToggle, PostRepository, Repositories, ToggleOutcome,
    UserRepository,
};

/// Human-readable line shown to the post owner
pub fn engagement_message(actor: &User, kind: NotificationType) -> String {
    let action = match kind {
        NotificationType::PostLiked => "liked",
        NotificationType::PostUnliked => "unliked",
        NotificationType::PostCommented => "commented on",
    };
    format!("{} {} your post.", actor.display_name(), action)
}

/// Draft a notification to the owner of `post`, or `None` for a suppressed
/// self-notification
pub fn draft_for_owner(
    actor: &User,
    post: &Post,
    kind: NotificationType,
    notify_self: bool,
) -> Option<NotificationDraft> {
    if post.user_id == actor.id && !notify_self {
        return None;
    }

    Some(NotificationDraft {
        recipient_id: post.user_id,
        sender_id: actor.id,
        notification_type: kind,
        message: engagement_message(actor, kind),
        reference_id: post.id,
        reference_model: ReferenceModel::Post,
    })
}

pub struct EngagementService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    likes: Arc<dyn LikeRepository>,
    notify_self: bool,
}

impl EngagementService {
    pub fn new(repos: &Repositories, notify_self: bool) -> Self {
        Self {
            users: repos.users.clone(),
            posts: repos.posts.clone(),
            likes: repos.likes.clone(),
            notify_self,
        }
    }

    /// Like the post if the actor has not, unlike it otherwise. The like record and
    /// the owner's notification are written as one unit.
    pub async fn toggle_like(&self, post_id: Uuid, actor_id: Uuid) -> ServiceResult<ToggleOutcome> {
        let actor = self
            .users
            .find_user(actor_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Post not found".to_string()))?;

        let toggle = LikeToggle {
            post_id,
            user_id: actor_id,
            on_like: draft_for_owner(&actor, &post, NotificationType::PostLiked, self.notify_self),
            on_unlike: draft_for_owner(
                &actor,
                &post,
                NotificationType::PostUnliked,
                self.notify_self,
            ),
        };

        let outcome = self.likes.toggle_like(toggle).await?;
        info!(
            post_id = %post_id,
            user_id = %actor_id,
            liked = outcome.state == LikeState::Liked,
            notified = outcome.notification.is_some(),
            "Like toggled"
        );
        Ok(outcome)
    }
}
