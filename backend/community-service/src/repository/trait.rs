use std::collections::HashMap;

use error_types::ServiceResult;
use uuid::Uuid;

use crate::models::{
    Comment, Notification, NotificationDraft, PinnedRank, Post, PostEdit, PostFilter,
    PostFlagsUpdate, PostLike, PostRecord, ProfileUpdate, Quiz, QuizUpdate, User, UserCascade,
    UserSummary,
};

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the e-mail is already registered
    async fn insert_user(&self, user: User) -> ServiceResult<User>;

    async fn find_user(&self, id: Uuid) -> ServiceResult<Option<User>>;

    /// E-mails are stored lowercase; callers pass a normalised address
    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>>;

    /// Display snapshots for the accounts that still exist; missing ids are absent
    async fn user_summaries(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, UserSummary>>;

    /// Every account except `id`, newest first
    async fn list_users_except(&self, id: Uuid) -> ServiceResult<Vec<User>>;

    async fn count_users_except(&self, id: Uuid) -> ServiceResult<i64>;

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate)
        -> ServiceResult<Option<User>>;

    /// Remove the account with its likes, comments and received notifications in
    /// one unit. Returns `None` when the account does not exist.
    async fn delete_user_cascade(&self, id: Uuid) -> ServiceResult<Option<UserCascade>>;
}

#[async_trait::async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert_post(&self, post: Post) -> ServiceResult<Post>;

    async fn find_post(&self, id: Uuid) -> ServiceResult<Option<Post>>;

    async fn find_record(&self, id: Uuid) -> ServiceResult<Option<PostRecord>>;

    /// Posts matching `filter` with their engagement, newest first
    async fn load_records(&self, filter: PostFilter) -> ServiceResult<Vec<PostRecord>>;

    /// Uniform random sample of at most `limit` posts, in no particular order
    async fn sample_records(&self, limit: i64) -> ServiceResult<Vec<PostRecord>>;

    async fn count_posts(&self, filter: PostFilter) -> ServiceResult<i64>;

    async fn update_content(&self, id: Uuid, edit: PostEdit) -> ServiceResult<Option<Post>>;

    /// Only the supplied flags change
    async fn update_flags(&self, id: Uuid, flags: PostFlagsUpdate)
        -> ServiceResult<Option<Post>>;

    /// All-or-nothing: a missing post fails with `NotFound` and no rank is written
    async fn update_pinned_ranks(&self, ranks: &[PinnedRank]) -> ServiceResult<()>;

    /// Remove the post with its likes and comments. `false` when absent.
    async fn delete_post_cascade(&self, id: Uuid) -> ServiceResult<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Liked,
    Unliked,
}

/// A like toggle together with the notification to write for either outcome
#[derive(Debug, Clone)]
pub struct LikeToggle {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub on_like: Option<NotificationDraft>,
    pub on_unlike: Option<NotificationDraft>,
}

#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub state: LikeState,
    /// The created or removed like record
    pub like: PostLike,
    pub notification: Option<Notification>,
}

#[async_trait::async_trait]
pub trait LikeRepository: Send + Sync {
    /// Flip the (post, user) like and write the matching notification as one
    /// unit, serialised per pair. Fails with `NotFound` when the post is gone.
    async fn toggle_like(&self, toggle: LikeToggle) -> ServiceResult<ToggleOutcome>;

    async fn likes_for_post(&self, post_id: Uuid) -> ServiceResult<Vec<PostLike>>;
}

#[async_trait::async_trait]
pub trait CommentRepository: Send + Sync {
    /// Stores the comment and the optional notification together. Fails with
    /// `NotFound` when the post is gone.
    async fn insert_comment(
        &self,
        comment: Comment,
        notification: Option<NotificationDraft>,
    ) -> ServiceResult<Comment>;

    async fn find_comment(&self, id: Uuid) -> ServiceResult<Option<Comment>>;

    /// Oldest first
    async fn comments_for_post(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>>;

    async fn delete_comment(&self, id: Uuid) -> ServiceResult<bool>;
}

#[async_trait::async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Newest first
    async fn notifications_for(
        &self,
        recipient_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> ServiceResult<Vec<Notification>>;

    async fn count_for(&self, recipient_id: Uuid) -> ServiceResult<i64>;

    async fn count_unread(&self, recipient_id: Uuid) -> ServiceResult<i64>;

    /// Returns how many notifications flipped to read
    async fn mark_all_read(&self, recipient_id: Uuid) -> ServiceResult<u64>;
}

#[async_trait::async_trait]
pub trait QuizRepository: Send + Sync {
    async fn insert_quiz(&self, quiz: Quiz) -> ServiceResult<Quiz>;

    /// Newest first
    async fn list_quizzes(&self) -> ServiceResult<Vec<Quiz>>;

    async fn find_quiz(&self, id: Uuid) -> ServiceResult<Option<Quiz>>;

    async fn update_quiz(&self, id: Uuid, update: QuizUpdate) -> ServiceResult<Option<Quiz>>;

    async fn delete_quiz(&self, id: Uuid) -> ServiceResult<bool>;
}
