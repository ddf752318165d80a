use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use error_types::{ServiceError, ServiceResult};
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::r#trait::{
    CommentRepository, LikeRepository, LikeState, LikeToggle, NotificationRepository,
    PostRepository, QuizRepository, ToggleOutcome, UserRepository,
};
use crate::models::{
    Comment, Notification, NotificationDraft, PinnedRank, Post, PostEdit, PostFilter,
    PostFlagsUpdate, PostLike, PostRecord, ProfileUpdate, Quiz, QuizUpdate, User, UserCascade,
    UserSummary,
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    likes: HashMap<Uuid, PostLike>,
    comments: HashMap<Uuid, Comment>,
    /// Append order
    notifications: Vec<Notification>,
    quizzes: HashMap<Uuid, Quiz>,
}

impl MemoryState {
    fn record(&self, post: &Post) -> PostRecord {
        let mut likes: Vec<PostLike> = self
            .likes
            .values()
            .filter(|like| like.post_id == post.id)
            .copied()
            .collect();
        likes.sort_by_key(|like| (like.created_at, like.id));

        let mut comments: Vec<&Comment> = self
            .comments
            .values()
            .filter(|comment| comment.post_id == post.id)
            .collect();
        comments.sort_by_key(|comment| (comment.created_at, comment.id));

        PostRecord {
            post: post.clone(),
            likes,
            comment_ids: comments.into_iter().map(|comment| comment.id).collect(),
        }
    }

    fn push_notification(&mut self, draft: Option<NotificationDraft>) -> Option<Notification> {
        let notification = draft?.into_notification();
        self.notifications.push(notification.clone());
        Some(notification)
    }
}

/// Volatile store holding every collection behind one lock
///
/// The single mutex makes each operation atomic, which gives the like toggle and
/// the cascades the same all-or-nothing behaviour as the Postgres transactions.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: User) -> ServiceResult<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(ServiceError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_summaries(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, UserSummary>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .map(|user| (user.id, user.summary()))
            .collect())
    }

    async fn list_users_except(&self, id: Uuid) -> ServiceResult<Vec<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.id != id)
            .cloned()
            .collect();
        newest_first(&mut users, |u| (u.created_at, u.id));
        Ok(users)
    }

    async fn count_users_except(&self, id: Uuid) -> ServiceResult<i64> {
        let state = self.state.lock().await;
        Ok(state.users.keys().filter(|k| **k != id).count() as i64)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> ServiceResult<Option<User>> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        if let Some(image_url) = update.image_url {
            user.image_url = Some(image_url);
        }
        if let Some(phone) = update.phone {
            user.phone = Some(phone);
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user_cascade(&self, id: Uuid) -> ServiceResult<Option<UserCascade>> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&id) {
            return Ok(None);
        }

        let likes_before = state.likes.len();
        state.likes.retain(|_, like| like.user_id != id);
        let comments_before = state.comments.len();
        state.comments.retain(|_, comment| comment.user_id != id);
        let notifications_before = state.notifications.len();
        state.notifications.retain(|n| n.recipient_id != id);
        state.users.remove(&id);

        Ok(Some(UserCascade {
            likes_removed: (likes_before - state.likes.len()) as u64,
            comments_removed: (comments_before - state.comments.len()) as u64,
            notifications_removed: (notifications_before - state.notifications.len()) as u64,
        }))
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert_post(&self, post: Post) -> ServiceResult<Post> {
        self.state.lock().await.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> ServiceResult<Option<Post>> {
        Ok(self.state.lock().await.posts.get(&id).cloned())
    }

    async fn find_record(&self, id: Uuid) -> ServiceResult<Option<PostRecord>> {
        let state = self.state.lock().await;
        Ok(state.posts.get(&id).map(|post| state.record(post)))
    }

    async fn load_records(&self, filter: PostFilter) -> ServiceResult<Vec<PostRecord>> {
        let state = self.state.lock().await;
        let mut records: Vec<PostRecord> = state
            .posts
            .values()
            .filter(|post| filter.matches(post))
            .map(|post| state.record(post))
            .collect();
        newest_first(&mut records, |r| (r.post.created_at, r.post.id));
        Ok(records)
    }

    async fn sample_records(&self, limit: i64) -> ServiceResult<Vec<PostRecord>> {
        let state = self.state.lock().await;
        let posts: Vec<&Post> = state.posts.values().collect();
        let picked: Vec<&Post> = {
            let mut rng = rand::thread_rng();
            posts
                .choose_multiple(&mut rng, limit.max(0) as usize)
                .copied()
                .collect()
        };
        Ok(picked.into_iter().map(|post| state.record(post)).collect())
    }

    async fn count_posts(&self, filter: PostFilter) -> ServiceResult<i64> {
        let state = self.state.lock().await;
        Ok(state.posts.values().filter(|p| filter.matches(p)).count() as i64)
    }

    async fn update_content(&self, id: Uuid, edit: PostEdit) -> ServiceResult<Option<Post>> {
        let mut state = self.state.lock().await;
        let Some(post) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = edit.title {
            post.title = title;
        }
        if let Some(description) = edit.description {
            post.description = description;
        }
        if let Some(image_url) = edit.image_url {
            post.image_url = Some(image_url);
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn update_flags(
        &self,
        id: Uuid,
        flags: PostFlagsUpdate,
    ) -> ServiceResult<Option<Post>> {
        let mut state = self.state.lock().await;
        let Some(post) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(is_pinned) = flags.is_pinned {
            post.is_pinned = is_pinned;
        }
        if let Some(is_boosted) = flags.is_boosted {
            post.is_boosted = is_boosted;
        }
        if !flags.is_empty() {
            post.updated_at = Utc::now();
        }
        Ok(Some(post.clone()))
    }

    async fn update_pinned_ranks(&self, ranks: &[PinnedRank]) -> ServiceResult<()> {
        let mut state = self.state.lock().await;
        if let Some(missing) = ranks.iter().find(|r| !state.posts.contains_key(&r.post_id)) {
            return Err(ServiceError::NotFound(format!(
                "Post {} not found",
                missing.post_id
            )));
        }

        let now = Utc::now();
        for entry in ranks {
            if let Some(post) = state.posts.get_mut(&entry.post_id) {
                post.pinned_rank = entry.rank;
                post.updated_at = now;
            }
        }
        Ok(())
    }

    async fn delete_post_cascade(&self, id: Uuid) -> ServiceResult<bool> {
        let mut state = self.state.lock().await;
        if state.posts.remove(&id).is_none() {
            return Ok(false);
        }
        state.likes.retain(|_, like| like.post_id != id);
        state.comments.retain(|_, comment| comment.post_id != id);
        Ok(true)
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn toggle_like(&self, toggle: LikeToggle) -> ServiceResult<ToggleOutcome> {
        let mut state = self.state.lock().await;
        if !state.posts.contains_key(&toggle.post_id) {
            return Err(ServiceError::NotFound("Post not found".to_string()));
        }

        let existing = state
            .likes
            .values()
            .find(|like| like.post_id == toggle.post_id && like.user_id == toggle.user_id)
            .copied();

        let (state_after, like, draft) = match existing {
            Some(like) => {
                state.likes.remove(&like.id);
                (LikeState::Unliked, like, toggle.on_unlike)
            }
            None => {
                let like = PostLike {
                    id: Uuid::new_v4(),
                    post_id: toggle.post_id,
                    user_id: toggle.user_id,
                    created_at: Utc::now(),
                };
                state.likes.insert(like.id, like);
                (LikeState::Liked, like, toggle.on_like)
            }
        };

        let notification = state.push_notification(draft);
        Ok(ToggleOutcome {
            state: state_after,
            like,
            notification,
        })
    }

    async fn likes_for_post(&self, post_id: Uuid) -> ServiceResult<Vec<PostLike>> {
        let state = self.state.lock().await;
        let mut likes: Vec<PostLike> = state
            .likes
            .values()
            .filter(|like| like.post_id == post_id)
            .copied()
            .collect();
        likes.sort_by_key(|like| (like.created_at, like.id));
        Ok(likes)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn insert_comment(
        &self,
        comment: Comment,
        notification: Option<NotificationDraft>,
    ) -> ServiceResult<Comment> {
        let mut state = self.state.lock().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(ServiceError::NotFound("Post not found".to_string()));
        }
        state.comments.insert(comment.id, comment.clone());
        state.push_notification(notification);
        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> ServiceResult<Option<Comment>> {
        Ok(self.state.lock().await.comments.get(&id).cloned())
    }

    async fn comments_for_post(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>> {
        let state = self.state.lock().await;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn delete_comment(&self, id: Uuid) -> ServiceResult<bool> {
        Ok(self.state.lock().await.comments.remove(&id).is_some())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn notifications_for(
        &self,
        recipient_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> ServiceResult<Vec<Notification>> {
        let state = self.state.lock().await;
        // Reverse append order first so equal timestamps keep newest-first
        let mut mine: Vec<Notification> = state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(mine
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_for(&self, recipient_id: Uuid) -> ServiceResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .count() as i64)
    }

    async fn count_unread(&self, recipient_id: Uuid) -> ServiceResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> ServiceResult<u64> {
        let mut state = self.state.lock().await;
        let mut flipped = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
        {
            n.is_read = true;
            flipped += 1;
        }
        Ok(flipped)
    }
}

#[async_trait]
impl QuizRepository for MemoryStore {
    async fn insert_quiz(&self, quiz: Quiz) -> ServiceResult<Quiz> {
        self.state.lock().await.quizzes.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    async fn list_quizzes(&self) -> ServiceResult<Vec<Quiz>> {
        let state = self.state.lock().await;
        let mut quizzes: Vec<Quiz> = state.quizzes.values().cloned().collect();
        newest_first(&mut quizzes, |q| (q.created_at, q.id));
        Ok(quizzes)
    }

    async fn find_quiz(&self, id: Uuid) -> ServiceResult<Option<Quiz>> {
        Ok(self.state.lock().await.quizzes.get(&id).cloned())
    }

    async fn update_quiz(&self, id: Uuid, update: QuizUpdate) -> ServiceResult<Option<Quiz>> {
        let mut state = self.state.lock().await;
        let Some(quiz) = state.quizzes.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            quiz.title = title;
        }
        if let Some(questions) = update.questions {
            quiz.questions = questions;
        }
        quiz.updated_at = Utc::now();
        Ok(Some(quiz.clone()))
    }

    async fn delete_quiz(&self, id: Uuid) -> ServiceResult<bool> {
        Ok(self.state.lock().await.quizzes.remove(&id).is_some())
    }
}
