//! Storage layer
//!
//! Services only see the traits in [`r#trait`]; `PgStore` backs production and
//! `MemoryStore` backs tests and `storage.backend = memory`.

mod memory;
mod postgres;
mod r#trait;

use std::sync::Arc;

use sqlx::PgPool;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use r#trait::{
    CommentRepository, LikeRepository, LikeState, LikeToggle, NotificationRepository,
    PostRepository, QuizRepository, ToggleOutcome, UserRepository,
};

/// One handle per repository trait, all backed by the same store
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + PostRepository
            + LikeRepository
            + CommentRepository
            + NotificationRepository
            + QuizRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            posts: store.clone(),
            likes: store.clone(),
            comments: store.clone(),
            notifications: store.clone(),
            quizzes: store,
        }
    }
}
