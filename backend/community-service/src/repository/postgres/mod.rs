//! PostgreSQL-backed repositories
//!
//! Queries are built at runtime (`sqlx::query_as` with explicit binds). Multi-row
//! mutations run inside a transaction so a failure part-way leaves nothing behind.

mod comments;
mod likes;
mod notifications;
mod posts;
mod quizzes;
mod users;

use error_types::ServiceError;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-constraint violation to `Conflict`, everything else to `Database`
fn conflict_on_unique(err: sqlx::Error, message: &str) -> ServiceError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return ServiceError::Conflict(message.to_string());
        }
    }
    ServiceError::Database(err)
}

/// A text column held a value the enum does not know
fn corrupt_column(column: &str, err: String) -> ServiceError {
    ServiceError::Internal(format!("invalid {column} column: {err}"))
}
