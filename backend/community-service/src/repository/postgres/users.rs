use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_types::{ServiceError, ServiceResult};
use uuid::Uuid;

use super::{conflict_on_unique, corrupt_column, PgStore};
use crate::models::{ProfileUpdate, User, UserCascade, UserSummary};
use crate::repository::UserRepository;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    account_type: String,
    image_url: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = ServiceError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: row.password_hash,
            account_type: row
                .account_type
                .parse()
                .map_err(|e| corrupt_column("account_type", e))?,
            image_url: row.image_url,
            phone: row.phone,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: User) -> ServiceResult<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, password_hash,
                               account_type, image_url, phone, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.account_type.as_str())
        .bind(&user.image_url)
        .bind(&user.phone)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "User with this email already exists"))?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, account_type,
                   image_url, phone, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, account_type,
                   image_url, phone, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn user_summaries(&self, ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, UserSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, account_type,
                   image_url, phone, created_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| User::try_from(row).map(|user| (user.id, user.summary())))
            .collect()
    }

    async fn list_users_except(&self, id: Uuid) -> ServiceResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, first_name, last_name, email, password_hash, account_type,
                   image_url, phone, created_at
            FROM users
            WHERE id <> $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn count_users_except(&self, id: Uuid) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id <> $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> ServiceResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                image_url = COALESCE($4, image_url),
                phone = COALESCE($5, phone)
            WHERE id = $1
            RETURNING id, first_name, last_name, email, password_hash, account_type,
                      image_url, phone, created_at
            "#,
        )
        .bind(id)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.image_url)
        .bind(update.phone)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn delete_user_cascade(&self, id: Uuid) -> ServiceResult<Option<UserCascade>> {
        let mut tx = self.pool.begin().await?;

        // Row lock blocks concurrent likes/comments from this account until commit
        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let likes_removed = sqlx::query("DELETE FROM post_likes WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let comments_removed = sqlx::query("DELETE FROM post_comments WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let notifications_removed =
            sqlx::query("DELETE FROM notifications WHERE recipient_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(UserCascade {
            likes_removed,
            comments_removed,
            notifications_removed,
        }))
    }
}
