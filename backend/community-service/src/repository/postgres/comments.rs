use async_trait::async_trait;
use error_types::{ServiceError, ServiceResult};
use uuid::Uuid;

use super::notifications::insert_notification;
use super::PgStore;
use crate::models::{Comment, NotificationDraft};
use crate::repository::CommentRepository;

#[async_trait]
impl CommentRepository for PgStore {
    async fn insert_comment(
        &self,
        comment: Comment,
        notification: Option<NotificationDraft>,
    ) -> ServiceResult<Comment> {
        let mut tx = self.pool.begin().await?;

        let post_exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR SHARE")
                .bind(comment.post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if post_exists.is_none() {
            return Err(ServiceError::NotFound("Post not found".to_string()));
        }

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO post_comments (id, post_id, user_id, text, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id, user_id, text, created_at
            "#,
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.user_id)
        .bind(&comment.text)
        .bind(comment.created_at)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(draft) = notification {
            insert_notification(&mut *tx, &draft.into_notification()).await?;
        }

        tx.commit().await?;
        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> ServiceResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, post_id, user_id, text, created_at FROM post_comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn comments_for_post(&self, post_id: Uuid) -> ServiceResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, user_id, text, created_at
            FROM post_comments
            WHERE post_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn delete_comment(&self, id: Uuid) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM post_comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
