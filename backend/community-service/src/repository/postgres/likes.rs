use async_trait::async_trait;
use error_types::{ServiceError, ServiceResult};
use uuid::Uuid;

use super::notifications::insert_notification;
use super::PgStore;
use crate::models::PostLike;
use crate::repository::{LikeRepository, LikeState, LikeToggle, ToggleOutcome};

#[async_trait]
impl LikeRepository for PgStore {
    async fn toggle_like(&self, toggle: LikeToggle) -> ServiceResult<ToggleOutcome> {
        let mut tx = self.pool.begin().await?;

        // Serialise toggles on the same (post, user) pair; released at commit/rollback
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("like:{}:{}", toggle.post_id, toggle.user_id))
            .execute(&mut *tx)
            .await?;

        let post_exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR SHARE")
                .bind(toggle.post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if post_exists.is_none() {
            return Err(ServiceError::NotFound("Post not found".to_string()));
        }

        let removed = sqlx::query_as::<_, PostLike>(
            r#"
            DELETE FROM post_likes
            WHERE post_id = $1 AND user_id = $2
            RETURNING id, post_id, user_id, created_at
            "#,
        )
        .bind(toggle.post_id)
        .bind(toggle.user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (state, like, draft) = match removed {
            Some(like) => (LikeState::Unliked, like, toggle.on_unlike),
            None => {
                let like = sqlx::query_as::<_, PostLike>(
                    r#"
                    INSERT INTO post_likes (id, post_id, user_id, created_at)
                    VALUES ($1, $2, $3, NOW())
                    RETURNING id, post_id, user_id, created_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(toggle.post_id)
                .bind(toggle.user_id)
                .fetch_one(&mut *tx)
                .await?;
                (LikeState::Liked, like, toggle.on_like)
            }
        };

        let notification = match draft {
            Some(draft) => {
                let notification = draft.into_notification();
                insert_notification(&mut *tx, &notification).await?;
                Some(notification)
            }
            None => None,
        };

        tx.commit().await?;

        Ok(ToggleOutcome {
            state,
            like,
            notification,
        })
    }

    async fn likes_for_post(&self, post_id: Uuid) -> ServiceResult<Vec<PostLike>> {
        let likes = sqlx::query_as::<_, PostLike>(
            r#"
            SELECT id, post_id, user_id, created_at
            FROM post_likes
            WHERE post_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(likes)
    }
}
