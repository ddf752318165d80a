use std::collections::HashMap;

use async_trait::async_trait;
use error_types::{ServiceError, ServiceResult};
use uuid::Uuid;

use super::PgStore;
use crate::models::{PinnedRank, Post, PostEdit, PostFilter, PostFlagsUpdate, PostLike, PostRecord};
use crate::repository::PostRepository;

/// `(owned_by, not_owned_by)` binds for the listing queries
fn owner_binds(filter: PostFilter) -> (Option<Uuid>, Option<Uuid>) {
    match filter {
        PostFilter::All => (None, None),
        PostFilter::OwnedBy(id) => (Some(id), None),
        PostFilter::NotOwnedBy(id) => (None, Some(id)),
    }
}

#[derive(sqlx::FromRow)]
struct CommentRef {
    id: Uuid,
    post_id: Uuid,
}

impl PgStore {
    /// Attach like records and comment ids to a page of posts, keeping their order
    async fn with_engagement(&self, posts: Vec<Post>) -> ServiceResult<Vec<PostRecord>> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

        let likes = sqlx::query_as::<_, PostLike>(
            r#"
            SELECT id, post_id, user_id, created_at
            FROM post_likes
            WHERE post_id = ANY($1)
            ORDER BY created_at, id
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let comments = sqlx::query_as::<_, CommentRef>(
            r#"
            SELECT id, post_id
            FROM post_comments
            WHERE post_id = ANY($1)
            ORDER BY created_at, id
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut likes_by_post: HashMap<Uuid, Vec<PostLike>> = HashMap::new();
        for like in likes {
            likes_by_post.entry(like.post_id).or_default().push(like);
        }
        let mut comments_by_post: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for comment in comments {
            comments_by_post
                .entry(comment.post_id)
                .or_default()
                .push(comment.id);
        }

        Ok(posts
            .into_iter()
            .map(|post| PostRecord {
                likes: likes_by_post.remove(&post.id).unwrap_or_default(),
                comment_ids: comments_by_post.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }
}

#[async_trait]
impl PostRepository for PgStore {
    async fn insert_post(&self, post: Post) -> ServiceResult<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, title, description, image_url, user_id, is_pinned,
                               is_boosted, pinned_rank, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, title, description, image_url, user_id, is_pinned, is_boosted,
                      pinned_rank, created_at, updated_at
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.image_url)
        .bind(post.user_id)
        .bind(post.is_pinned)
        .bind(post.is_boosted)
        .bind(post.pinned_rank)
        .bind(post.created_at)
        .bind(post.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> ServiceResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, description, image_url, user_id, is_pinned, is_boosted,
                   pinned_rank, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_record(&self, id: Uuid) -> ServiceResult<Option<PostRecord>> {
        let Some(post) = self.find_post(id).await? else {
            return Ok(None);
        };
        Ok(self.with_engagement(vec![post]).await?.pop())
    }

    async fn load_records(&self, filter: PostFilter) -> ServiceResult<Vec<PostRecord>> {
        let (owned_by, not_owned_by) = owner_binds(filter);
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, description, image_url, user_id, is_pinned, is_boosted,
                   pinned_rank, created_at, updated_at
            FROM posts
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR user_id <> $2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owned_by)
        .bind(not_owned_by)
        .fetch_all(&self.pool)
        .await?;

        self.with_engagement(posts).await
    }

    async fn sample_records(&self, limit: i64) -> ServiceResult<Vec<PostRecord>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, description, image_url, user_id, is_pinned, is_boosted,
                   pinned_rank, created_at, updated_at
            FROM posts
            ORDER BY random()
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.with_engagement(posts).await
    }

    async fn count_posts(&self, filter: PostFilter) -> ServiceResult<i64> {
        let (owned_by, not_owned_by) = owner_binds(filter);
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM posts
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::uuid IS NULL OR user_id <> $2)
            "#,
        )
        .bind(owned_by)
        .bind(not_owned_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update_content(&self, id: Uuid, edit: PostEdit) -> ServiceResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                image_url = COALESCE($4, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, image_url, user_id, is_pinned, is_boosted,
                      pinned_rank, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(edit.title)
        .bind(edit.description)
        .bind(edit.image_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn update_flags(
        &self,
        id: Uuid,
        flags: PostFlagsUpdate,
    ) -> ServiceResult<Option<Post>> {
        if flags.is_empty() {
            return self.find_post(id).await;
        }

        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET is_pinned = COALESCE($2, is_pinned),
                is_boosted = COALESCE($3, is_boosted),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, image_url, user_id, is_pinned, is_boosted,
                      pinned_rank, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(flags.is_pinned)
        .bind(flags.is_boosted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn update_pinned_ranks(&self, ranks: &[PinnedRank]) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;

        for entry in ranks {
            let updated = sqlx::query(
                "UPDATE posts SET pinned_rank = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(entry.post_id)
            .bind(entry.rank)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                // Dropping the transaction rolls back the ranks written so far
                return Err(ServiceError::NotFound(format!(
                    "Post {} not found",
                    entry.post_id
                )));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_post_cascade(&self, id: Uuid) -> ServiceResult<bool> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM post_likes WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM post_comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
