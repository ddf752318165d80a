use std::collections::HashSet;
use std::sync::Arc;

use error_types::{ServiceError, ServiceResult};
use tracing::info;
use uuid::Uuid;

use super::require_admin;
use crate::models::{PinnedRank, Post, PostFlagsUpdate};
use crate::repository::{PostRepository, Repositories, UserRepository};

/// Reject empty lists, repeated posts and negative ranks
///
/// Ranks may repeat and need not be contiguous.
pub fn validate_ranking(ranked: &[PinnedRank]) -> ServiceResult<()> {
    if ranked.is_empty() {
        return Err(ServiceError::Validation(
            "Invalid pinned post data".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(ranked.len());
    for entry in ranked {
        if entry.rank < 0 {
            return Err(ServiceError::Validation(format!(
                "Invalid rank {} for post {}",
                entry.rank, entry.post_id
            )));
        }
        if !seen.insert(entry.post_id) {
            return Err(ServiceError::Validation(format!(
                "Post {} is listed more than once",
                entry.post_id
            )));
        }
    }
    Ok(())
}

/// Admin-only pin/boost flags and manual pinned order
pub struct CurationService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CurationService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
            posts: repos.posts.clone(),
        }
    }

    /// Partial update; supplying neither flag returns the post unchanged
    pub async fn set_post_flags(
        &self,
        actor_id: Uuid,
        post_id: Uuid,
        flags: PostFlagsUpdate,
    ) -> ServiceResult<Post> {
        require_admin(self.users.as_ref(), actor_id).await?;

        let post = self
            .posts
            .update_flags(post_id, flags)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Post not found".to_string()))?;

        info!(
            post_id = %post_id,
            is_pinned = post.is_pinned,
            is_boosted = post.is_boosted,
            "Post flags updated"
        );
        Ok(post)
    }

    pub async fn reorder_pinned(&self, actor_id: Uuid, ranked: &[PinnedRank]) -> ServiceResult<()> {
        require_admin(self.users.as_ref(), actor_id).await?;
        validate_ranking(ranked)?;

        self.posts.update_pinned_ranks(ranked).await?;
        info!(count = ranked.len(), "Pinned order updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rank: i32) -> PinnedRank {
        PinnedRank {
            post_id: Uuid::new_v4(),
            rank,
        }
    }

    #[test]
    fn test_empty_ranking_rejected() {
        let err = validate_ranking(&[]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid pinned post data");
    }

    #[test]
    fn test_duplicate_post_rejected() {
        let a = entry(1);
        let err = validate_ranking(&[a, PinnedRank { rank: 2, ..a }]).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_negative_rank_rejected() {
        assert!(validate_ranking(&[entry(-1)]).is_err());
    }

    #[test]
    fn test_repeated_and_sparse_ranks_allowed() {
        assert!(validate_ranking(&[entry(1), entry(1), entry(7)]).is_ok());
    }
}
