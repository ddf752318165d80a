//! Feed ranking and the explore sample
//!
//! The ranked feed orders every post in four tiers:
//! - pinned and boosted, newest first
//! - pinned only, by admin-assigned `pinnedRank` (ascending), then newest first
//! - boosted only, newest first
//! - everything else, newest first
//!
//! Explore is a different contract: a uniform random sample decides which posts are
//! returned, and only the returned sample is sorted newest first.

use std::cmp::Ordering;
use std::sync::Arc;

use error_types::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::models::{Post, PostFilter, PostRecord, UserSummary};
use crate::repository::{PostRepository, Repositories, UserRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FeedTier {
    PinnedAndBoosted,
    Pinned,
    Boosted,
    Normal,
}

impl FeedTier {
    pub fn of(post: &Post) -> Self {
        match (post.is_pinned, post.is_boosted) {
            (true, true) => FeedTier::PinnedAndBoosted,
            (true, false) => FeedTier::Pinned,
            (false, true) => FeedTier::Boosted,
            (false, false) => FeedTier::Normal,
        }
    }
}

/// Total display order; the post id breaks any remaining tie
fn feed_order(a: &Post, b: &Post) -> Ordering {
    let tier = FeedTier::of(a);
    tier.cmp(&FeedTier::of(b))
        .then_with(|| match tier {
            FeedTier::Pinned => a.pinned_rank.cmp(&b.pinned_rank),
            _ => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn rank_feed(mut records: Vec<PostRecord>) -> Vec<PostRecord> {
    records.sort_by(|a, b| feed_order(&a.post, &b.post));
    debug!("Ranked {} posts for the feed", records.len());
    records
}

/// A post as shown in feeds and listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<UserSummary>,
    /// Like-record ids
    pub likes: Vec<Uuid>,
    pub like_count: usize,
    /// Comment ids
    pub comments: Vec<Uuid>,
    pub comment_count: usize,
    pub user_has_liked: bool,
}

/// Resolve authors and the viewer's like flag, keeping the input order
pub async fn annotate(
    users: &dyn UserRepository,
    records: Vec<PostRecord>,
    viewer: Uuid,
) -> ServiceResult<Vec<FeedPost>> {
    let mut author_ids: Vec<Uuid> = records.iter().map(|r| r.post.user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let authors = users.user_summaries(&author_ids).await?;

    Ok(records
        .into_iter()
        .map(|record| {
            let user_has_liked = record.liked_by(viewer);
            let likes: Vec<Uuid> = record.likes.iter().map(|like| like.id).collect();
            FeedPost {
                author: authors.get(&record.post.user_id).cloned(),
                like_count: likes.len(),
                likes,
                comment_count: record.comment_ids.len(),
                comments: record.comment_ids,
                user_has_liked,
                post: record.post,
            }
        })
        .collect())
}

pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    explore_default_limit: i64,
    explore_max_limit: i64,
}

impl FeedService {
    pub fn new(repos: &Repositories, config: &FeedConfig) -> Self {
        Self {
            posts: repos.posts.clone(),
            users: repos.users.clone(),
            explore_default_limit: config.explore_default_limit,
            explore_max_limit: config.explore_max_limit,
        }
    }

    /// Every post in display order. An empty store is `NotFound`, not a fault.
    pub async fn feed(&self, viewer: Uuid) -> ServiceResult<Vec<FeedPost>> {
        let records = self.posts.load_records(PostFilter::All).await?;
        if records.is_empty() {
            return Err(ServiceError::NotFound("No posts found".to_string()));
        }

        annotate(self.users.as_ref(), rank_feed(records), viewer).await
    }

    pub async fn explore(&self, viewer: Uuid, limit: Option<i64>) -> ServiceResult<Vec<FeedPost>> {
        let limit = limit.unwrap_or(self.explore_default_limit);
        if limit < 1 {
            return Err(ServiceError::Validation(
                "limit must be a positive integer".to_string(),
            ));
        }
        let limit = limit.min(self.explore_max_limit);

        let mut records = self.posts.sample_records(limit).await?;
        if records.is_empty() {
            return Err(ServiceError::NotFound("No posts found".to_string()));
        }
        records.sort_by(|a, b| {
            b.post
                .created_at
                .cmp(&a.post.created_at)
                .then_with(|| a.post.id.cmp(&b.post.id))
        });
        debug!(limit, sampled = records.len(), "Explore sample drawn");

        annotate(self.users.as_ref(), records, viewer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostLike;
    use chrono::{Duration, Utc};

    fn post(age_minutes: i64, pinned: bool, boosted: bool, rank: i32) -> PostRecord {
        let mut post = Post::new(Uuid::new_v4(), "t".into(), "d".into(), None);
        post.created_at = Utc::now() - Duration::minutes(age_minutes);
        post.is_pinned = pinned;
        post.is_boosted = boosted;
        post.pinned_rank = rank;
        PostRecord {
            post,
            likes: Vec::new(),
            comment_ids: Vec::new(),
        }
    }

    fn ids(records: &[PostRecord]) -> Vec<Uuid> {
        records.iter().map(|r| r.post.id).collect()
    }

    #[test]
    fn test_tiers_in_order() {
        let normal = post(1, false, false, 0);
        let boosted = post(50, false, true, 0);
        let pinned = post(100, true, false, 1);
        let both = post(200, true, true, 0);
        let expected = ids(&[both.clone(), pinned.clone(), boosted.clone(), normal.clone()]);

        let ranked = rank_feed(vec![normal, boosted, pinned, both]);
        assert_eq!(ids(&ranked), expected);
    }

    #[test]
    fn test_pinned_by_rank_then_newest() {
        let rank2 = post(1, true, false, 2);
        let rank1_old = post(60, true, false, 1);
        let rank1_new = post(5, true, false, 1);
        let expected = ids(&[rank1_new.clone(), rank1_old.clone(), rank2.clone()]);

        let ranked = rank_feed(vec![rank2, rank1_old, rank1_new]);
        assert_eq!(ids(&ranked), expected);
    }

    #[test]
    fn test_pinned_and_boosted_ignores_rank() {
        let older_rank1 = post(30, true, true, 1);
        let newer_rank9 = post(2, true, true, 9);
        let expected = ids(&[newer_rank9.clone(), older_rank1.clone()]);

        let ranked = rank_feed(vec![older_rank1, newer_rank9]);
        assert_eq!(ids(&ranked), expected);
    }

    #[test]
    fn test_unpinned_newest_first() {
        let old = post(90, false, false, 7);
        let new = post(3, false, false, 0);
        let expected = ids(&[new.clone(), old.clone()]);

        assert_eq!(ids(&rank_feed(vec![old, new])), expected);
    }

    #[test]
    fn test_order_is_deterministic_on_full_ties() {
        let a = post(10, false, false, 0);
        let mut b = post(10, false, false, 0);
        b.post.created_at = a.post.created_at;

        let first = ids(&rank_feed(vec![a.clone(), b.clone()]));
        let second = ids(&rank_feed(vec![b, a]));
        assert_eq!(first, second);
    }

    #[test]
    fn test_liked_by_reads_like_records() {
        let viewer = Uuid::new_v4();
        let mut record = post(1, false, false, 0);
        assert!(!record.liked_by(viewer));

        record.likes.push(PostLike {
            id: Uuid::new_v4(),
            post_id: record.post.id,
            user_id: viewer,
            created_at: Utc::now(),
        });
        assert!(record.liked_by(viewer));
    }
}
