mod common;

use community_service::config::FeedConfig;
use community_service::models::{AccountType, PinnedRank, PostFlagsUpdate};
use community_service::repository::Repositories;
use community_service::services::{CurationService, FeedService};
use error_types::ServiceError;
use uuid::Uuid;

use common::{seed_post, seed_user};

fn feed_config() -> FeedConfig {
    FeedConfig {
        explore_default_limit: 10,
        explore_max_limit: 100,
    }
}

fn pin() -> PostFlagsUpdate {
    PostFlagsUpdate {
        is_pinned: Some(true),
        is_boosted: None,
    }
}

#[tokio::test]
async fn test_reorder_then_feed_follows_ranks() {
    let repos = Repositories::in_memory();
    let curation = CurationService::new(&repos);
    let feed = FeedService::new(&repos, &feed_config());
    let admin = seed_user(&repos, "Admin", AccountType::Admin).await;

    let normal = seed_post(&repos, admin.id, "Newest normal", 1).await;
    let a = seed_post(&repos, admin.id, "A", 30).await;
    let b = seed_post(&repos, admin.id, "B", 60).await;
    curation.set_post_flags(admin.id, a.id, pin()).await.unwrap();
    curation.set_post_flags(admin.id, b.id, pin()).await.unwrap();

    curation
        .reorder_pinned(
            admin.id,
            &[
                PinnedRank {
                    post_id: a.id,
                    rank: 2,
                },
                PinnedRank {
                    post_id: b.id,
                    rank: 1,
                },
            ],
        )
        .await
        .unwrap();

    let order: Vec<Uuid> = feed
        .feed(admin.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.post.id)
        .collect();
    assert_eq!(order, vec![b.id, a.id, normal.id]);
}

#[tokio::test]
async fn test_pinned_and_boosted_lead_the_feed() {
    let repos = Repositories::in_memory();
    let curation = CurationService::new(&repos);
    let feed = FeedService::new(&repos, &feed_config());
    let admin = seed_user(&repos, "Admin", AccountType::Admin).await;

    let boosted = seed_post(&repos, admin.id, "Boosted", 1).await;
    let both = seed_post(&repos, admin.id, "Both", 90).await;
    let pinned = seed_post(&repos, admin.id, "Pinned", 10).await;
    curation
        .set_post_flags(
            admin.id,
            boosted.id,
            PostFlagsUpdate {
                is_pinned: None,
                is_boosted: Some(true),
            },
        )
        .await
        .unwrap();
    curation
        .set_post_flags(
            admin.id,
            both.id,
            PostFlagsUpdate {
                is_pinned: Some(true),
                is_boosted: Some(true),
            },
        )
        .await
        .unwrap();
    curation.set_post_flags(admin.id, pinned.id, pin()).await.unwrap();

    let order: Vec<Uuid> = feed
        .feed(admin.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.post.id)
        .collect();
    assert_eq!(order, vec![both.id, pinned.id, boosted.id]);
}

#[tokio::test]
async fn test_flags_update_is_partial() {
    let repos = Repositories::in_memory();
    let curation = CurationService::new(&repos);
    let admin = seed_user(&repos, "Admin", AccountType::Admin).await;
    let post = seed_post(&repos, admin.id, "Post", 1).await;

    let updated = curation.set_post_flags(admin.id, post.id, pin()).await.unwrap();
    assert!(updated.is_pinned);
    assert!(!updated.is_boosted);

    let updated = curation
        .set_post_flags(
            admin.id,
            post.id,
            PostFlagsUpdate {
                is_pinned: None,
                is_boosted: Some(true),
            },
        )
        .await
        .unwrap();
    assert!(updated.is_pinned);
    assert!(updated.is_boosted);

    let unchanged = curation
        .set_post_flags(admin.id, post.id, PostFlagsUpdate::default())
        .await
        .unwrap();
    assert_eq!(unchanged, updated);
}

#[tokio::test]
async fn test_non_admins_are_forbidden() {
    let repos = Repositories::in_memory();
    let curation = CurationService::new(&repos);
    let admin = seed_user(&repos, "Admin", AccountType::Admin).await;
    let student = seed_user(&repos, "Student", AccountType::Student).await;
    let post = seed_post(&repos, admin.id, "Post", 1).await;

    let err = curation
        .set_post_flags(student.id, post.id, pin())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // Forbidden wins over input validation
    let err = curation.reorder_pinned(student.id, &[]).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let err = curation
        .set_post_flags(Uuid::new_v4(), post.id, pin())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn test_reorder_rejects_bad_input_without_writing() {
    let repos = Repositories::in_memory();
    let curation = CurationService::new(&repos);
    let admin = seed_user(&repos, "Admin", AccountType::Admin).await;
    let post = seed_post(&repos, admin.id, "Post", 1).await;

    let err = curation.reorder_pinned(admin.id, &[]).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(err.to_string(), "Invalid pinned post data");

    let err = curation
        .reorder_pinned(
            admin.id,
            &[
                PinnedRank {
                    post_id: post.id,
                    rank: 4,
                },
                PinnedRank {
                    post_id: Uuid::new_v4(),
                    rank: 5,
                },
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let stored = repos.posts.find_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.pinned_rank, 0);
}

#[tokio::test]
async fn test_missing_post_flags_not_found() {
    let repos = Repositories::in_memory();
    let curation = CurationService::new(&repos);
    let admin = seed_user(&repos, "Admin", AccountType::Admin).await;

    let err = curation
        .set_post_flags(admin.id, Uuid::new_v4(), pin())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
