mod common;

use community_service::models::AccountType;
use community_service::repository::Repositories;
use community_service::services::{AccountService, EngagementService, NotificationService};
use error_types::ServiceError;
use uuid::Uuid;

use common::{seed_post, seed_user};

#[tokio::test]
async fn test_pages_are_newest_first_with_totals() {
    let repos = Repositories::in_memory();
    let engagement = EngagementService::new(&repos, false);
    let notifications = NotificationService::new(&repos);
    let owner = seed_user(&repos, "Owner", AccountType::Admin).await;
    let fan = seed_user(&repos, "Fan", AccountType::Student).await;

    let mut posts = Vec::new();
    for i in 0..5 {
        posts.push(seed_post(&repos, owner.id, &format!("Post {i}"), 10 - i).await);
    }
    for post in &posts {
        engagement.toggle_like(post.id, fan.id).await.unwrap();
    }

    let first = notifications.list(owner.id, Some(1), Some(2)).await.unwrap();
    assert_eq!(first.total_notifications, 5);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.current_page, 1);
    assert_eq!(first.notifications.len(), 2);
    assert!(first.notifications[0].created_at >= first.notifications[1].created_at);

    let last = notifications.list(owner.id, Some(3), Some(2)).await.unwrap();
    assert_eq!(last.notifications.len(), 1);

    let beyond = notifications.list(owner.id, Some(9), Some(2)).await.unwrap();
    assert!(beyond.notifications.is_empty());
    assert_eq!(beyond.total_notifications, 5);
}

#[tokio::test]
async fn test_mark_all_read_then_unread_count_is_zero() {
    let repos = Repositories::in_memory();
    let engagement = EngagementService::new(&repos, false);
    let notifications = NotificationService::new(&repos);
    let owner = seed_user(&repos, "Owner", AccountType::Admin).await;
    let fan = seed_user(&repos, "Fan", AccountType::Student).await;
    let post = seed_post(&repos, owner.id, "Post", 1).await;

    engagement.toggle_like(post.id, fan.id).await.unwrap();
    engagement.toggle_like(post.id, fan.id).await.unwrap();
    assert_eq!(notifications.unread_count(owner.id).await.unwrap(), 2);

    assert_eq!(notifications.mark_all_read(owner.id).await.unwrap(), 2);
    assert_eq!(notifications.unread_count(owner.id).await.unwrap(), 0);

    // Nothing left to flip is still a success
    assert_eq!(notifications.mark_all_read(owner.id).await.unwrap(), 0);

    let page = notifications.list(owner.id, None, None).await.unwrap();
    assert!(page.notifications.iter().all(|n| n.is_read));
}

#[tokio::test]
async fn test_deleted_sender_renders_as_null() {
    let repos = Repositories::in_memory();
    let engagement = EngagementService::new(&repos, false);
    let notifications = NotificationService::new(&repos);
    let accounts = AccountService::new(&repos, chrono::Duration::hours(1));
    let admin = seed_user(&repos, "Admin", AccountType::Admin).await;
    let fan = seed_user(&repos, "Fan", AccountType::Student).await;
    let post = seed_post(&repos, admin.id, "Post", 1).await;

    engagement.toggle_like(post.id, fan.id).await.unwrap();
    accounts.delete_user(admin.id, fan.id).await.unwrap();

    let page = notifications.list(admin.id, None, None).await.unwrap();
    assert_eq!(page.total_notifications, 1);
    assert!(page.notifications[0].sender.is_none());
}

#[tokio::test]
async fn test_invalid_paging_and_missing_account() {
    let repos = Repositories::in_memory();
    let notifications = NotificationService::new(&repos);
    let owner = seed_user(&repos, "Owner", AccountType::Student).await;

    let err = notifications.list(owner.id, Some(0), None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    let err = notifications.list(owner.id, None, Some(-3)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let page = notifications.list(owner.id, None, Some(5000)).await.unwrap();
    assert_eq!(page.total_pages, 0);

    let err = notifications
        .list(Uuid::new_v4(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    let err = notifications.mark_all_read(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
