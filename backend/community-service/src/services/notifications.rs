use std::sync::Arc;

use error_types::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::require_account;
use crate::models::NotificationView;
use crate::repository::{NotificationRepository, Repositories, UserRepository};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<NotificationView>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_notifications: i64,
}

pub struct NotificationService {
    users: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
            notifications: repos.notifications.clone(),
        }
    }

    /// Newest-first page with sender snapshots resolved at read time
    pub async fn list(
        &self,
        user_id: Uuid,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> ServiceResult<NotificationPage> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 || limit < 1 {
            return Err(ServiceError::Validation(
                "page and limit must be positive integers".to_string(),
            ));
        }
        let limit = limit.min(MAX_PAGE_SIZE);

        require_account(self.users.as_ref(), user_id).await?;

        let offset = (page - 1).saturating_mul(limit);
        let notifications = self
            .notifications
            .notifications_for(user_id, offset, limit)
            .await?;
        let total = self.notifications.count_for(user_id).await?;

        let mut sender_ids: Vec<Uuid> = notifications.iter().map(|n| n.sender_id).collect();
        sender_ids.sort_unstable();
        sender_ids.dedup();
        let senders = self.users.user_summaries(&sender_ids).await?;

        let notifications = notifications
            .into_iter()
            .map(|n| {
                let sender = senders.get(&n.sender_id).cloned();
                NotificationView::new(n, sender)
            })
            .collect();

        Ok(NotificationPage {
            notifications,
            current_page: page,
            total_pages: (total + limit - 1) / limit,
            total_notifications: total,
        })
    }

    /// Returns how many notifications flipped; zero is not an error
    pub async fn mark_all_read(&self, user_id: Uuid) -> ServiceResult<u64> {
        require_account(self.users.as_ref(), user_id).await?;

        let flipped = self.notifications.mark_all_read(user_id).await?;
        info!(user_id = %user_id, flipped, "Notifications marked as read");
        Ok(flipped)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> ServiceResult<i64> {
        self.notifications.count_unread(user_id).await
    }
}
