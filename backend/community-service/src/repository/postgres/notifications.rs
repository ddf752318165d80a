use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_types::{ServiceError, ServiceResult};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{corrupt_column, PgStore};
use crate::models::Notification;
use crate::repository::NotificationRepository;

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    sender_id: Uuid,
    notification_type: String,
    message: String,
    reference_id: Uuid,
    reference_model: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = ServiceError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            sender_id: row.sender_id,
            notification_type: row
                .notification_type
                .parse()
                .map_err(|e| corrupt_column("notification_type", e))?,
            message: row.message,
            reference_id: row.reference_id,
            reference_model: row
                .reference_model
                .parse()
                .map_err(|e| corrupt_column("reference_model", e))?,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

/// Write a notification on the caller's connection, usually inside its transaction
pub(super) async fn insert_notification(
    conn: &mut PgConnection,
    notification: &Notification,
) -> ServiceResult<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (id, recipient_id, sender_id, notification_type, message,
                                   reference_id, reference_model, is_read, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(notification.id)
    .bind(notification.recipient_id)
    .bind(notification.sender_id)
    .bind(notification.notification_type.as_str())
    .bind(&notification.message)
    .bind(notification.reference_id)
    .bind(notification.reference_model.as_str())
    .bind(notification.is_read)
    .bind(notification.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn notifications_for(
        &self,
        recipient_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> ServiceResult<Vec<Notification>> {
        sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, recipient_id, sender_id, notification_type, message, reference_id,
                   reference_model, is_read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(recipient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Notification::try_from)
        .collect()
    }

    async fn count_for(&self, recipient_id: Uuid) -> ServiceResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE recipient_id = $1")
                .bind(recipient_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn count_unread(&self, recipient_id: Uuid) -> ServiceResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> ServiceResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
