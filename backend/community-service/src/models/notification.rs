use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::UserSummary;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    PostLiked,
    PostUnliked,
    PostCommented,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::PostLiked => "post_liked",
            NotificationType::PostUnliked => "post_unliked",
            NotificationType::PostCommented => "post_commented",
        }
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post_liked" => Ok(NotificationType::PostLiked),
            "post_unliked" => Ok(NotificationType::PostUnliked),
            "post_commented" => Ok(NotificationType::PostCommented),
            other => Err(format!("unknown notification type: {other}")),
        }
    }
}

/// Kind of entity a notification refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReferenceModel {
    Post,
}

impl ReferenceModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceModel::Post => "Post",
        }
    }
}

impl FromStr for ReferenceModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Post" => Ok(ReferenceModel::Post),
            other => Err(format!("unknown reference model: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    /// Kept after the sender's account is deleted
    pub sender_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub reference_id: Uuid,
    pub reference_model: ReferenceModel,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification to be written alongside the mutation that triggers it
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub recipient_id: Uuid,
    pub sender_id: Uuid,
    pub notification_type: NotificationType,
    pub message: String,
    pub reference_id: Uuid,
    pub reference_model: ReferenceModel,
}

impl NotificationDraft {
    pub fn into_notification(self) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient_id: self.recipient_id,
            sender_id: self.sender_id,
            notification_type: self.notification_type,
            message: self.message,
            reference_id: self.reference_id,
            reference_model: self.reference_model,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

/// Notification as returned to its recipient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: Uuid,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub reference_id: Uuid,
    pub reference_model: ReferenceModel,
    /// `None` once the sender's account is gone
    pub sender: Option<UserSummary>,
}

impl NotificationView {
    pub fn new(notification: Notification, sender: Option<UserSummary>) -> Self {
        Self {
            id: notification.id,
            message: notification.message,
            notification_type: notification.notification_type,
            is_read: notification.is_read,
            created_at: notification.created_at,
            reference_id: notification.reference_id,
            reference_model: notification.reference_model,
            sender,
        }
    }
}
