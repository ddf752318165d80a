pub mod accounts;
pub mod comments;
pub mod curation;
pub mod engagement;
pub mod feed;
pub mod notifications;
pub mod otp;
pub mod posts;
pub mod quiz;

pub use accounts::AccountService;
pub use comments::CommentService;
pub use curation::CurationService;
pub use engagement::EngagementService;
pub use feed::FeedService;
pub use notifications::NotificationService;
pub use otp::OtpService;
pub use posts::PostService;
pub use quiz::QuizService;

use error_types::{ServiceError, ServiceResult};
use uuid::Uuid;

use crate::models::User;
use crate::repository::UserRepository;

/// Load the caller's stored account, 404 when it no longer exists
pub(crate) async fn require_account(users: &dyn UserRepository, id: Uuid) -> ServiceResult<User> {
    users
        .find_user(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
}

/// Admin gate checked against the stored account, never the token claims
pub(crate) async fn require_admin(users: &dyn UserRepository, id: Uuid) -> ServiceResult<User> {
    match users.find_user(id).await? {
        Some(user) if user.account_type.is_admin() => Ok(user),
        _ => {
            tracing::warn!(user_id = %id, "admin-only operation rejected");
            Err(ServiceError::Forbidden(
                "This route is restricted to admins".to_string(),
            ))
        }
    }
}

/// Trim a text field, treating blank input as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
