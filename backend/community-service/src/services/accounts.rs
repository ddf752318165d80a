use std::sync::Arc;

use chrono::{Duration, Utc};
use error_types::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::{non_blank, require_account, require_admin};
use crate::models::{AccountType, ProfileUpdate, User, UserCascade};
use crate::repository::{Repositories, UserRepository};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub account_type: Option<AccountType>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Issued on sign-up and login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// First message in field-name order, so the response is stable
fn first_validation_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

fn validate<T: Validate>(payload: &T) -> ServiceResult<()> {
    payload
        .validate()
        .map_err(|e| ServiceError::Validation(first_validation_message(&e)))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    token_ttl: Duration,
    allow_admin_signup: bool,
}

impl AccountService {
    pub fn new(repos: &Repositories, token_ttl: Duration) -> Self {
        Self {
            users: repos.users.clone(),
            token_ttl,
            allow_admin_signup: false,
        }
    }

    /// Let sign-up request `accountType: Admin`; used to bootstrap the first admin
    pub fn with_admin_signup(mut self, allow: bool) -> Self {
        self.allow_admin_signup = allow;
        self
    }

    pub fn token_ttl_hours(&self) -> i64 {
        self.token_ttl.num_hours()
    }

    fn issue(&self, user: User) -> ServiceResult<Session> {
        let token = crypto_core::jwt::generate_token(
            user.id,
            &user.email,
            user.account_type.as_str(),
            self.token_ttl,
        )
        .map_err(ServiceError::internal)?;
        Ok(Session { token, user })
    }

    pub async fn signup(&self, mut req: SignupRequest) -> ServiceResult<Session> {
        req.first_name = req.first_name.trim().to_string();
        req.last_name = req.last_name.trim().to_string();
        req.email = normalize_email(&req.email);
        validate(&req)?;

        let account_type = req.account_type.unwrap_or_default();
        if account_type.is_admin() && !self.allow_admin_signup {
            warn!(email = %req.email, "Rejected self-service admin sign-up");
            return Err(ServiceError::Forbidden(
                "Admin accounts cannot be self-registered".to_string(),
            ));
        }

        let password_hash =
            crypto_core::hash_password(&req.password).map_err(ServiceError::internal)?;

        let user = self
            .users
            .insert_user(User {
                id: Uuid::new_v4(),
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                password_hash,
                account_type,
                image_url: None,
                phone: None,
                created_at: Utc::now(),
            })
            .await?;

        info!(user_id = %user.id, account_type = %user.account_type, "User signed up");
        self.issue(user)
    }

    /// Unknown e-mail and wrong password are indistinguishable to the caller
    pub async fn login(&self, mut req: LoginRequest) -> ServiceResult<Session> {
        req.email = normalize_email(&req.email);
        validate(&req)?;

        let invalid = || ServiceError::Unauthorized("Invalid email or password".to_string());

        let user = self
            .users
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(invalid)?;

        let matches = crypto_core::verify_password(&req.password, &user.password_hash)
            .map_err(ServiceError::internal)?;
        if !matches {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(invalid());
        }

        info!(user_id = %user.id, "User logged in");
        self.issue(user)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> ServiceResult<User> {
        require_account(self.users.as_ref(), user_id).await
    }

    /// Blank fields are ignored
    pub async fn update_profile(
        &self,
        actor_id: Uuid,
        update: ProfileUpdate,
    ) -> ServiceResult<User> {
        let update = ProfileUpdate {
            first_name: non_blank(update.first_name),
            last_name: non_blank(update.last_name),
            image_url: non_blank(update.image_url),
            phone: non_blank(update.phone),
        };

        self.users
            .update_profile(actor_id, update)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    pub async fn list_users(&self, actor_id: Uuid) -> ServiceResult<Vec<User>> {
        require_admin(self.users.as_ref(), actor_id).await?;
        self.users.list_users_except(actor_id).await
    }

    pub async fn count_users(&self, actor_id: Uuid) -> ServiceResult<i64> {
        require_admin(self.users.as_ref(), actor_id).await?;
        self.users.count_users_except(actor_id).await
    }

    /// Removes the account with its likes, comments and received notifications.
    /// Its posts and sent notifications stay and render the author as `null`.
    pub async fn delete_user(&self, actor_id: Uuid, user_id: Uuid) -> ServiceResult<UserCascade> {
        require_admin(self.users.as_ref(), actor_id).await?;

        let cascade = self
            .users
            .delete_user_cascade(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        info!(
            user_id = %user_id,
            likes = cascade.likes_removed,
            comments = cascade.comments_removed,
            notifications = cascade.notifications_removed,
            "User deleted"
        );
        Ok(cascade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(first: &str, email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            first_name: first.to_string(),
            last_name: "Rao".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            account_type: None,
        }
    }

    #[test]
    fn test_signup_validation_messages() {
        let err = validate(&signup("Asha", "not-an-email", "longenough")).unwrap_err();
        assert_eq!(err.to_string(), "A valid email is required");

        let err = validate(&signup("Asha", "a@pariksha.dev", "short")).unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters");

        assert!(validate(&signup("Asha", "a@pariksha.dev", "longenough")).is_ok());
    }

    #[test]
    fn test_messages_follow_field_order() {
        let err = validate(&signup("", "bad", "short")).unwrap_err();
        assert_eq!(err.to_string(), "A valid email is required");
    }

    #[tokio::test]
    async fn test_admin_signup_needs_opt_in() {
        let repos = Repositories::in_memory();
        let accounts = AccountService::new(&repos, Duration::hours(1));

        let mut req = signup("Asha", "asha@pariksha.dev", "longenough");
        req.account_type = Some(AccountType::Admin);
        let err = accounts.signup(req).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert!(repos
            .users
            .find_user_by_email("asha@pariksha.dev")
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_email_normalized() {
        assert_eq!(normalize_email("  Asha@Pariksha.DEV "), "asha@pariksha.dev");
    }
}
