//! Unified error types and response envelope for Pariksha services
//!
//! Every HTTP response leaving a service has the same shape:
//!
//! ```json
//! { "success": false, "message": "Post not found", "error": "NOT_FOUND" }
//! ```
//!
//! `data` and `error` are omitted when absent. Server faults are logged here and
//! rendered with a generic message so storage details never reach the caller.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes carried in the `error` field of failure envelopes
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// The `{success, message, data?, error?}` response wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error,
        }
    }
}

impl ApiResponse<()> {
    /// Success envelope without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => error_codes::VALIDATION_ERROR,
            ServiceError::Unauthorized(_) => error_codes::UNAUTHORIZED,
            ServiceError::Forbidden(_) => error_codes::FORBIDDEN,
            ServiceError::NotFound(_) => error_codes::NOT_FOUND,
            ServiceError::Conflict(_) => error_codes::CONFLICT,
            ServiceError::Database(_) | ServiceError::Internal(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// True for faults the caller did not cause
    pub fn is_server_fault(&self) -> bool {
        matches!(self, ServiceError::Database(_) | ServiceError::Internal(_))
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_server_fault() {
            tracing::error!(error = %self, "request failed with a server fault");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::failure(
            message,
            Some(self.error_code().to_string()),
        ))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ServiceError::Validation("x".into()), 400),
            (ServiceError::Unauthorized("x".into()), 401),
            (ServiceError::Forbidden("x".into()), 403),
            (ServiceError::NotFound("x".into()), 404),
            (ServiceError::Conflict("x".into()), 409),
            (ServiceError::Internal("x".into()), 500),
            (ServiceError::Database(sqlx::Error::RowNotFound), 500),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err:?}");
        }
    }

    #[test]
    fn test_envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "message": "done"}));

        let body = serde_json::to_value(ApiResponse::ok("fetched", vec![1, 2])).unwrap();
        assert_eq!(body["data"], serde_json::json!([1, 2]));
        assert!(body.get("error").is_none());
    }

    #[actix_web::test]
    async fn test_client_error_message_is_preserved() {
        let resp = ServiceError::NotFound("Post not found".into()).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let body: ApiResponse<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        assert_eq!(body.message, "Post not found");
        assert_eq!(body.error.as_deref(), Some(error_codes::NOT_FOUND));
    }

    #[actix_web::test]
    async fn test_internal_detail_is_not_leaked() {
        let resp = ServiceError::Internal("connection reset by peer at 10.0.0.7".into())
            .error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("10.0.0.7"));
        assert!(text.contains("Internal server error"));
    }
}
