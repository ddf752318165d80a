use actix_middleware::AuthUser;
use actix_web::{web, HttpResponse};
use error_types::{ApiResponse, ServiceError};
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/v1/notifications?page&limit
pub async fn list_notifications(
    user: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ServiceError> {
    let page = state
        .notifications
        .list(user.id, query.page, query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Notifications fetched successfully", page)))
}

/// POST /api/v1/notifications/mark-read
pub async fn mark_all_read(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let flipped = state.notifications.mark_all_read(user.id).await?;
    let message = if flipped == 0 {
        "No unread notifications"
    } else {
        "All unread notifications marked as read"
    };
    Ok(HttpResponse::Ok().json(ApiResponse::message(message)))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let count = state.notifications.unread_count(user.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Unread notification count fetched successfully",
        "unreadCount": count,
    })))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list_notifications))
            .route("/mark-read", web::post().to(mark_all_read))
            .route("/unread-count", web::get().to(unread_count)),
    );
}
