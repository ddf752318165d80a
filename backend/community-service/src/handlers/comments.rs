use actix_middleware::AuthUser;
use actix_web::{web, HttpResponse};
use error_types::{ApiResponse, ServiceError};
use serde::Deserialize;
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: Option<String>,
}

/// GET /api/v1/posts/{id}/comments
pub async fn list_comments(
    _user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let comments = state.comments.list_comments(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Comments fetched successfully", comments)))
}

/// POST /api/v1/posts/{id}/comments
pub async fn add_comment(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> Result<HttpResponse, ServiceError> {
    let text = body.into_inner().text.unwrap_or_default();
    let comment = state
        .comments
        .add_comment(user.id, path.into_inner(), &text)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok("Comment added successfully", comment)))
}

/// DELETE /api/v1/comments/{id}
pub async fn delete_comment(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    state
        .comments
        .delete_comment(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Comment deleted successfully")))
}

/// Listing and creation live under `/posts/{id}/comments`
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/comments/{id}", web::delete().to(delete_comment));
}
