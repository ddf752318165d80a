use actix_middleware::AuthUser;
use actix_web::{web, HttpResponse};
use error_types::{ApiResponse, ServiceError};
use serde_json::json;
use uuid::Uuid;

use crate::models::ProfileUpdate;
use crate::state::AppState;

/// GET /api/v1/users (admin)
pub async fn list_users(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let users = state.accounts.list_users(user.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Users fetched successfully", users)))
}

/// GET /api/v1/users/count (admin)
pub async fn count_users(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let count = state.accounts.count_users(user.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "User count fetched successfully",
        json!({ "count": count }),
    )))
}

/// PUT /api/v1/users/me
pub async fn update_me(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let updated = state
        .accounts
        .update_profile(user.id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Profile updated successfully", updated)))
}

/// GET /api/v1/users/{id}
pub async fn get_user(
    _user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let profile = state.accounts.get_profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("User fetched successfully", profile)))
}

/// DELETE /api/v1/users/{id} (admin)
pub async fn delete_user(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let cascade = state
        .accounts
        .delete_user(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("User deleted successfully", cascade)))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(list_users))
            .route("/count", web::get().to(count_users))
            .route("/me", web::put().to(update_me))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}", web::delete().to(delete_user)),
    );
}
