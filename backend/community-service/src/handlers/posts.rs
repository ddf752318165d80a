use actix_middleware::AuthUser;
use actix_web::{web, HttpResponse};
use error_types::{ApiResponse, ServiceError};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::comments::{add_comment, list_comments};
use crate::models::{PinnedRank, PostFlagsUpdate};
use crate::services::posts::PostInput;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub ranked_pinned: Option<Vec<PinnedRank>>,
}

/// POST /api/v1/posts (admin)
pub async fn create_post(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<PostInput>,
) -> Result<HttpResponse, ServiceError> {
    let post = state.posts.create_post(user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok("Post created successfully", post)))
}

/// GET /api/v1/posts (admin)
pub async fn list_all_posts(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let posts = state.posts.list_all_posts(user.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Posts fetched successfully", posts)))
}

/// GET /api/v1/posts/count (admin)
pub async fn count_posts(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let count = state.posts.count_posts(user.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Post count fetched successfully",
        json!({ "count": count }),
    )))
}

/// GET /api/v1/posts/mine
pub async fn list_my_posts(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let posts = state.posts.list_my_posts(user.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Posts fetched successfully", posts)))
}

/// GET /api/v1/posts/mine/count
pub async fn count_my_posts(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let count = state.posts.count_my_posts(user.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Post count fetched successfully",
        json!({ "count": count }),
    )))
}

/// PUT /api/v1/posts/pinned-order (admin)
pub async fn reorder_pinned(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<ReorderRequest>,
) -> Result<HttpResponse, ServiceError> {
    let ranked = body.into_inner().ranked_pinned.unwrap_or_default();
    state.curation.reorder_pinned(user.id, &ranked).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Pinned post order updated successfully")))
}

/// GET /api/v1/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let details = state.posts.get_post_details(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Post fetched successfully", details)))
}

/// PUT /api/v1/posts/{id} (admin)
pub async fn edit_post(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PostInput>,
) -> Result<HttpResponse, ServiceError> {
    let post = state
        .posts
        .edit_post(user.id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Post updated successfully", post)))
}

/// DELETE /api/v1/posts/{id} (owner or admin)
pub async fn delete_post(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    state.posts.delete_post(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Post deleted successfully")))
}

/// PUT /api/v1/posts/{id}/status (admin)
pub async fn set_post_status(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PostFlagsUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let post = state
        .curation
        .set_post_flags(user.id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Post status updated successfully", post)))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    // Static segments before `/{id}`
    cfg.service(
        web::scope("/posts")
            .route("", web::post().to(create_post))
            .route("", web::get().to(list_all_posts))
            .route("/count", web::get().to(count_posts))
            .route("/mine", web::get().to(list_my_posts))
            .route("/mine/count", web::get().to(count_my_posts))
            .route("/pinned-order", web::put().to(reorder_pinned))
            .route("/{id}", web::get().to(get_post))
            .route("/{id}", web::put().to(edit_post))
            .route("/{id}", web::delete().to(delete_post))
            .route("/{id}/status", web::put().to(set_post_status))
            .route("/{id}/comments", web::get().to(list_comments))
            .route("/{id}/comments", web::post().to(add_comment)),
    );
}
