use actix_middleware::AuthUser;
use actix_web::{web, HttpResponse};
use error_types::{ApiResponse, ServiceError};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::repository::LikeState;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub post_id: Option<Uuid>,
}

/// POST /api/v1/likes
pub async fn toggle_like(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<LikeRequest>,
) -> Result<HttpResponse, ServiceError> {
    let post_id = body
        .post_id
        .ok_or_else(|| ServiceError::Validation("Post ID is required".to_string()))?;

    let outcome = state.engagement.toggle_like(post_id, user.id).await?;
    let liked = outcome.state == LikeState::Liked;
    let message = if liked {
        "Post liked successfully"
    } else {
        "Post unliked successfully"
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        message,
        json!({ "postId": post_id, "liked": liked }),
    )))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/likes", web::post().to(toggle_like));
}
