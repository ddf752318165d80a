use actix_middleware::AuthUser;
use actix_web::{web, HttpResponse};
use error_types::{ApiResponse, ServiceError};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExploreQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/feed
pub async fn get_feed(
    user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let posts = state.feed.feed(user.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Posts fetched successfully", posts)))
}

/// GET /api/v1/feed/explore?limit=N
pub async fn explore(
    user: AuthUser,
    state: web::Data<AppState>,
    query: web::Query<ExploreQuery>,
) -> Result<HttpResponse, ServiceError> {
    let posts = state.feed.explore(user.id, query.limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Explore posts fetched successfully", posts)))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/feed")
            .route("", web::get().to(get_feed))
            .route("/explore", web::get().to(explore)),
    );
}
