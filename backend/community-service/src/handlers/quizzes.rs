use actix_middleware::AuthUser;
use actix_web::{web, HttpResponse};
use error_types::{ApiResponse, ServiceError};
use uuid::Uuid;

use crate::services::quiz::QuizInput;
use crate::state::AppState;

/// POST /api/v1/quizzes (admin)
pub async fn create_quiz(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<QuizInput>,
) -> Result<HttpResponse, ServiceError> {
    let quiz = state
        .quizzes
        .create_quiz(user.id, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok("Quiz created successfully", quiz)))
}

/// GET /api/v1/quizzes
pub async fn list_quizzes(
    _user: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let quizzes = state.quizzes.list_quizzes().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Quizzes fetched successfully", quizzes)))
}

/// GET /api/v1/quizzes/{id}
pub async fn get_quiz(
    _user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let quiz = state.quizzes.get_quiz(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Quiz fetched successfully", quiz)))
}

/// PUT /api/v1/quizzes/{id} (admin)
pub async fn update_quiz(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<QuizInput>,
) -> Result<HttpResponse, ServiceError> {
    let quiz = state
        .quizzes
        .update_quiz(user.id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Quiz updated successfully", quiz)))
}

/// DELETE /api/v1/quizzes/{id} (admin)
pub async fn delete_quiz(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    state
        .quizzes
        .delete_quiz(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Quiz deleted successfully")))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/quizzes")
            .route("", web::post().to(create_quiz))
            .route("", web::get().to(list_quizzes))
            .route("/{id}", web::get().to(get_quiz))
            .route("/{id}", web::put().to(update_quiz))
            .route("/{id}", web::delete().to(delete_quiz)),
    );
}
