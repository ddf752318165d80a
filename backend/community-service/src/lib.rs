//! Community service for the Pariksha platform
//!
//! Posts with admin-curated pinning and boosting, likes, comments, notifications,
//! quizzes, accounts and phone OTP verification behind one actix-web app.

pub mod config;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;
pub mod state;

use actix_middleware::JwtAuthMiddleware;
use actix_web::{web, HttpResponse};

pub use config::Config;
pub use state::AppState;

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// Mount `/health` and the authenticated `/api/v1` routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    handlers::extractor_config(cfg);
    cfg.route("/health", web::get().to(health)).service(
        web::scope("/api/v1")
            .configure(handlers::register_routes)
            .wrap(JwtAuthMiddleware),
    );
}
