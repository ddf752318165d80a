//! HTTP handlers, one module per resource
//!
//! Every route lives under `/api/v1` behind `JwtAuthMiddleware`; handlers that need
//! an identity take an `AuthUser` argument.

pub mod auth;
pub mod comments;
pub mod feed;
pub mod likes;
pub mod notifications;
pub mod otp;
pub mod posts;
pub mod quizzes;
pub mod users;

use actix_web::{error, web, HttpRequest};
use error_types::ServiceError;

/// Malformed JSON bodies, query strings and path ids become 400 envelopes
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req: &HttpRequest| bad_request(err.to_string())),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req: &HttpRequest| bad_request(err.to_string())),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req: &HttpRequest| bad_request(err.to_string())),
    );
}

fn bad_request(message: String) -> error::Error {
    ServiceError::Validation(message).into()
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    auth::register_routes(cfg);
    feed::register_routes(cfg);
    likes::register_routes(cfg);
    notifications::register_routes(cfg);
    posts::register_routes(cfg);
    comments::register_routes(cfg);
    users::register_routes(cfg);
    quizzes::register_routes(cfg);
    otp::register_routes(cfg);
}
