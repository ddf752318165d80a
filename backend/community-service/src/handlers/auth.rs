use actix_middleware::TOKEN_COOKIE;
use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{web, HttpResponse};
use error_types::{ApiResponse, ServiceError};

use crate::services::accounts::{LoginRequest, Session, SignupRequest};
use crate::state::AppState;

fn session_cookie(session: &Session, max_age_hours: i64) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, session.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(max_age_hours))
        .finish()
}

/// POST /api/v1/auth/signup
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, ServiceError> {
    let session = state.accounts.signup(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok("User registered successfully", session)))
}

/// POST /api/v1/auth/login
///
/// The token is returned in the body and also set as an HTTP-only cookie.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServiceError> {
    let session = state.accounts.login(body.into_inner()).await?;
    let cookie = session_cookie(&session, state.accounts.token_ttl_hours());

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(ApiResponse::ok("Logged in successfully", session)))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login)),
    );
}
