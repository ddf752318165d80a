use actix_web::{web, HttpResponse};
use error_types::{ApiResponse, ServiceError};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: Option<String>,
    pub code: Option<String>,
}

/// POST /api/v1/otp/send
pub async fn send_otp(
    state: web::Data<AppState>,
    body: web::Json<SendOtpRequest>,
) -> Result<HttpResponse, ServiceError> {
    let phone = body.into_inner().phone.unwrap_or_default();
    state.otp.send_otp(&phone).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("OTP sent successfully")))
}

/// POST /api/v1/otp/verify
pub async fn verify_otp(
    state: web::Data<AppState>,
    body: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse, ServiceError> {
    let body = body.into_inner();
    state
        .otp
        .verify_otp(
            body.phone.as_deref().unwrap_or_default(),
            body.code.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("OTP verified successfully")))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/otp")
            .route("/send", web::post().to(send_otp))
            .route("/verify", web::post().to(verify_otp)),
    );
}
