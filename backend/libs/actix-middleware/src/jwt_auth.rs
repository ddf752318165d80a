use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use error_types::ServiceError;
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use uuid::Uuid;

/// Cookie consulted when no Authorization header is present
pub const TOKEN_COOKIE: &str = "token";

/// Identity extracted from a validated JWT
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub account_type: String,
}

/// JWT Authentication Middleware
///
/// Requests without valid credentials pass through anonymously; handlers that need
/// an identity take an [`AuthUser`] argument, which rejects anonymous requests with
/// 401. A stale or forged token is logged and ignored, so public routes such as
/// login keep working for a client still holding an old cookie.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            if let Some(auth_user) = extract_token(&req).and_then(|t| authenticate(&t)) {
                req.extensions_mut().insert(auth_user);
            }

            service.call(req).await
        })
    }
}

fn extract_token(req: &ServiceRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    from_header.or_else(|| {
        req.cookie(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

fn authenticate(token: &str) -> Option<AuthUser> {
    let token_data = crypto_core::jwt::validate_token(token)
        .map_err(|e| tracing::warn!("JWT validation failed: {}", e))
        .ok()?;

    let id = token_data
        .claims
        .user_id()
        .map_err(|e| tracing::error!("Invalid user_id in token: {}", e))
        .ok()?;

    Some(AuthUser {
        id,
        email: token_data.claims.email,
        account_type: token_data.claims.account_type,
    })
}

impl actix_web::FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ServiceError::Unauthorized(
                "Token is missing, please log in".to_string(),
            )
            .into())),
        }
    }
}
