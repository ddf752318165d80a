//! # Actix Middleware Library
//!
//! Middleware shared by Pariksha Actix services
//!
//! ## Modules
//! - `jwt_auth`: JWT authentication middleware and the `AuthUser` extractor

pub mod jwt_auth;

pub use jwt_auth::{AuthUser, JwtAuthMiddleware, TOKEN_COOKIE};
