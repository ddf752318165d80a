//! Credential primitives shared by Pariksha services
//!
//! - `jwt`: HS256 token issue/validation with process-wide keys
//! - `password`: argon2 password hashing

pub mod jwt;
pub mod password;

pub use password::{hash_password, verify_password, PasswordError};
