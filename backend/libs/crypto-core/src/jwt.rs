/// Shared JWT module for Pariksha services
///
/// Tokens are signed with HS256 using a single shared secret. The secret is loaded
/// once at startup and is immutable afterwards.
///
/// ## Usage
///
/// ```rust,ignore
/// use crypto_core::jwt;
///
/// jwt::initialize_jwt_secret(&config.jwt.secret)?;
/// let token = jwt::generate_token(user_id, "a@b.c", "Admin", chrono::Duration::hours(24))?;
/// let claims = jwt::validate_token(&token)?.claims;
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// HS256 secrets shorter than the digest size are rejected
pub const MIN_SECRET_LEN: usize = 32;

// ============================================================================
// Data Structures
// ============================================================================

/// JWT claims carried by every access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub email: String,
    /// Account type at issue time ("Admin" / "Student")
    pub account_type: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
    }
}

struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

static JWT_KEYS: OnceCell<JwtKeys> = OnceCell::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the signing secret
///
/// Must be called during startup before any token operation. Can only succeed once
/// per process; later calls return an error and leave the first secret in place.
pub fn initialize_jwt_secret(secret: &str) -> Result<()> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(anyhow!(
            "JWT secret must be at least {MIN_SECRET_LEN} bytes, got {}",
            secret.len()
        ));
    }

    JWT_KEYS
        .set(JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
        .map_err(|_| anyhow!("JWT secret already initialized"))
}

pub fn is_initialized() -> bool {
    JWT_KEYS.get().is_some()
}

fn keys() -> Result<&'static JwtKeys> {
    JWT_KEYS
        .get()
        .ok_or_else(|| anyhow!("JWT secret not initialized. Call initialize_jwt_secret() during startup."))
}

// ============================================================================
// Token Generation
// ============================================================================

pub fn generate_token(
    user_id: Uuid,
    email: &str,
    account_type: &str,
    ttl: Duration,
) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        account_type: account_type.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(&Header::new(JWT_ALGORITHM), &claims, &keys()?.encoding)
        .map_err(|e| anyhow!("Failed to generate token: {e}"))
}

// ============================================================================
// Token Validation
// ============================================================================

/// Validate signature and expiry, returning the decoded claims
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    decode::<Claims>(token, &keys()?.decoding, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}
