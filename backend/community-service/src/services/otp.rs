//! Phone verification by one-time password
//!
//! Codes live in an injected expiring key-value store and are delivered through an
//! injected SMS sender, so several service instances can share one Redis.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use error_types::{ServiceError, ServiceResult};
use rand::Rng;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::TwilioConfig;

const KEY_PREFIX: &str = "otp:";
const TWILIO_API: &str = "https://api.twilio.com/2010-04-01";

/// Deletes the key only when it still holds the submitted code
const CONSUME_SCRIPT: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        redis.call('DEL', KEYS[1])
        return 1
    end
    return 0
"#;

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("OTP store error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("SMS delivery failed: {0}")]
    Delivery(String),
}

impl From<OtpError> for ServiceError {
    fn from(err: OtpError) -> Self {
        ServiceError::internal(err)
    }
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Replace any previous code for `phone`
    async fn put(&self, phone: &str, code: &str, ttl: Duration) -> Result<(), OtpError>;

    /// Remove the code if it matches and has not expired; `true` on success
    async fn consume(&self, phone: &str, code: &str) -> Result<bool, OtpError>;

    async fn remove(&self, phone: &str) -> Result<(), OtpError>;
}

pub struct RedisOtpStore {
    conn: ConnectionManager,
}

impl RedisOtpStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    async fn put(&self, phone: &str, code: &str, ttl: Duration) -> Result<(), OtpError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(format!("{KEY_PREFIX}{phone}"), code, ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn consume(&self, phone: &str, code: &str) -> Result<bool, OtpError> {
        let mut conn = self.conn.clone();
        let consumed: i64 = redis::Script::new(CONSUME_SCRIPT)
            .key(format!("{KEY_PREFIX}{phone}"))
            .arg(code)
            .invoke_async(&mut conn)
            .await?;
        Ok(consumed == 1)
    }

    async fn remove(&self, phone: &str) -> Result<(), OtpError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(format!("{KEY_PREFIX}{phone}")).await?;
        Ok(())
    }
}

/// Single-process store for tests and local development
#[derive(Default)]
pub struct MemoryOtpStore {
    codes: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn put(&self, phone: &str, code: &str, ttl: Duration) -> Result<(), OtpError> {
        let now = Instant::now();
        let mut codes = self.codes.lock().await;
        // Unverified codes are swept on every write
        codes.retain(|_, (_, expires_at)| *expires_at > now);
        codes.insert(phone.to_string(), (code.to_string(), now + ttl));
        Ok(())
    }

    async fn consume(&self, phone: &str, code: &str) -> Result<bool, OtpError> {
        let mut codes = self.codes.lock().await;
        let Some((stored, expires_at)) = codes.get(phone) else {
            return Ok(false);
        };
        let expired = *expires_at <= Instant::now();
        let matches = stored == code;

        if expired {
            codes.remove(phone);
            return Ok(false);
        }
        if matches {
            codes.remove(phone);
        }
        Ok(matches)
    }

    async fn remove(&self, phone: &str) -> Result<(), OtpError> {
        self.codes.lock().await.remove(phone);
        Ok(())
    }
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), OtpError>;
}

/// Twilio Messages API over HTTPS
pub struct TwilioSender {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioSender {
    /// `None` unless every credential is configured
    pub fn from_config(config: &TwilioConfig) -> Option<Self> {
        Some(Self {
            client: reqwest::Client::new(),
            account_sid: config.account_sid.clone()?,
            auth_token: config.auth_token.clone()?,
            from_number: config.from_number.clone()?,
        })
    }
}

#[async_trait]
impl SmsSender for TwilioSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), OtpError> {
        let url = format!("{TWILIO_API}/Accounts/{}/Messages.json", self.account_sid);
        let params = [("To", to), ("From", self.from_number.as_str()), ("Body", body)];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| OtpError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OtpError::Delivery(format!("Twilio returned {status}: {body}")));
        }
        Ok(())
    }
}

/// Logs messages instead of sending them; used when Twilio is not configured
pub struct LogSender;

#[async_trait]
impl SmsSender for LogSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), OtpError> {
        info!(to, body, "SMS delivery disabled, message logged");
        Ok(())
    }
}

/// `+` followed by 8 to 15 digits
pub fn is_valid_phone(phone: &str) -> bool {
    phone.strip_prefix('+').is_some_and(|digits| {
        (8..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
    })
}

/// Uniform six-digit code
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

pub fn otp_message(code: &str, ttl: Duration) -> String {
    let minutes = (ttl.as_secs() / 60).max(1);
    format!("Your one-time password is {code}. It will expire in {minutes} minutes.")
}

pub struct OtpService {
    store: Arc<dyn OtpStore>,
    sms: Arc<dyn SmsSender>,
    ttl: Duration,
}

impl OtpService {
    pub fn new(store: Arc<dyn OtpStore>, sms: Arc<dyn SmsSender>, ttl: Duration) -> Self {
        Self { store, sms, ttl }
    }

    pub async fn send_otp(&self, phone: &str) -> ServiceResult<()> {
        let phone = phone.trim();
        if !is_valid_phone(phone) {
            return Err(ServiceError::Validation(
                "A valid phone number in international format is required".to_string(),
            ));
        }

        let code = generate_code();
        self.store.put(phone, &code, self.ttl).await?;

        if let Err(e) = self.sms.send(phone, &otp_message(&code, self.ttl)).await {
            error!(error = %e, "OTP delivery failed");
            self.store.remove(phone).await?;
            return Err(e.into());
        }

        info!(phone, "OTP sent");
        Ok(())
    }

    /// A matching code is single-use
    pub async fn verify_otp(&self, phone: &str, code: &str) -> ServiceResult<()> {
        let (phone, code) = (phone.trim(), code.trim());
        if phone.is_empty() || code.is_empty() {
            return Err(ServiceError::Validation(
                "Phone number and OTP are required".to_string(),
            ));
        }

        if !self.store.consume(phone, code).await? {
            return Err(ServiceError::Validation("Invalid or expired OTP".to_string()));
        }
        info!(phone, "OTP verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_format() {
        assert!(is_valid_phone("+919876543210"));
        assert!(is_valid_phone("+14155550100"));
        assert!(!is_valid_phone("9876543210"));
        assert!(!is_valid_phone("+1234567"));
        assert!(!is_valid_phone("+1234567890123456"));
        assert!(!is_valid_phone("+91-98765-43210"));
    }

    #[test]
    fn test_codes_are_six_digits() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn test_message_mentions_minutes() {
        assert_eq!(
            otp_message("123456", Duration::from_secs(300)),
            "Your one-time password is 123456. It will expire in 5 minutes."
        );
    }

    #[tokio::test]
    async fn test_memory_store_consumes_once() {
        let store = MemoryOtpStore::new();
        store
            .put("+919876543210", "123456", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(!store.consume("+919876543210", "654321").await.unwrap());
        assert!(store.consume("+919876543210", "123456").await.unwrap());
        assert!(!store.consume("+919876543210", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_expires() {
        let store = MemoryOtpStore::new();
        store
            .put("+919876543210", "123456", Duration::ZERO)
            .await
            .unwrap();
        assert!(!store.consume("+919876543210", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_sweeps_unverified_codes() {
        let store = MemoryOtpStore::new();
        for n in 0..5 {
            store
                .put(&format!("+9198765432{n:02}"), "123456", Duration::ZERO)
                .await
                .unwrap();
        }
        store
            .put("+919876543299", "654321", Duration::from_secs(60))
            .await
            .unwrap();

        let codes = store.codes.lock().await;
        assert_eq!(codes.len(), 1);
        assert!(codes.contains_key("+919876543299"));
    }

    struct FailingSender;

    #[async_trait]
    impl SmsSender for FailingSender {
        async fn send(&self, _to: &str, _body: &str) -> Result<(), OtpError> {
            Err(OtpError::Delivery("gateway down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_delivery_failure_is_internal() {
        let service = OtpService::new(
            Arc::new(MemoryOtpStore::new()),
            Arc::new(FailingSender),
            Duration::from_secs(300),
        );

        let err = service.send_otp("+919876543210").await.unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
