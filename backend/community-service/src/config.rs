/// Configuration management for the community service
///
/// Values come from environment variables (optionally via a `.env` file), using `__`
/// as the section separator: `SERVER__PORT=4000`, `JWT__SECRET=...`,
/// `ACCOUNTS__ALLOW_ADMIN_SIGNUP=true`. The conventional `DATABASE_URL`, `REDIS_URL` and
/// `PORT` variables are honoured as overrides.
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub accounts: AccountsConfig,
    pub otp: OtpConfig,
    #[serde(default)]
    pub twilio: TwilioConfig,
    pub engagement: EngagementConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Volatile single-process store
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountsConfig {
    /// Sign-up may create Admin accounts; off outside first-admin bootstrap
    pub allow_admin_signup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpStoreKind {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    pub store: OtpStoreKind,
    pub ttl_seconds: u64,
}

/// Twilio credentials; OTP messages are only logged when any field is missing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngagementConfig {
    /// Notify authors about their own likes and comments
    pub notify_self: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub explore_default_limit: i64,
    pub explore_max_limit: i64,
}

const DEV_JWT_SECRET: &str = "development-secret-change-in-production";

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 4000)?
            .set_default("storage.backend", "postgres")?
            .set_default("database.url", "postgres://localhost/pariksha")?
            .set_default("database.max_connections", 10)?
            .set_default("redis.url", "redis://localhost:6379")?
            .set_default("jwt.secret", DEV_JWT_SECRET)?
            .set_default("jwt.expiry_hours", 24)?
            .set_default("accounts.allow_admin_signup", false)?
            .set_default("otp.store", "redis")?
            .set_default("otp.ttl_seconds", 300)?
            .set_default("engagement.notify_self", false)?
            .set_default("feed.explore_default_limit", 10)?
            .set_default("feed.explore_max_limit", 100)?
            .add_source(config::Environment::default().separator("__"))
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// The development secret is only accepted with volatile in-memory storage
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret != DEV_JWT_SECRET {
            return Ok(());
        }
        match self.storage.backend {
            StorageBackend::Memory => {
                tracing::warn!("JWT__SECRET not set, using the development secret");
                Ok(())
            }
            StorageBackend::Postgres => Err(anyhow::anyhow!(
                "JWT__SECRET must be set when storage.backend is postgres"
            )),
        }
    }
}

impl Default for Config {
    /// Development defaults: in-memory storage, no external services
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 4000,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/pariksha".to_string(),
                max_connections: 10,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
            },
            jwt: JwtConfig {
                secret: DEV_JWT_SECRET.to_string(),
                expiry_hours: 24,
            },
            accounts: AccountsConfig {
                allow_admin_signup: false,
            },
            otp: OtpConfig {
                store: OtpStoreKind::Memory,
                ttl_seconds: 300,
            },
            twilio: TwilioConfig::default(),
            engagement: EngagementConfig { notify_self: false },
            feed: FeedConfig {
                explore_default_limit: 10,
                explore_max_limit: 100,
            },
        }
    }
}
