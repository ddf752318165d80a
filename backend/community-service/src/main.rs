use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use community_service::config::{OtpStoreKind, StorageBackend};
use community_service::repository::Repositories;
use community_service::services::otp::{
    LogSender, MemoryOtpStore, OtpStore, RedisOtpStore, SmsSender, TwilioSender,
};
use community_service::{AppState, Config};

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,community_service=debug,actix_web=info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load().context("Failed to load configuration")?;
    crypto_core::jwt::initialize_jwt_secret(&config.jwt.secret)
        .context("Failed to initialize JWT secret")?;

    let repos = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .acquire_timeout(Duration::from_secs(10))
                .connect(&config.database.url)
                .await
                .context("Failed to connect to database")?;
            info!("Database pool created");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database migrations completed");

            Repositories::postgres(pool)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Repositories::in_memory()
        }
    };

    let otp_store: Arc<dyn OtpStore> = match config.otp.store {
        OtpStoreKind::Redis => {
            let client = redis::Client::open(config.redis.url.as_str())
                .context("Failed to create Redis client")?;
            let conn = redis::aio::ConnectionManager::new(client)
                .await
                .context("Failed to connect to Redis")?;
            info!("Redis connection established");
            Arc::new(RedisOtpStore::new(conn))
        }
        OtpStoreKind::Memory => {
            warn!("Using in-memory OTP store; codes are not shared between instances");
            Arc::new(MemoryOtpStore::new())
        }
    };

    let sms: Arc<dyn SmsSender> = match TwilioSender::from_config(&config.twilio) {
        Some(sender) => Arc::new(sender),
        None => {
            warn!("Twilio not configured; OTP messages will only be logged");
            Arc::new(LogSender)
        }
    };

    let state = AppState::new(repos, otp_store, sms, &config);
    let bind = (config.server.host.clone(), config.server.port);
    info!("Starting community-service on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Cors::permissive())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(community_service::configure)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
