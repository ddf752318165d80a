use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::repository::Repositories;
use crate::services::otp::{LogSender, MemoryOtpStore, OtpStore, SmsSender};
use crate::services::{
    AccountService, CommentService, CurationService, EngagementService, FeedService,
    NotificationService, OtpService, PostService, QuizService,
};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub feed: Arc<FeedService>,
    pub engagement: Arc<EngagementService>,
    pub notifications: Arc<NotificationService>,
    pub curation: Arc<CurationService>,
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub quizzes: Arc<QuizService>,
    pub otp: Arc<OtpService>,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        otp_store: Arc<dyn OtpStore>,
        sms: Arc<dyn SmsSender>,
        config: &Config,
    ) -> Self {
        let notify_self = config.engagement.notify_self;

        Self {
            accounts: Arc::new(
                AccountService::new(&repos, chrono::Duration::hours(config.jwt.expiry_hours))
                    .with_admin_signup(config.accounts.allow_admin_signup),
            ),
            feed: Arc::new(FeedService::new(&repos, &config.feed)),
            engagement: Arc::new(EngagementService::new(&repos, notify_self)),
            notifications: Arc::new(NotificationService::new(&repos)),
            curation: Arc::new(CurationService::new(&repos)),
            posts: Arc::new(PostService::new(&repos)),
            comments: Arc::new(CommentService::new(&repos, notify_self)),
            quizzes: Arc::new(QuizService::new(&repos)),
            otp: Arc::new(OtpService::new(
                otp_store,
                sms,
                Duration::from_secs(config.otp.ttl_seconds),
            )),
        }
    }

    /// Everything in process: memory repositories, memory OTP codes, logged SMS
    pub fn in_memory(config: &Config) -> Self {
        Self::new(
            Repositories::in_memory(),
            Arc::new(MemoryOtpStore::new()),
            Arc::new(LogSender),
            config,
        )
    }
}
