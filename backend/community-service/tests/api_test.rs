//! HTTP-level tests over the in-memory store

mod common;

use std::sync::{Arc, Mutex};

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use community_service::models::AccountType;
use community_service::repository::Repositories;
use community_service::services::otp::{MemoryOtpStore, OtpError, SmsSender};
use community_service::{AppState, Config};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{seed_post, seed_user};

const TEST_SECRET: &str = "community-service-api-test-secret-0123456789";

/// Keeps every SMS body so tests can read the code back
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSender {
    fn last_code(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let (_, body) = sent.last()?;
        body.split_whitespace()
            .map(|w| w.trim_end_matches('.'))
            .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string)
    }
}

#[async_trait]
impl SmsSender for RecordingSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), OtpError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

struct TestContext {
    repos: Repositories,
    state: AppState,
    sms: Arc<RecordingSender>,
}

fn context() -> TestContext {
    let _ = crypto_core::jwt::initialize_jwt_secret(TEST_SECRET);
    let repos = Repositories::in_memory();
    let sms = Arc::new(RecordingSender::default());
    let state = AppState::new(
        repos.clone(),
        Arc::new(MemoryOtpStore::new()),
        sms.clone(),
        &Config::default(),
    );
    TestContext { repos, state, sms }
}

fn bearer(user_id: Uuid, account_type: AccountType) -> (&'static str, String) {
    let token = crypto_core::jwt::generate_token(
        user_id,
        "someone@pariksha.dev",
        account_type.as_str(),
        chrono::Duration::hours(1),
    )
    .unwrap();
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($ctx.state.clone()))
                .configure(community_service::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health() {
    let ctx = context();
    let app = app!(ctx);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "OK");
}

#[actix_web::test]
async fn test_protected_routes_need_a_token() {
    let ctx = context();
    let app = app!(ctx);

    for uri in ["/api/v1/feed", "/api/v1/notifications", "/api/v1/posts/mine"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }
}

#[actix_web::test]
async fn test_signup_login_and_cookie_session() {
    let ctx = context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({
            "firstName": "Asha",
            "lastName": "Rao",
            "email": "Asha@Pariksha.dev",
            "password": "correct-horse"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["user"]["email"], "asha@pariksha.dev");
    assert_eq!(body["data"]["user"]["accountType"], "Student");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let duplicate = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({
            "firstName": "Asha",
            "lastName": "Rao",
            "email": "asha@pariksha.dev",
            "password": "another-pass"
        }))
        .to_request();
    let resp = test::call_service(&app, duplicate).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let wrong = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "asha@pariksha.dev", "password": "wrong-pass" }))
        .to_request();
    let resp = test::call_service(&app, wrong).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let login = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "asha@pariksha.dev", "password": "correct-horse" }))
        .to_request();
    let resp = test::call_service(&app, login).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "token")
        .map(|c| c.value().to_string())
        .unwrap();

    // No posts yet: the feed answers 404, which proves the cookie authenticated
    let req = test::TestRequest::get()
        .uri("/api/v1/feed")
        .cookie(Cookie::new("token", cookie))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "No posts found");
}

#[actix_web::test]
async fn test_like_flow_and_notification_endpoints() {
    let ctx = context();
    let admin = seed_user(&ctx.repos, "Admin", AccountType::Admin).await;
    let fan = seed_user(&ctx.repos, "Fan", AccountType::Student).await;
    let post = seed_post(&ctx.repos, admin.id, "Welcome", 1).await;
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/likes")
        .insert_header(bearer(fan.id, AccountType::Student))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Post ID is required");

    let req = test::TestRequest::post()
        .uri("/api/v1/likes")
        .insert_header(bearer(fan.id, AccountType::Student))
        .set_json(json!({ "postId": post.id }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["liked"], true);

    let req = test::TestRequest::get()
        .uri("/api/v1/feed")
        .insert_header(bearer(fan.id, AccountType::Student))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["id"], post.id.to_string());
    assert_eq!(body["data"][0]["userHasLiked"], true);
    assert_eq!(body["data"][0]["likeCount"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/notifications/unread-count")
        .insert_header(bearer(admin.id, AccountType::Admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["unreadCount"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/notifications?page=1&limit=10")
        .insert_header(bearer(admin.id, AccountType::Admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let entry = &body["data"]["notifications"][0];
    assert_eq!(entry["type"], "post_liked");
    assert_eq!(entry["referenceModel"], "Post");
    assert_eq!(entry["sender"]["name"], "Fan Tester");
    assert_eq!(body["data"]["totalPages"], 1);

    let req = test::TestRequest::post()
        .uri("/api/v1/notifications/mark-read")
        .insert_header(bearer(admin.id, AccountType::Admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "All unread notifications marked as read");

    let req = test::TestRequest::get()
        .uri("/api/v1/notifications/unread-count")
        .insert_header(bearer(admin.id, AccountType::Admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["unreadCount"], 0);
}

#[actix_web::test]
async fn test_admin_routes_check_the_stored_role() {
    let ctx = context();
    let admin = seed_user(&ctx.repos, "Admin", AccountType::Admin).await;
    let student = seed_user(&ctx.repos, "Student", AccountType::Student).await;
    let post = seed_post(&ctx.repos, admin.id, "Announcement", 1).await;
    let app = app!(ctx);

    // A forged Admin claim does not help a stored Student
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{}/status", post.id))
        .insert_header(bearer(student.id, AccountType::Admin))
        .set_json(json!({ "isPinned": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{}/status", post.id))
        .insert_header(bearer(admin.id, AccountType::Admin))
        .set_json(json!({ "isPinned": true }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["isPinned"], true);
    assert_eq!(body["data"]["isBoosted"], false);

    let req = test::TestRequest::put()
        .uri("/api/v1/posts/pinned-order")
        .insert_header(bearer(admin.id, AccountType::Admin))
        .set_json(json!({ "rankedPinned": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri("/api/v1/posts/pinned-order")
        .insert_header(bearer(admin.id, AccountType::Admin))
        .set_json(json!({ "rankedPinned": [{ "postId": post.id, "rank": 1 }] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/users/count")
        .insert_header(bearer(admin.id, AccountType::Admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["count"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/not-a-uuid")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_otp_round_trip() {
    let ctx = context();
    let sms = ctx.sms.clone();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/send")
        .set_json(json!({ "phone": "12345" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/send")
        .set_json(json!({ "phone": "+919876543210" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let code = sms.last_code().unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/otp/verify")
        .set_json(json!({ "phone": "+919876543210", "code": "000000" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let verify = || {
        test::TestRequest::post()
            .uri("/api/v1/otp/verify")
            .set_json(json!({ "phone": "+919876543210", "code": code }))
            .to_request()
    };
    let resp = test::call_service(&app, verify()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(&app, verify()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid or expired OTP");
}

#[actix_web::test]
async fn test_login_with_stale_cookie_succeeds() {
    let ctx = context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/signup")
        .set_json(json!({
            "firstName": "Ravi",
            "lastName": "Iyer",
            "email": "ravi@pariksha.dev",
            "password": "correct-horse"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let user_id: Uuid = body["data"]["user"]["id"].as_str().unwrap().parse().unwrap();

    let expired = crypto_core::jwt::generate_token(
        user_id,
        "ravi@pariksha.dev",
        "Student",
        chrono::Duration::hours(-2),
    )
    .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .cookie(Cookie::new("token", expired.clone()))
        .set_json(json!({ "email": "ravi@pariksha.dev", "password": "correct-horse" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // The stale cookie still does not authenticate protected routes
    let req = test::TestRequest::get()
        .uri("/api/v1/feed")
        .cookie(Cookie::new("token", expired))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
