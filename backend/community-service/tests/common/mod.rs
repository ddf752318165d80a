#![allow(dead_code)]

use chrono::{Duration, Utc};
use community_service::models::{AccountType, Post, User};
use community_service::repository::Repositories;
use uuid::Uuid;

pub fn user(first_name: &str, account_type: AccountType) -> User {
    User {
        id: Uuid::new_v4(),
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        email: format!("{}-{}@pariksha.dev", first_name.to_lowercase(), Uuid::new_v4()),
        password_hash: String::new(),
        account_type,
        image_url: None,
        phone: None,
        created_at: Utc::now(),
    }
}

pub async fn seed_user(repos: &Repositories, first_name: &str, account_type: AccountType) -> User {
    repos
        .users
        .insert_user(user(first_name, account_type))
        .await
        .expect("insert user")
}

/// Post created `age_minutes` ago
pub async fn seed_post(repos: &Repositories, owner: Uuid, title: &str, age_minutes: i64) -> Post {
    let mut post = Post::new(owner, title.to_string(), format!("{title} body"), None);
    post.created_at = Utc::now() - Duration::minutes(age_minutes);
    post.updated_at = post.created_at;
    repos.posts.insert_post(post).await.expect("insert post")
}
