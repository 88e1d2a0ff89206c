//! Test utilities for integration testing (available with `test-utils` feature).

use crate::api::models::users::CurrentUser;
use crate::auth::{password, session};
use crate::db::handlers::{Ingredients, Repository, Tags, Users};
use crate::db::models::{
    ingredients::{IngredientCreateDBRequest, IngredientDBResponse},
    tags::{TagCreateDBRequest, TagDBResponse},
    users::{UserCreateDBRequest, UserDBResponse},
};
use axum_test::TestServer;
use sqlx::PgPool;

/// A test configuration: throwaway secret, temp media root, registration open
pub fn create_test_config() -> crate::config::Config {
    let media_root = std::env::temp_dir().join(format!("larder-test-media-{}", std::process::id()));

    crate::config::Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        media_root,
        admin_email: "admin@test.com".to_string(),
        admin_password: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    }
}

/// Build the full application on the given pool and expose it as a TestServer
pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

/// The Cookie header value of a freshly minted session for this user
pub fn session_cookie_for(user: &UserDBResponse) -> String {
    let config = create_test_config();
    let current = CurrentUser::from(user.clone());
    let token = session::create_session_token(&current, &config).expect("Failed to create session token");
    format!("{}={}", config.auth.session.cookie_name, token)
}

pub async fn create_test_user(pool: &PgPool, email: &str, username: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            is_admin: false,
            password_hash: Some(password::hash_string("correct horse battery staple").unwrap()),
        })
        .await
        .expect("Failed to create test user")
}

pub async fn create_test_admin_user(pool: &PgPool, email: &str, username: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            username: username.to_string(),
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            is_admin: true,
            password_hash: None,
        })
        .await
        .expect("Failed to create test admin")
}

pub async fn create_test_tag(pool: &PgPool, name: &str, color: &str, slug: &str) -> TagDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    Tags::new(&mut conn)
        .create(&TagCreateDBRequest {
            name: name.to_string(),
            color: color.to_string(),
            slug: slug.to_string(),
        })
        .await
        .expect("Failed to create test tag")
}

pub async fn create_test_ingredient(pool: &PgPool, name: &str, unit: &str) -> IngredientDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    Ingredients::new(&mut conn)
        .create(&IngredientCreateDBRequest {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        })
        .await
        .expect("Failed to create test ingredient")
}
