//! Shared helpers for the crate's tests.

use crate::{
    api::models::users::{CurrentUser, Role},
    auth::{password, session::create_session_token},
    config::{Config, EmailConfig, EmailTransportConfig, PasswordConfig, PoolSettings},
    db::{
        handlers::{Repository, Users},
        models::{ridership::BikeAmount, users::UserCreateDBRequest},
    },
};
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

/// Password given to every user created by [`create_test_user`]
pub const TEST_PASSWORD: &str = "password123";

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    // Use temp directory for test emails
    let temp_dir = std::env::temp_dir().join(format!("subbike-test-emails-{}", std::process::id()));

    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_username: "admin".to_string(),
        admin_email: "admin@test.com".to_string(),
        admin_password: Some("admin-password".to_string()),
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        email: EmailConfig {
            transport: EmailTransportConfig::File {
                path: temp_dir.to_string_lossy().to_string(),
            },
            ..Default::default()
        },
        ..Default::default()
    };

    config.database.pool = PoolSettings {
        max_connections: 2,
        min_connections: 0,
        ..Default::default()
    };
    // Cheap hashing keeps the suite fast
    config.auth.password = PasswordConfig {
        argon2_memory_kib: 128,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..Default::default()
    };
    config.auth.session.cookie_secure = false;

    config
}

pub async fn create_test_user(pool: &PgPool, role: Role) -> CurrentUser {
    let username = format!("testuser_{}", Uuid::new_v4().simple());
    create_test_user_with_password(pool, &username, TEST_PASSWORD, role).await
}

pub async fn create_test_admin_user(pool: &PgPool) -> CurrentUser {
    let username = format!("testadmin_{}", Uuid::new_v4().simple());
    create_test_user_with_password(pool, &username, TEST_PASSWORD, Role::Admin).await
}

pub async fn create_test_user_with_password(pool: &PgPool, username: &str, password: &str, role: Role) -> CurrentUser {
    let params = (&create_test_config().auth.password).into();
    let password_hash = password::hash_string_with_params(password, Some(params)).expect("Failed to hash password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);

    let user_create = UserCreateDBRequest {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash,
        role,
    };

    let user = users_repo.create(&user_create).await.expect("Failed to create test user");
    CurrentUser::from(user)
}

/// `Authorization` header value carrying a fresh session token for `user`
pub fn bearer_token(user: &CurrentUser) -> String {
    let token = create_session_token(user, &create_test_config()).expect("Failed to create session token");
    format!("Bearer {token}")
}

/// Insert or overwrite bike counts keyed by (station, date)
pub async fn seed_bike_amounts(pool: &PgPool, rows: &[BikeAmount]) {
    for row in rows {
        sqlx::query(
            "INSERT INTO bike_amounts (station, date, number) VALUES ($1, $2, $3)
             ON CONFLICT (station, date) DO UPDATE SET number = EXCLUDED.number",
        )
        .bind(&row.station)
        .bind(row.date)
        .bind(row.number)
        .execute(pool)
        .await
        .expect("Failed to seed bike counts");
    }
}
