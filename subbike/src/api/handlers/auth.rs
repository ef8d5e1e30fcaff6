use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    AppState,
    api::models::{
        auth::{JwtResponse, LoginRequest, LoginResponse, LogoutResponse, MessageResponse, RegisterRequest, SendCodeRequest},
        users::CurrentUser,
    },
    auth::{
        password::{self, Argon2Params},
        session,
    },
    config::Config,
    db::{
        handlers::{Repository, Users, VerificationCodes},
        models::users::UserCreateDBRequest,
    },
    email::EmailService,
    errors::Error,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Email a registration verification code
#[utoipa::path(
    post,
    path = "/api/auth/send-code",
    request_body = SendCodeRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 400, description = "Missing or invalid email"),
        (status = 500, description = "Mail delivery failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn send_code(
    State(state): State<AppState>,
    body: Result<Json<SendCodeRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let Json(request) = body?;
    let email = request.email.trim();
    if email.is_empty() {
        return Err(Error::bad_request("Error: Email is required!"));
    }

    let email_service = EmailService::new(&state.config)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let code = VerificationCodes::new(&mut conn)
        .issue_for_email(email, state.config.auth.verification_code_ttl)
        .await?;

    email_service.send_verification_code(email, &code.code).await?;

    Ok(Json(MessageResponse::new("Verification code sent successfully!")))
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = JwtResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<LoginResponse, Error> {
    let Json(request) = body?;
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut pool_conn);

    let user = user_repo
        .get_user_by_username(&request.username)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some(INVALID_CREDENTIALS.to_string()),
        })?;

    let is_valid = password::verify_blocking(request.password, user.password_hash.clone()).await?;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some(INVALID_CREDENTIALS.to_string()),
        });
    }

    issue_session(CurrentUser::from(user), &state.config)
}

/// Register a new account with an emailed verification code
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Registered and logged in", body = JwtResponse),
        (status = 400, description = "Duplicate account, bad code or invalid password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<LoginResponse, Error> {
    let Json(request) = body?;
    if !state.config.auth.allow_registration {
        return Err(Error::bad_request("User registration is disabled"));
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    {
        let mut user_repo = Users::new(&mut tx);
        if user_repo.exists_by_username(&request.username).await? {
            return Err(Error::bad_request("Error: Username is already taken!"));
        }
        if user_repo.exists_by_email(&request.email).await? {
            return Err(Error::bad_request("Error: Email is already in use!"));
        }
    }

    if !VerificationCodes::new(&mut tx).verify(&request.email, &request.verification_code).await? {
        return Err(Error::bad_request("Error: Invalid or expired verification code!"));
    }

    let password_config = &state.config.auth.password;
    password::validate_password_length(&request.password, password_config)?;

    let password_hash = password::hash_blocking(request.password.clone(), Argon2Params::from(password_config)).await?;

    let create_request = UserCreateDBRequest {
        username: request.username.clone(),
        email: request.email.clone(),
        password_hash,
        role: request.requested_role(),
    };
    let created_user = Users::new(&mut tx).create(&create_request).await?;

    // Codes are single use
    VerificationCodes::new(&mut tx).delete_for_email(&request.email).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;
    tracing::info!(user_id = created_user.id, role = %created_user.role, "registered new user");

    issue_session(CurrentUser::from(created_user), &state.config)
}

/// Logout (clear session cookie)
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    let cookie = session_cookie("", 0, &state.config);

    Ok(LogoutResponse {
        body: MessageResponse::new("Logout successful"),
        cookie,
    })
}

fn issue_session(user: CurrentUser, config: &Config) -> Result<LoginResponse, Error> {
    let token = session::create_session_token(&user, config)?;
    let cookie = session_cookie(&token, config.auth.security.jwt_expiry.as_secs(), config);

    Ok(LoginResponse {
        body: JwtResponse::new(token, &user),
        cookie,
    })
}

fn session_cookie(value: &str, max_age: u64, config: &Config) -> String {
    let session_config = &config.auth.session;
    let secure = if session_config.cookie_secure { "; Secure" } else { "" };

    format!(
        "{}={}; Path=/; HttpOnly{}; SameSite={}; Max-Age={}",
        session_config.cookie_name, value, secure, session_config.cookie_same_site, max_age
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::models::users::Role,
        test_utils::{TEST_PASSWORD, create_test_app, create_test_config, create_test_user},
    };
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;
    use std::time::Duration;

    async fn issue_code(pool: &PgPool, email: &str) -> String {
        let mut conn = pool.acquire().await.unwrap();
        VerificationCodes::new(&mut conn)
            .issue_for_email(email, Duration::from_secs(600))
            .await
            .unwrap()
            .code
    }

    #[test]
    fn test_session_cookie_flags() {
        let mut config = create_test_config();
        assert_eq!(
            session_cookie("abc", 60, &config),
            "subbike_session=abc; Path=/; HttpOnly; SameSite=lax; Max-Age=60"
        );

        config.auth.session.cookie_secure = true;
        assert!(session_cookie("abc", 60, &config).contains("; Secure;"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_send_code_stores_code(pool: PgPool) {
        let server = create_test_app(pool.clone()).await;

        let response = server.post("/api/auth/send-code").json(&json!({"email": "new@example.com"})).await;
        response.assert_status_ok();
        response.assert_json(&json!({"message": "Verification code sent successfully!"}));

        let mut conn = pool.acquire().await.unwrap();
        let stored = VerificationCodes::new(&mut conn).get_by_email("new@example.com").await.unwrap().unwrap();
        assert_eq!(stored.code.len(), 6);
        assert!(!stored.is_expired());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_send_code_requires_email(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.post("/api/auth/send-code").json(&json!({"email": "  "})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_body_fields_are_bad_requests(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.post("/api/auth/send-code").json(&json!({})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("email"));

        let response = server
            .post("/api/auth/register")
            .json(&json!({"username": "nocode", "email": "nocode@example.com", "password": "secret1"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("verificationCode"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_success_sets_cookie(pool: PgPool) {
        let user = create_test_user(&pool, Role::Manager).await;
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/auth/login")
            .json(&json!({"username": user.username, "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap().to_string();
        assert!(cookie.starts_with("subbike_session="));

        let body: JwtResponse = response.json();
        assert_eq!(body.token_type, "Bearer");
        assert_eq!(body.id, user.id);
        assert_eq!(body.role, Role::Manager);

        // The token authenticates subsequent requests
        let verified = session::verify_session_token(&body.token, &create_test_config()).unwrap();
        assert_eq!(verified.username, user.username);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_rejects_bad_credentials(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let server = create_test_app(pool).await;

        for body in [
            json!({"username": user.username, "password": "wrong-password"}),
            json!({"username": "nobody", "password": TEST_PASSWORD}),
        ] {
            let response = server.post("/api/auth/login").json(&body).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            response.assert_json(&json!({"message": "Invalid username or password"}));
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_with_code(pool: PgPool) {
        let code = issue_code(&pool, "rider@example.com").await;
        let server = create_test_app(pool.clone()).await;

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "username": "rider",
                "email": "rider@example.com",
                "password": "secret1",
                "role": ["manager"],
                "verificationCode": code,
            }))
            .await;

        response.assert_status_ok();
        let body: JwtResponse = response.json();
        assert_eq!(body.username, "rider");
        assert_eq!(body.role, Role::Manager);

        // The code is consumed
        let mut conn = pool.acquire().await.unwrap();
        assert!(VerificationCodes::new(&mut conn).get_by_email("rider@example.com").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_defaults_to_user_role(pool: PgPool) {
        let code = issue_code(&pool, "plain@example.com").await;
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "username": "plain",
                "email": "plain@example.com",
                "password": "secret1",
                "role": "conductor",
                "verificationCode": code,
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["role"], "ROLE_USER");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_rejections(pool: PgPool) {
        let existing = create_test_user(&pool, Role::User).await;
        let code = issue_code(&pool, "fresh@example.com").await;
        let server = create_test_app(pool).await;

        let cases = [
            (
                json!({"username": existing.username, "email": "fresh@example.com", "password": "secret1", "verificationCode": code}),
                "Error: Username is already taken!",
            ),
            (
                json!({"username": "fresh", "email": existing.email, "password": "secret1", "verificationCode": code}),
                "Error: Email is already in use!",
            ),
            (
                json!({"username": "fresh", "email": "fresh@example.com", "password": "secret1", "verificationCode": "000000x"}),
                "Error: Invalid or expired verification code!",
            ),
            (
                json!({"username": "fresh", "email": "fresh@example.com", "password": "123", "verificationCode": code}),
                "Password must be between 6 and 40 characters",
            ),
        ];

        for (body, message) in cases {
            let response = server.post("/api/auth/register").json(&body).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            response.assert_json(&json!({ "message": message }));
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_with_expired_code(pool: PgPool) {
        {
            let mut conn = pool.acquire().await.unwrap();
            VerificationCodes::new(&mut conn)
                .issue_for_email("late@example.com", Duration::from_secs(600))
                .await
                .unwrap();
        }
        sqlx::query("UPDATE verification_codes SET expiry_date = NOW() - INTERVAL '1 minute' WHERE email = $1")
            .bind("late@example.com")
            .execute(&pool)
            .await
            .unwrap();
        let code: String = sqlx::query_scalar("SELECT code FROM verification_codes WHERE email = $1")
            .bind("late@example.com")
            .fetch_one(&pool)
            .await
            .unwrap();

        let server = create_test_app(pool).await;
        let response = server
            .post("/api/auth/register")
            .json(&json!({"username": "late", "email": "late@example.com", "password": "secret1", "verificationCode": code}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"message": "Error: Invalid or expired verification code!"}));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_logout_expires_cookie(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.post("/api/auth/logout").await;
        response.assert_status_ok();
        let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(cookie.contains("subbike_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
