//! Resolves the authenticated user of a request.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    config::Config,
    db::{
        errors::DbError,
        handlers::{Repository, Users},
    },
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Extract a session token from the `Authorization: Bearer` header.
/// Returns:
/// - None: No Authorization header, or not a Bearer credential
/// - Some(Ok(user)): Token verified
/// - Some(Err(error)): Header present but malformed or token invalid
#[instrument(skip(parts, config))]
fn try_bearer_auth(parts: &Parts, config: &Config) -> Option<Result<CurrentUser>> {
    let auth_header = parts.headers.get(header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    let token = auth_str.strip_prefix("Bearer ")?.trim();
    Some(session::verify_session_token(token, config))
}

/// Extract a session token from the session cookie.
/// Returns:
/// - None: No session cookie present
/// - Some(Ok(user)): Valid token found
/// - Some(Err(error)): Cookie header unreadable or every session cookie invalid
#[instrument(skip(parts, config))]
fn try_cookie_auth(parts: &Parts, config: &Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.session.cookie_name;

    let mut last_error = None;
    for cookie in cookie_str.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=') {
            if name != cookie_name {
                continue;
            }
            match session::verify_session_token(value, config) {
                Ok(user) => return Some(Ok(user)),
                Err(e) => last_error = Some(e),
            }
        }
    }
    last_error.map(Err)
}

/// Reload the user behind a verified token so deleted accounts are rejected and
/// role changes apply immediately.
async fn refresh_from_db(state: &AppState, claimed: CurrentUser) -> Result<CurrentUser> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let user = Users::new(&mut conn).get_by_id(claimed.id).await?;

    match user {
        Some(user) => Ok(user.into()),
        None => Err(Error::Unauthenticated {
            message: Some("User no longer exists".to_string()),
        }),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // A bearer token takes precedence; the cookie is a fallback for browser sessions.
        let mut auth_errors = Vec::new();

        for (method, attempt) in [
            ("Bearer token", try_bearer_auth(parts, &state.config)),
            ("Session cookie", try_cookie_auth(parts, &state.config)),
        ] {
            match attempt {
                Some(Ok(claimed)) => {
                    debug!("Found {method} authenticated user: {}", claimed.id);
                    return refresh_from_db(state, claimed).await;
                }
                Some(Err(e)) => {
                    trace!("{method} authentication failed: {:?}", e);
                    auth_errors.push((method, e));
                }
                None => trace!("No {method} authentication attempted"),
            }
        }

        if auth_errors.is_empty() {
            trace!("No authentication credentials found in request");
        } else {
            trace!("All authentication attempts failed ({}): {:?}", auth_errors.len(), auth_errors);
        }
        Err(Error::Unauthenticated { message: None })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        AppState,
        api::models::users::{CurrentUser, Role},
        auth::session::create_session_token,
        db::handlers::{Repository, Users},
        test_utils::{create_test_config, create_test_user},
    };
    use axum::{extract::FromRequestParts as _, http::StatusCode, http::request::Parts};
    use sqlx::PgPool;

    fn parts_with_header(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    fn state(pool: &PgPool) -> AppState {
        AppState::builder().db(pool.clone()).config(create_test_config()).build()
    }

    #[sqlx::test]
    async fn test_bearer_token_extraction(pool: PgPool) {
        let state = state(&pool);
        let user = create_test_user(&pool, Role::Manager).await;
        let token = create_session_token(&user, &state.config).unwrap();

        let mut parts = parts_with_header("authorization", &format!("Bearer {token}"));
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();

        assert_eq!(current.id, user.id);
        assert_eq!(current.role, Role::Manager);
    }

    #[sqlx::test]
    async fn test_cookie_extraction(pool: PgPool) {
        let state = state(&pool);
        let user = create_test_user(&pool, Role::User).await;
        let token = create_session_token(&user, &state.config).unwrap();
        let cookie_name = &state.config.auth.session.cookie_name;

        let mut parts = parts_with_header("cookie", &format!("theme=dark; {cookie_name}={token}"));
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();

        assert_eq!(current.username, user.username);
    }

    #[sqlx::test]
    async fn test_role_is_reloaded_from_database(pool: PgPool) {
        let state = state(&pool);
        let user = create_test_user(&pool, Role::User).await;
        let token = create_session_token(&user, &state.config).unwrap();

        sqlx::query("UPDATE users SET role = 'ROLE_ADMIN' WHERE id = $1")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        let mut parts = parts_with_header("authorization", &format!("Bearer {token}"));
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.role, Role::Admin);
    }

    #[sqlx::test]
    async fn test_deleted_user_rejected(pool: PgPool) {
        let state = state(&pool);
        let user = create_test_user(&pool, Role::User).await;
        let token = create_session_token(&user, &state.config).unwrap();

        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn).delete(user.id).await.unwrap();

        let mut parts = parts_with_header("authorization", &format!("Bearer {token}"));
        let error = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_invalid_bearer_returns_unauthorized(pool: PgPool) {
        let state = state(&pool);

        let mut parts = parts_with_header("authorization", "Bearer not-a-jwt");
        let error = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_missing_credentials_returns_unauthorized(pool: PgPool) {
        let state = state(&pool);
        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let error = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }
}
