//! Self-service password and email changes.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    AppState,
    api::models::{
        auth::MessageResponse,
        users::{ChangeEmailRequest, ChangePasswordRequest},
    },
    auth::{
        password::{self, Argon2Params},
        permissions::{RequiresPermission, operation, resource},
    },
    db::{
        handlers::{Repository, Users},
        models::users::{UserDBResponse, UserUpdateDBRequest},
    },
    errors::Error,
    types::UserId,
};

async fn load_self(users: &mut Users<'_>, id: UserId) -> Result<UserDBResponse, Error> {
    users.get_by_id(id).await?.ok_or_else(|| Error::Unauthenticated {
        message: Some("User not found".to_string()),
    })
}

/// Change the caller's password
#[utoipa::path(
    post,
    path = "/api/user/password",
    request_body = ChangePasswordRequest,
    tag = "profile",
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Old password incorrect or new password invalid"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    permission: RequiresPermission<resource::Profile, operation::UpdateOwn>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let Json(request) = body?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);
    let user = load_self(&mut users, permission.user.id).await?;

    if !password::verify_blocking(request.old_password, user.password_hash).await? {
        return Err(Error::bad_request("Error: Incorrect old password!"));
    }

    let password_config = &state.config.auth.password;
    password::validate_password_length(&request.new_password, password_config)?;
    let password_hash = password::hash_blocking(request.new_password, Argon2Params::from(password_config)).await?;

    users
        .update(
            user.id,
            &UserUpdateDBRequest {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(MessageResponse::new("Password updated successfully!")))
}

/// Change the caller's email address
#[utoipa::path(
    post,
    path = "/api/user/email",
    request_body = ChangeEmailRequest,
    tag = "profile",
    responses(
        (status = 200, description = "Email updated", body = MessageResponse),
        (status = 400, description = "Incorrect password, invalid or taken email"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn change_email(
    State(state): State<AppState>,
    permission: RequiresPermission<resource::Profile, operation::UpdateOwn>,
    body: Result<Json<ChangeEmailRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let Json(request) = body?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);
    let user = load_self(&mut users, permission.user.id).await?;

    if !password::verify_blocking(request.password, user.password_hash).await? {
        return Err(Error::bad_request("Error: Incorrect password!"));
    }

    let new_email = request.new_email.trim();
    if new_email.parse::<lettre::Address>().is_err() {
        return Err(Error::bad_request("Error: Invalid email format!"));
    }
    if new_email != user.email && users.exists_by_email(new_email).await? {
        return Err(Error::bad_request("Error: Email is already in use!"));
    }

    users
        .update(
            user.id,
            &UserUpdateDBRequest {
                email: Some(new_email.to_string()),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(MessageResponse::new("Email updated successfully!")))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::users::Role,
        auth::password,
        db::handlers::{Repository, Users},
        test_utils::{TEST_PASSWORD, bearer_token, create_test_app, create_test_user},
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_change_password(pool: PgPool) {
        let user = create_test_user(&pool, Role::Subway).await;
        let server = create_test_app(pool.clone()).await;
        let auth = bearer_token(&user);

        let response = server
            .post("/api/user/password")
            .add_header("authorization", &auth)
            .json(&json!({"oldPassword": "not-it", "newPassword": "brandnew1"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"message": "Error: Incorrect old password!"}));

        let response = server
            .post("/api/user/password")
            .add_header("authorization", &auth)
            .json(&json!({"oldPassword": TEST_PASSWORD, "newPassword": "brandnew1"}))
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({"message": "Password updated successfully!"}));

        let mut conn = pool.acquire().await.unwrap();
        let stored = Users::new(&mut conn).get_by_id(user.id).await.unwrap().unwrap();
        assert!(password::verify_string("brandnew1", &stored.password_hash).unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_change_password_requires_auth(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/user/password")
            .json(&json!({"oldPassword": "a", "newPassword": "brandnew1"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_change_email(pool: PgPool) {
        let user = create_test_user(&pool, Role::User).await;
        let other = create_test_user(&pool, Role::User).await;
        let server = create_test_app(pool.clone()).await;
        let auth = bearer_token(&user);

        let cases = [
            (json!({"password": "wrong", "newEmail": "new@example.com"}), "Error: Incorrect password!"),
            (json!({"password": TEST_PASSWORD, "newEmail": "not-an-email"}), "Error: Invalid email format!"),
            (json!({"password": TEST_PASSWORD, "newEmail": other.email}), "Error: Email is already in use!"),
        ];
        for (body, message) in cases {
            let response = server.post("/api/user/email").add_header("authorization", &auth).json(&body).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            response.assert_json(&json!({ "message": message }));
        }

        let response = server
            .post("/api/user/email")
            .add_header("authorization", &auth)
            .json(&json!({"password": TEST_PASSWORD, "newEmail": "new@example.com"}))
            .await;
        response.assert_status_ok();
        response.assert_json(&json!({"message": "Email updated successfully!"}));

        let mut conn = pool.acquire().await.unwrap();
        let stored = Users::new(&mut conn).get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "new@example.com");
    }
}
