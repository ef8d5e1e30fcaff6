//! Name-addressed account management, kept for the dashboard's user admin screen.
//!
//! Accounts are identified by `userName` in the request body rather than by ID.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    AppState,
    api::models::{
        auth::MessageResponse,
        users::{Role, UserDto, UserEditRequest},
    },
    auth::{
        password::{self, Argon2Params},
        permissions::{RequiresPermission, operation, resource},
    },
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::Error,
};

const USERNAME_TAKEN: &str = "Username already exists, please choose another username";
const EMAIL_TAKEN: &str = "Email is already registered, please use another email";
const USER_MISSING: &str = "User does not exist";

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, Error> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::bad_request(format!("Error: {field} is required!"))),
    }
}

fn user_missing() -> Error {
    Error::Missing {
        message: USER_MISSING.to_string(),
    }
}

/// Create a plain user account
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserDto,
    tag = "users",
    responses(
        (status = 200, description = "User created", body = MessageResponse),
        (status = 400, description = "Missing field or duplicate account"),
        (status = 403, description = "Forbidden - admin only"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Users, operation::CreateAll>,
    body: Result<Json<UserDto>, JsonRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let Json(request) = body?;
    let username = required(&request.user_name, "userName")?;
    let email = required(&request.email, "email")?;
    let new_password = required(&request.password, "password")?;

    let password_config = &state.config.auth.password;
    password::validate_password_length(new_password, password_config)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    if users.exists_by_username(username).await? {
        return Err(Error::bad_request(USERNAME_TAKEN));
    }
    if users.exists_by_email(email).await? {
        return Err(Error::bad_request(EMAIL_TAKEN));
    }

    let password_hash = password::hash_blocking(new_password.to_string(), Argon2Params::from(password_config)).await?;
    users
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role: Role::User,
        })
        .await?;

    Ok(Json(MessageResponse::new("User registered successfully")))
}

/// Edit the account named by `user.userName`
#[utoipa::path(
    put,
    path = "/api/users",
    request_body = UserEditRequest,
    tag = "users",
    responses(
        (status = 200, description = "User updated", body = MessageResponse),
        (status = 400, description = "New username or email taken"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User does not exist"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn edit_user(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Users, operation::UpdateAll>,
    body: Result<Json<UserEditRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let Json(request) = body?;
    let current_name = required(&request.user.user_name, "userName")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let existing = users.get_user_by_username(current_name).await?.ok_or_else(user_missing)?;

    let new_user = &request.new_user;
    let new_name = new_user.user_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let new_email = new_user.email.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let new_password = new_user.password.as_deref().filter(|s| !s.is_empty());

    if let Some(name) = new_name {
        if name != existing.username && users.exists_by_username(name).await? {
            return Err(Error::bad_request(USERNAME_TAKEN));
        }
    }
    if let Some(email) = new_email {
        if email != existing.email && users.exists_by_email(email).await? {
            return Err(Error::bad_request(EMAIL_TAKEN));
        }
    }

    let password_hash = match new_password {
        Some(p) => {
            let password_config = &state.config.auth.password;
            password::validate_password_length(p, password_config)?;
            Some(password::hash_blocking(p.to_string(), Argon2Params::from(password_config)).await?)
        }
        None => None,
    };

    users
        .update(
            existing.id,
            &UserUpdateDBRequest {
                username: new_name.map(str::to_string),
                email: new_email.map(str::to_string),
                password_hash,
                role: None,
            },
        )
        .await?;

    Ok(Json(MessageResponse::new("User updated successfully")))
}

/// Delete the account named by `userName`
#[utoipa::path(
    delete,
    path = "/api/users",
    request_body = UserDto,
    tag = "users",
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User does not exist"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Users, operation::DeleteAll>,
    body: Result<Json<UserDto>, JsonRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let Json(request) = body?;
    let username = required(&request.user_name, "userName")?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let existing = users.get_user_by_username(username).await?.ok_or_else(user_missing)?;
    users.delete(existing.id).await?;

    Ok(Json(MessageResponse::new("User deleted successfully")))
}
