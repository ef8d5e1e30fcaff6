//! Administrator account management.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    AppState,
    api::models::{
        auth::MessageResponse,
        users::{Role, RoleUpdateRequest, UserResponse},
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Repository, Users, users::UserFilter},
        models::users::UserUpdateDBRequest,
    },
    errors::Error,
    types::UserId,
};

fn user_not_found(id: UserId) -> Error {
    Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    }
}

/// List every account
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<Json<Vec<UserResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let users = Users::new(&mut conn).list(&UserFilter::default()).await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Change another user's role
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/role",
    request_body = RoleUpdateRequest,
    tag = "admin",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Role updated", body = MessageResponse),
        (status = 400, description = "Own account or unknown role"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    permission: RequiresPermission<resource::Users, operation::UpdateAll>,
    body: Result<Json<RoleUpdateRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, Error> {
    let Json(request) = body?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let target = users.get_by_id(id).await?.ok_or_else(|| user_not_found(id))?;
    if target.id == permission.user.id {
        return Err(Error::bad_request("Error: Admin cannot change their own role!"));
    }

    let role: Role = request
        .role
        .trim()
        .parse()
        .map_err(|_| Error::bad_request("Error: Invalid role specified!"))?;

    users
        .update(
            id,
            &UserUpdateDBRequest {
                role: Some(role),
                ..Default::default()
            },
        )
        .await?;
    tracing::info!(target_user = id, %role, "role updated by admin");

    Ok(Json(MessageResponse::new("User role updated successfully!")))
}

/// Delete another user's account
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    tag = "admin",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Own account"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    permission: RequiresPermission<resource::Users, operation::DeleteAll>,
) -> Result<Json<MessageResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    users.get_by_id(id).await?.ok_or_else(|| user_not_found(id))?;
    if id == permission.user.id {
        return Err(Error::bad_request("Error: Admin cannot delete themselves!"));
    }

    if !users.delete(id).await? {
        return Err(user_not_found(id));
    }

    Ok(Json(MessageResponse::new("User deleted successfully!")))
}
