//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// Account role. Stored as the Postgres `user_role` enum and serialized with its
/// `ROLE_*` name on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    #[sqlx(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_MANAGER")]
    #[sqlx(rename = "ROLE_MANAGER")]
    Manager,
    #[serde(rename = "ROLE_ADMIN")]
    #[sqlx(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_SUBWAY")]
    #[sqlx(rename = "ROLE_SUBWAY")]
    Subway,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Manager => "ROLE_MANAGER",
            Role::Admin => "ROLE_ADMIN",
            Role::Subway => "ROLE_SUBWAY",
        }
    }

    /// Map the short role names accepted at registration ("admin", "manager", "subway").
    /// Anything unrecognised becomes a plain user.
    pub fn from_signup_name(name: &str) -> Self {
        match name {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            "subway" => Role::Subway,
            _ => Role::User,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_USER" => Ok(Role::User),
            "ROLE_MANAGER" => Ok(Role::Manager),
            "ROLE_ADMIN" => Ok(Role::Admin),
            "ROLE_SUBWAY" => Ok(Role::Subway),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// User as listed by the admin endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// The authenticated principal of a request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Body of `PUT /api/admin/users/{id}/role`. The role is validated by the handler so an
/// unknown value produces a readable error rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RoleUpdateRequest {
    pub role: String,
}

/// Account fields used by the `/api/users` management endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

/// Body of `PUT /api/users`: `user` names the account, `newUser` carries the new values
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserEditRequest {
    pub user: UserDto,
    pub new_user: UserDto,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailRequest {
    pub password: String,
    pub new_email: String,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            role: db.role,
        }
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            role: db.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"ROLE_MANAGER\"");
        let role: Role = serde_json::from_str("\"ROLE_SUBWAY\"").unwrap();
        assert_eq!(role, Role::Subway);
        assert!(serde_json::from_str::<Role>("\"ROLE_ROOT\"").is_err());
    }

    #[test]
    fn test_role_from_str_round_trips_display() {
        for role in [Role::User, Role::Manager, Role::Admin, Role::Subway] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_signup_role_mapping() {
        assert_eq!(Role::from_signup_name("admin"), Role::Admin);
        assert_eq!(Role::from_signup_name("manager"), Role::Manager);
        assert_eq!(Role::from_signup_name("subway"), Role::Subway);
        assert_eq!(Role::from_signup_name("user"), Role::User);
        assert_eq!(Role::from_signup_name("ADMIN"), Role::User);
    }

    #[test]
    fn test_user_edit_request_shape() {
        let body: UserEditRequest = serde_json::from_str(
            r#"{"user": {"userName": "alice"}, "newUser": {"userName": "alicia", "email": "a@x.com"}}"#,
        )
        .unwrap();
        assert_eq!(body.user.user_name.as_deref(), Some("alice"));
        assert_eq!(body.new_user.user_name.as_deref(), Some("alicia"));
        assert!(body.new_user.password.is_none());
    }
}
