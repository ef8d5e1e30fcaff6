//! API request/response models for authentication.

use crate::api::models::users::{CurrentUser, Role};
use crate::types::UserId;
use axum::{
    Json,
    http::header,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_with::{OneOrMany, formats::PreferMany, serde_as};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SendCodeRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Registration body. `role` accepts either a single name or a list of names;
/// only the first entry is used.
#[serde_as]
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde_as(as = "Option<OneOrMany<_, PreferMany>>")]
    #[schema(value_type = Option<Vec<String>>)]
    pub role: Option<Vec<String>>,
    pub verification_code: String,
}

impl RegisterRequest {
    pub fn requested_role(&self) -> Role {
        self.role
            .as_ref()
            .and_then(|roles| roles.first())
            .map(|name| Role::from_signup_name(name))
            .unwrap_or(Role::User)
    }
}

/// Returned by login and by a successful registration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JwtResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl JwtResponse {
    pub fn new(token: String, user: &CurrentUser) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Generic `{"message": ...}` body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Login or registration result: the JWT body plus the session cookie
pub struct LoginResponse {
    pub body: JwtResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        (AppendHeaders([(header::SET_COOKIE, self.cookie)]), Json(self.body)).into_response()
    }
}

/// Logout result: a message plus an expired session cookie
pub struct LogoutResponse {
    pub body: MessageResponse,
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        (AppendHeaders([(header::SET_COOKIE, self.cookie)]), Json(self.body)).into_response()
    }
}
