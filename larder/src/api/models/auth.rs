//! API request/response models for authentication.

use super::users::UserResponse;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub message: String,
}

/// Successful registration: 201 with the session cookie set
#[derive(Debug)]
pub struct RegisterResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for RegisterResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::CREATED,
            [(header::SET_COOKIE, self.cookie)],
            axum::Json(self.auth_response),
        )
            .into_response()
    }
}

/// Successful login: 200 with the session cookie set
#[derive(Debug)]
pub struct LoginResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(header::SET_COOKIE, self.cookie)], axum::Json(self.auth_response)).into_response()
    }
}

/// Successful logout: 200 with the session cookie cleared
#[derive(Debug)]
pub struct LogoutResponse {
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::SET_COOKIE, self.cookie)],
            axum::Json(serde_json::json!({ "message": "Logged out" })),
        )
            .into_response()
    }
}
