use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crate::app::services::{AccountError, RoleError};

/// `{code, message, details}` body used by the authentication endpoints.
pub fn error_response(status: StatusCode, details: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "code": status.as_u16(),
            "message": status.canonical_reason().unwrap_or("Error"),
            "details": details.into(),
        })),
    )
        .into_response()
}

/// `{message}` body used by the role-management endpoints.
pub fn message_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({ "message": message.into() })),
    )
        .into_response()
}

pub fn account_error_to_response(err: AccountError) -> axum::response::Response {
    match err {
        AccountError::UsernameTaken => {
            error_response(StatusCode::BAD_REQUEST, "User already exists")
        }
        AccountError::EmailTaken => {
            error_response(StatusCode::BAD_REQUEST, "Email already exists")
        }
        AccountError::InvalidRegistration(msg) => error_response(StatusCode::BAD_REQUEST, msg),
        AccountError::InvalidCredentials => {
            error_response(StatusCode::UNAUTHORIZED, "Invalid email or password")
        }
        AccountError::InvalidRefreshToken => {
            error_response(StatusCode::UNAUTHORIZED, "Invalid refresh token")
        }
        AccountError::Internal(msg) => {
            tracing::error!(error = %msg, "account operation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

pub fn role_error_to_response(err: RoleError) -> axum::response::Response {
    match err {
        RoleError::RoleExists => message_response(StatusCode::BAD_REQUEST, "Role already exists"),
        RoleError::RoleNotFound => message_response(StatusCode::NOT_FOUND, "Role not found"),
        RoleError::UserNotFound => message_response(StatusCode::NOT_FOUND, "User not found"),
        RoleError::PermissionNotFound => {
            message_response(StatusCode::NOT_FOUND, "Permission not found")
        }
        RoleError::Internal(msg) => {
            tracing::error!(error = %msg, "role operation failed");
            message_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}
