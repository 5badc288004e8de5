//! Domain error to HTTP response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use super::common::ApiResponse;
use crate::domain::DomainError;

/// Handler error carrying the status and code it renders with.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "INVALID_TOKEN", message)
    }

    pub fn timeout() -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            "TIMEOUT",
            "The request did not complete in time",
        )
    }

    /// Reset-password variant: an unknown reset token is bad input, not
    /// a failed authentication.
    pub fn from_reset(err: DomainError) -> Self {
        match err {
            DomainError::InvalidToken => Self::new(
                StatusCode::BAD_REQUEST,
                "INVALID_TOKEN",
                "Invalid or expired reset token",
            ),
            other => other.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::Validation { field, reason } => Self::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("{}: {}", field, reason),
            ),
            DomainError::PasswordPolicy(violation) => Self::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("password: {}", violation),
            ),
            DomainError::DuplicateEmail => {
                Self::new(StatusCode::CONFLICT, "DUPLICATE_EMAIL", err.to_string())
            }
            DomainError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", err.to_string())
            }
            DomainError::InvalidToken => Self::unauthorized(err.to_string()),
            DomainError::TokenExpired => {
                Self::new(StatusCode::BAD_REQUEST, "TOKEN_EXPIRED", err.to_string())
            }
            DomainError::TokenUsed => {
                Self::new(StatusCode::BAD_REQUEST, "TOKEN_USED", err.to_string())
            }
            DomainError::UserNotFound => {
                Self::new(StatusCode::NOT_FOUND, "USER_NOT_FOUND", err.to_string())
            }
            DomainError::DeadlineExceeded => Self::timeout(),
            DomainError::Signing | DomainError::EmailDelivery(_) | DomainError::Storage(_) => {
                error!(error = %err, source = ?std::error::Error::source(&err), "Request failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.code, self.message);
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
