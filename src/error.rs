use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::MessageResponse;

/// Body returned by the last-resort handlers (panics, signing failures).
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong!";

/// AuthError
///
/// The three ways the request gate can turn a request away. The `Display` text is the
/// exact message sent to the client, so do not reword these lightly: frontends match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No usable bearer token in the `Authorization` header.
    #[error("Authentication required")]
    MissingCredential,
    /// Malformed, forged or tampered token.
    #[error("Invalid token")]
    InvalidCredential,
    /// Correctly signed, but past its `exp` claim.
    #[error("Token has expired. Please login again")]
    ExpiredCredential,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential | AuthError::ExpiredCredential => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InvalidCredential => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        message_response(self.status(), self.to_string())
    }
}

/// ApiError
///
/// Failures raised by the login and registration handlers. Gate rejections never pass
/// through here; they are answered by `AuthError` directly.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid email or password")]
    InvalidLogin,
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("{0}")]
    Validation(String),
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidLogin => message_response(StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::EmailTaken => message_response(StatusCode::CONFLICT, self.to_string()),
            ApiError::Validation(message) => message_response(StatusCode::BAD_REQUEST, message),
            ApiError::Signing(err) => {
                tracing::error!(error = %err, "failed to sign credential");
                internal_error()
            }
            ApiError::PasswordHash(err) => {
                tracing::error!(error = %err, "failed to hash password");
                internal_error()
            }
        }
    }
}

/// ConfigError
///
/// Raised by `AppConfig::load` at startup. Any of these is fatal: the process must
/// not bind a listener without a usable signing secret.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("JWT_SECRET must not be empty")]
    EmptySecret,
    #[error("PORT must be a valid port number, got {0:?}")]
    InvalidPort(String),
    #[error("AUTH_USERS is not a valid JSON account list: {0}")]
    InvalidSeedUsers(#[from] serde_json::Error),
}

fn internal_error() -> Response {
    message_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        GENERIC_FAILURE_MESSAGE.to_string(),
    )
}

pub(crate) fn message_response(status: StatusCode, message: String) -> Response {
    (status, Json(MessageResponse { message })).into_response()
}
