use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Input payload for `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RegisterRequest
///
/// Input payload for `POST /api/auth/register`. The password must be at least
/// `MIN_PASSWORD_LEN` characters long.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

pub const MIN_PASSWORD_LEN: usize = 8;

// --- Response Schemas ---

/// TokenResponse
///
/// Returned by login and registration. `expires_at` mirrors the token's `exp` claim
/// (seconds since the Unix epoch) so clients can schedule a re-login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
    pub expires_at: i64,
}

/// MessageResponse
///
/// The `{ "message": ... }` body used by every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

// --- Directory Records ---

/// User
///
/// An account known to the user directory. `id` is the principal id carried in tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
}

/// SeedUser
///
/// One entry of the `AUTH_USERS` JSON array. When `id` is omitted a UUID is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub id: Option<String>,
}
