use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::{
    AppState,
    auth::{Principal, TOKEN_TTL_SECS},
    error::{ApiError, message_response},
    models::{
        LoginRequest, MIN_PASSWORD_LEN, MessageResponse, RegisterRequest, TokenResponse, User,
    },
};

// --- Handlers ---

/// health
///
/// [Public Route] Liveness probe for load balancers. Lives outside the API root.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// login
///
/// [Public Route] Checks the email/password pair against the user directory and, on
/// success, returns a fresh 24-hour bearer credential for the account's principal id.
///
/// *Flow*: the directory verifies the password (bcrypt), then the `TokenIssuer` mints
/// the credential. Unknown email and wrong password are deliberately indistinguishable.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credential issued", body = TokenResponse),
        (status = 401, description = "Unknown email or wrong password", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    // Step 1: Credential check against the directory.
    let user = state
        .directory
        .verify_credentials(&payload.email, &payload.password)
        .await
        .ok_or(ApiError::InvalidLogin)?;

    // Step 2: Issue the bearer credential.
    tracing::info!(principal = %user.id, "login succeeded");
    Ok(Json(issue_for(&state, &user)?))
}

/// register
///
/// [Public Route] Creates an account and logs it in straight away.
///
/// *Validation*: the email must be non-empty and the password at least
/// `MIN_PASSWORD_LEN` characters. Emails are compared case-insensitively, so
/// `A@x.com` and `a@x.com` are the same account (409 on the second attempt).
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Invalid email or password", body = MessageResponse),
        (status = 409, description = "Email already registered", body = MessageResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    // Step 1: Input validation.
    if payload.email.trim().is_empty() {
        return Err(ApiError::Validation("Email is required".to_string()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    // Step 2: Create the account (bcrypt hashing happens in the directory).
    let user = state
        .directory
        .create_user(&payload.email, &payload.password)
        .await?
        .ok_or(ApiError::EmailTaken)?;

    // Step 3: Log the new account in.
    tracing::info!(principal = %user.id, "account registered");
    Ok((StatusCode::CREATED, Json(issue_for(&state, &user)?)))
}

/// me
///
/// [Authenticated Route] Echoes the principal the gate decoded from the credential.
///
/// *Note*: the identity comes from the `Principal` extractor, which reads what
/// `gate_middleware` attached. The handler itself never looks at the header.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current principal", body = Principal),
        (status = 401, description = "Missing or expired credential", body = MessageResponse),
        (status = 403, description = "Invalid credential", body = MessageResponse)
    ),
    security(("bearer" = []))
)]
pub async fn me(principal: Principal) -> Json<Principal> {
    Json(principal)
}

/// not_found
///
/// Fallback for unmatched paths. Unknown protected paths never reach this without a
/// valid credential because the gate runs first.
pub async fn not_found() -> Response {
    message_response(StatusCode::NOT_FOUND, "Not found".to_string())
}

fn issue_for(state: &AppState, user: &User) -> Result<TokenResponse, ApiError> {
    let issued_at = chrono::Utc::now();
    let token = state.issuer.issue_at(&user.id, issued_at)?;
    Ok(TokenResponse {
        token,
        expires_at: issued_at.timestamp() + TOKEN_TTL_SECS,
    })
}
