use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a credential. Everything here must sit outside the API
/// root or under a public prefix, otherwise the gate will still demand a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(handlers::health))
        // POST /api/auth/login
        // Exchanges an email/password pair for a bearer credential.
        .route("/api/auth/login", post(handlers::login))
        // POST /api/auth/register
        .route("/api/auth/register", post(handlers::register))
}
