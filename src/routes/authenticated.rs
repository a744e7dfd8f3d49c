use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Handlers here take a `Principal` argument, which only the gate middleware provides.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/me
        // Returns the decoded identity of the caller.
        .route("/api/me", get(handlers::me))
}
