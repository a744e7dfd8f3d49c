use std::{any::Any, sync::Arc};

use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::{HeaderName, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

pub mod routes;
use routes::{
    authenticated, public,
    policy::{RouteClass, RoutePolicy},
};

// --- Public Re-exports ---

pub use auth::{Principal, RequestGate, TokenIssuer};
pub use config::AppConfig;
pub use error::{ApiError, AuthError, ConfigError};
pub use repository::{DirectoryState, InMemoryDirectory, UserDirectory};

/// ApiDoc
///
/// OpenAPI document for the service, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::login, handlers::register, handlers::me),
    components(
        schemas(
            models::LoginRequest, models::RegisterRequest, models::TokenResponse,
            models::MessageResponse, auth::Principal,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "api-gate", description = "Bearer-token authentication gateway")
    )
)]
struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// AppState
///
/// Everything a request may need, built once at startup and shared read-only. The
/// issuer and the gate are constructed from the same validated secret.
#[derive(Clone)]
pub struct AppState {
    pub directory: DirectoryState,
    pub issuer: Arc<TokenIssuer>,
    pub gate: Arc<RequestGate>,
    pub routes: Arc<RoutePolicy>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, directory: DirectoryState) -> Self {
        Self {
            directory,
            issuer: Arc::new(TokenIssuer::new(&config.jwt_secret)),
            gate: Arc::new(RequestGate::new(&config.jwt_secret)),
            routes: Arc::new(RoutePolicy::new(&config.api_root, &config.public_prefixes)),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for DirectoryState {
    fn from_ref(app_state: &AppState) -> DirectoryState {
        app_state.directory.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// gate_middleware
///
/// The Request Gate as an Axum middleware. It is layered over the whole router,
/// including the 404 fallback, so it sees every request whether or not a route matched.
///
/// The flow is:
/// 1. Classification: `RoutePolicy` decides whether the path is public or protected.
/// 2. Public Bypass: public paths go straight to their handler and the gate never runs.
/// 3. Credential Check: `RequestGate::authenticate` validates the `Authorization` header.
/// 4. Admission: the decoded `Principal` is attached to the request extensions, where
///    the `Principal` extractor finds it, and the handler runs.
///
/// Rejection: the `AuthError` is turned into the terminal 401/403 response here and
/// `next` is never called, so no handler runs after a rejection.
pub async fn gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // 1. Classification
    // 2. Public Bypass
    if state.routes.classify(request.uri().path()) == RouteClass::Public {
        return next.run(request).await;
    }

    // 3. Credential Check
    // A header that is not valid UTF-8 is treated the same as a missing one.
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.gate.authenticate(authorization) {
        // 4. Admission
        Ok(principal) => {
            tracing::debug!(principal = %principal.id, "credential accepted");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        // Rejection: log the reason and path, never the token itself.
        Err(err) => {
            tracing::warn!(
                path = %request.uri().path(),
                status = err.status().as_u16(),
                reason = %err,
                "request rejected by gate"
            );
            err.into_response()
        }
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies the gate and the
/// observability stack, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 1. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI and the OpenAPI JSON. Outside the API root, so public.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: health probe, login, registration.
        .merge(public::public_routes())
        // Authenticated Routes: handlers that take a `Principal`.
        .merge(authenticated::authenticated_routes())
        // Fallback: JSON 404 for anything unmatched.
        .fallback(handlers::not_found)
        // 2. Request Gate
        // `layer` (not `route_layer`) so the fallback is covered too: an unknown protected
        // path answers 401/403 before it can answer 404.
        .layer(middleware::from_fn_with_state(state.clone(), gate_middleware))
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router.layer(
        ServiceBuilder::new()
            // 3a. Request ID Generation: a UUID for every incoming request.
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            // 3b. Request Tracing: one span per request, carrying the request id.
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            // 3c. Request ID Propagation: echo x-request-id back to the client.
            .layer(PropagateRequestIdLayer::new(x_request_id))
            // 3d. Panic Safety Net: last resort for unexpected failures.
            // Auth rejections never get here; the gate answers them itself.
            .layer(catch_panic_layer()),
    )
}

/// Signature of the panic-to-response hook used by `catch_panic_layer`.
pub type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// catch_panic_layer
///
/// Converts a panicking handler into a generic 500 `{ "message": "Something went wrong!" }`
/// and logs the panic payload.
pub fn catch_panic_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(handle_panic as PanicHandler)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = %detail, "request handler panicked");

    error::message_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        error::GENERIC_FAILURE_MESSAGE.to_string(),
    )
}

/// trace_span_logger
///
/// Builds the per-request span so every log line carries method, uri and request id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
