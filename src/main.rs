use std::{process::ExitCode, sync::Arc};

use api_gate::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{DirectoryState, InMemoryDirectory},
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, builds the shared state, and serves HTTP.
/// A missing or empty `JWT_SECRET` stops the process before any listener is bound.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            // Logging is not up yet: its format depends on the config we failed to load.
            eprintln!("FATAL: invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    // 2. Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "api_gate=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. User directory
    let directory = match InMemoryDirectory::with_users(&config.seed_users) {
        Ok(directory) => Arc::new(directory) as DirectoryState,
        Err(err) => {
            tracing::error!(error = %err, "failed to hash seed account passwords");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(accounts = config.seed_users.len(), "user directory seeded");

    // 4. State, router, server
    let bind_addr = config.bind_addr();
    let app = create_router(AppState::new(config, directory));

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, addr = %bind_addr, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "server terminated with an error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
