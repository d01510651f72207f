//! storefront - E-commerce Backend API
//!
//! Serves the product catalog REST API and triggers the configured build
//! hook whenever a document in the store changes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::api::{self, AppState};
use storefront::notifier::{ChangeNotifier, HttpBuildHook};
use storefront::store::{DocumentStore, StoreConnection};
use storefront::Config;

/// Time allowed for the notifier to drain after the store closes
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

/// Initialize tracing/logging
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Build the application router
fn build_router(config: &Config, state: AppState) -> Router {
    // Axum layers are applied in reverse order (last added = first executed)
    let api_routes = api::create_router().layer(middleware::from_fn(api::middleware::logging_middleware));

    Router::new()
        // Health check
        .route("/health", axum::routing::get(health_check))
        .nest(&config.api_prefix, api_routes)
        .nest_service("/public/uploads", ServeDir::new(&config.upload_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(environment = %config.environment, "Starting storefront server");

    let store = Arc::new(StoreConnection::new(&config)?);

    // The notifier waits for the open signal before it subscribes.
    let hook = HttpBuildHook::new(config.build_hook_url.clone(), config.notifier.webhook_timeout)?;
    let notifier = ChangeNotifier::new(hook, config.notifier.clone());
    let notifier_status = notifier.status();
    let notifier = notifier.start(store.clone());

    tracing::info!("Connecting to database...");
    if let Err(e) = store.open().await {
        tracing::error!(error = %e, "Database connection failed. Please check DATABASE_URL and run migrations.");
        store.close().await;
        notifier.join().await;
        return Err(e.into());
    }

    let state = AppState::new(DocumentStore::new(store.pool().clone()), notifier_status);
    let app = build_router(&config, state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        store.close().await;
        notifier.join().await;
    })
    .await;

    if drained.is_err() {
        tracing::warn!("Change notifier did not drain in time, in-flight build hook calls dropped");
    }

    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
