//! API Routes
//!
//! Assembles the endpoints mounted under `API_URL`.

use axum::{extract::State, routing::get, Json, Router};

use crate::notifier::StatusSnapshot;

use super::{categories, products, AppState};

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .route("/notifier/status", get(notifier_status))
}

/// Change notifier counters and subscription state
async fn notifier_status(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.notifier.snapshot())
}
