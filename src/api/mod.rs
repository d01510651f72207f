//! API module
//!
//! HTTP API endpoints and middleware.

pub mod categories;
pub mod middleware;
pub mod products;
pub mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
