pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::aggregation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/jobs/search", post(handlers::handle_search))
        .with_state(state)
}
