use std::sync::Arc;

use crate::aggregation::Aggregator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Sources and scorer are fixed at startup; one aggregator serves every request.
    pub aggregator: Arc<Aggregator>,
}
