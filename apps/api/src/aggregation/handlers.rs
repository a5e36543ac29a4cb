//! Axum route handlers for the job search API.

use axum::{extract::State, Json};

use crate::aggregation::AggregationResult;
use crate::errors::AppError;
use crate::models::AggregationRequest;
use crate::state::AppState;

/// POST /api/v1/jobs/search
///
/// Aggregates postings from every configured source for the given profile and
/// returns them deduplicated and ranked by match score.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<AggregationRequest>,
) -> Result<Json<AggregationResult>, AppError> {
    let result = state.aggregator.aggregate(&request).await?;
    Ok(Json(result))
}
