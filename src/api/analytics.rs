//! Dashboard analytics endpoint.

use super::error::AppError;
use crate::analytics::{AnalyticsSummary, summarize};
use crate::server::state::AppState;
use axum::{Json, extract::State};

/// `GET /api/analytics`
///
/// Aggregates all events and guests into dashboard numbers.
///
/// # Errors
///
/// Fails when the store is unreachable.
pub async fn get_analytics(
    State(state): State<AppState>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let events = state.event_store.list_events().await.map_err(crate::error::EventHubError::from)?;
    let guests = state.event_store.list_guests(None).await.map_err(crate::error::EventHubError::from)?;
    Ok(Json(summarize(&events, &guests)))
}
