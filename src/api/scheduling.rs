//! Scheduling function endpoint.

use super::error::AppError;
use crate::assistant::{SchedulingRequest, Suggestion};
use crate::server::state::AppState;
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

/// `POST /functions/smart-scheduling` request body.
#[derive(Debug, Deserialize)]
pub struct SchedulingBody {
    /// Free-form event type, e.g. `corporate` or `party`
    #[serde(rename = "eventType")]
    pub event_type: String,
    /// Expected duration in hours
    pub duration: Option<u32>,
    /// Expected headcount
    #[serde(rename = "expectedAttendees")]
    pub expected_attendees: Option<u32>,
    /// Free-form preferences
    pub preferences: Option<String>,
}

/// `POST /functions/smart-scheduling` response body.
#[derive(Debug, Serialize)]
pub struct SchedulingResponse {
    /// Suggested slots
    pub suggestions: Vec<Suggestion>,
}

/// `POST /functions/smart-scheduling`
///
/// # Errors
///
/// Fails when the store is unreachable; completion failures silently
/// downgrade to rule-based suggestions.
pub async fn smart_scheduling(
    State(state): State<AppState>,
    Json(body): Json<SchedulingBody>,
) -> Result<Json<SchedulingResponse>, AppError> {
    let suggestions = state
        .scheduling
        .suggest(SchedulingRequest {
            event_type: body.event_type,
            duration_hours: body.duration,
            expected_attendees: body.expected_attendees,
            preferences: body.preferences,
        })
        .await?;

    Ok(Json(SchedulingResponse { suggestions }))
}
