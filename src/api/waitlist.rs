//! Waitlist function endpoint.
//!
//! `POST /functions/manage-waitlist` is an action-dispatch endpoint kept
//! wire-compatible with the clients that already call it:
//!
//! - `add_to_waitlist` answers `{"success":true,"position":N}`
//! - `promote_from_waitlist` answers `{"success":true,"promotedGuest":{..}}`
//!   on success, and HTTP 200 `{"success":false,"message":".."}` when the
//!   event is still at capacity or nobody is waiting
//! - `get_waitlist` answers `{"waitlist":[..]}`
//! - any other action answers HTTP 500 `{"error":"Invalid action"}`
//!
//! The body is dispatched manually off a raw JSON value because the unknown
//! action arm must keep that exact legacy shape.

use super::error::AppError;
use crate::error::EventHubError;
use crate::server::state::AppState;
use crate::types::{EventId, GuestCategory};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use uuid::Uuid;

/// `POST /functions/manage-waitlist`
///
/// # Errors
///
/// Malformed input and store faults surface as [`AppError`]; business
/// outcomes of the two legacy actions stay HTTP 200 by contract.
pub async fn manage_waitlist(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let action = body.get("action").and_then(Value::as_str).unwrap_or("");
    match action {
        "add_to_waitlist" => add_to_waitlist(&state, &body).await,
        "promote_from_waitlist" => promote_from_waitlist(&state, &body).await,
        "get_waitlist" => get_waitlist(&state, &body).await,
        _ => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Invalid action" })),
        )
            .into_response()),
    }
}

async fn add_to_waitlist(state: &AppState, body: &Value) -> Result<Response, AppError> {
    let event_id = event_id_from(body)?;
    let guest_data = body.get("guestData").unwrap_or(&Value::Null);
    let name = guest_data.get("name").and_then(Value::as_str).unwrap_or("");
    let email = guest_data
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or("");
    let category = guest_data
        .get("category")
        .and_then(Value::as_str)
        .and_then(GuestCategory::parse)
        .unwrap_or(GuestCategory::Regular);

    let entry = state.waitlist.join(event_id, name, email, category).await?;
    Ok(Json(json!({ "success": true, "position": entry.position })).into_response())
}

async fn promote_from_waitlist(state: &AppState, body: &Value) -> Result<Response, AppError> {
    let event_id = event_id_from(body)?;
    match state.waitlist.promote(event_id).await {
        Ok(promoted) => {
            Ok(Json(json!({ "success": true, "promotedGuest": promoted.entry })).into_response())
        }
        Err(err @ (EventHubError::CapacityExceeded | EventHubError::WaitlistEmpty)) => {
            Ok(Json(json!({ "success": false, "message": err.to_string() })).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

async fn get_waitlist(state: &AppState, body: &Value) -> Result<Response, AppError> {
    let event_id = event_id_from(body)?;
    let waitlist = state.waitlist.list_active(event_id).await?;
    Ok(Json(json!({ "waitlist": waitlist })).into_response())
}

fn event_id_from(body: &Value) -> Result<EventId, AppError> {
    body.get("eventId")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(EventId::from_uuid)
        .ok_or_else(|| AppError::bad_request("eventId must be a UUID"))
}
