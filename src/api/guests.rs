//! Guest management API endpoints.
//!
//! - `POST /api/guests` - Create a guest (a confirmed guest takes a seat)
//! - `GET /api/guests` - List guests, optionally `?event_id=..`
//! - `GET /api/guests/:id` - Get one guest
//! - `PUT /api/guests/:id` - Update a guest (status changes move seats)
//! - `DELETE /api/guests/:id` - Delete a guest, releasing any held seat

use super::error::AppError;
use crate::guests::{GuestPatch, NewGuest};
use crate::server::state::AppState;
use crate::types::{EventId, Guest, GuestCategory, GuestId, GuestStatus};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

/// Request to create a guest.
#[derive(Debug, Deserialize)]
pub struct CreateGuestRequest {
    /// Event the guest belongs to, when any
    pub event_id: Option<Uuid>,
    /// Guest name
    pub name: String,
    /// Guest email
    pub email: String,
    /// RSVP status, defaults to pending
    #[serde(default)]
    pub status: Option<GuestStatus>,
    /// Guest category, defaults to regular
    #[serde(default)]
    pub category: Option<GuestCategory>,
}

/// Request to update a guest. Absent fields stay unchanged.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateGuestRequest {
    /// New name
    pub name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New RSVP status
    pub status: Option<GuestStatus>,
    /// New category
    pub category: Option<GuestCategory>,
}

/// Query string for listing guests.
#[derive(Debug, Deserialize, Default)]
pub struct ListGuestsQuery {
    /// Restrict to one event
    pub event_id: Option<Uuid>,
}

/// `POST /api/guests`
///
/// # Errors
///
/// 422 for a blank name or email, 404 for an unknown event, 409 when the
/// event is full.
pub async fn create_guest(
    State(state): State<AppState>,
    Json(body): Json<CreateGuestRequest>,
) -> Result<(StatusCode, Json<Guest>), AppError> {
    let guest = state
        .guests
        .create(NewGuest {
            event_id: body.event_id.map(EventId::from_uuid),
            name: body.name,
            email: body.email,
            status: body.status.unwrap_or(GuestStatus::Pending),
            category: body.category.unwrap_or(GuestCategory::Regular),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(guest)))
}

/// `GET /api/guests`
///
/// # Errors
///
/// Fails when the store is unreachable.
pub async fn list_guests(
    State(state): State<AppState>,
    Query(query): Query<ListGuestsQuery>,
) -> Result<Json<Vec<Guest>>, AppError> {
    let guests = state
        .guests
        .list(query.event_id.map(EventId::from_uuid))
        .await?;
    Ok(Json(guests))
}

/// `GET /api/guests/:id`
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn get_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Guest>, AppError> {
    Ok(Json(state.guests.get(GuestId::from_uuid(id)).await?))
}

/// `PUT /api/guests/:id`
///
/// # Errors
///
/// 404 for an unknown id, 409 when confirming on a full event.
pub async fn update_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateGuestRequest>,
) -> Result<Json<Guest>, AppError> {
    let patch = GuestPatch {
        name: body.name,
        email: body.email,
        status: body.status,
        category: body.category,
    };
    Ok(Json(state.guests.update(GuestId::from_uuid(id), patch).await?))
}

/// `DELETE /api/guests/:id`
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn delete_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.guests.delete(GuestId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
