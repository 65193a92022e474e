//! Event management API endpoints.
//!
//! - `POST /api/events` - Create an event
//! - `GET /api/events` - List events, ascending by date
//! - `GET /api/events/:id` - Get one event
//! - `PUT /api/events/:id` - Update an event's editable fields
//! - `DELETE /api/events/:id` - Delete an event and its guests/waitlist

use super::error::AppError;
use crate::events::{EventPatch, NewEvent};
use crate::server::state::AppState;
use crate::types::{Capacity, Event, EventId, EventStatus, UserId};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

/// Request to create an event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Event title
    pub title: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Calendar date
    pub date: NaiveDate,
    /// Start time
    pub time: NaiveTime,
    /// Venue or address
    pub location: String,
    /// Maximum number of confirmed guests
    pub capacity: u32,
    /// Creating user, when known
    pub created_by: Option<Uuid>,
}

/// Request to update an event. Absent fields stay unchanged.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateEventRequest {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New date
    pub date: Option<NaiveDate>,
    /// New start time
    pub time: Option<NaiveTime>,
    /// New location
    pub location: Option<String>,
    /// New capacity
    pub capacity: Option<u32>,
    /// New lifecycle status
    pub status: Option<EventStatus>,
}

/// `POST /api/events`
///
/// # Errors
///
/// 422 for a blank title or location.
pub async fn create_event(
    State(state): State<AppState>,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = state
        .events
        .create(NewEvent {
            title: body.title,
            description: body.description,
            date: body.date,
            time: body.time,
            location: body.location,
            capacity: Capacity::new(body.capacity),
            created_by: body.created_by.map(UserId::from_uuid),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /api/events`
///
/// # Errors
///
/// Fails when the store is unreachable.
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(state.events.list().await?))
}

/// `GET /api/events/:id`
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, AppError> {
    Ok(Json(state.events.get(EventId::from_uuid(id)).await?))
}

/// `PUT /api/events/:id`
///
/// # Errors
///
/// 404 for an unknown id, 422 when shrinking capacity below the
/// registered count.
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateEventRequest>,
) -> Result<Json<Event>, AppError> {
    let patch = EventPatch {
        title: body.title,
        description: body.description.map(Some),
        date: body.date,
        time: body.time,
        location: body.location,
        capacity: body.capacity.map(Capacity::new),
        status: body.status,
    };
    Ok(Json(state.events.update(EventId::from_uuid(id), patch).await?))
}

/// `DELETE /api/events/:id`
///
/// # Errors
///
/// 404 for an unknown id.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.events.delete(EventId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
