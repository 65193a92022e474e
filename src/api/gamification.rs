//! Gamification function endpoint.
//!
//! `POST /functions/gamification-system` dispatches on an `action` field:
//! `award_points`, `check_badges`, `update_streak`, `get_user_profile`, and
//! `get_leaderboard`. An unknown action type inside `award_points` stays an
//! HTTP 200 `{"success":false,..}` answer for legacy callers; an unknown
//! top-level action is HTTP 500 `{"error":"Invalid action"}`.

use super::error::AppError;
use crate::error::EventHubError;
use crate::server::state::AppState;
use crate::types::{EventId, UserId};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use uuid::Uuid;

const LEADERBOARD_LIMIT: u32 = 50;

/// `POST /functions/gamification-system`
///
/// # Errors
///
/// Malformed input and store faults surface as [`AppError`].
pub async fn gamification_system(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let action = body.get("action").and_then(Value::as_str).unwrap_or("");
    match action {
        "award_points" => award_points(&state, &body).await,
        "check_badges" => check_badges(&state, &body).await,
        "update_streak" => update_streak(&state, &body).await,
        "get_user_profile" => get_user_profile(&state, &body).await,
        "get_leaderboard" => get_leaderboard(&state).await,
        _ => Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Invalid action" })),
        )
            .into_response()),
    }
}

async fn award_points(state: &AppState, body: &Value) -> Result<Response, AppError> {
    let user_id = user_id_from(body)?;
    let event_id = body
        .get("eventId")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(EventId::from_uuid);
    let action_type = body
        .pointer("/metadata/actionType")
        .and_then(Value::as_str)
        .unwrap_or("");

    match state
        .gamification
        .award_points(user_id, action_type, event_id)
        .await
    {
        Ok(outcome) => {
            // Awards may have unlocked a badge; the answer shape stays lean.
            state.gamification.check_badges(user_id, None).await?;
            Ok(Json(json!({
                "success": true,
                "points_awarded": outcome.points_awarded,
                "action_type": action_type,
            }))
            .into_response())
        }
        Err(EventHubError::Validation(_)) => Ok(Json(json!({
            "success": false,
            "message": "Invalid action type",
        }))
        .into_response()),
        Err(err) => Err(err.into()),
    }
}

async fn check_badges(state: &AppState, body: &Value) -> Result<Response, AppError> {
    let user_id = user_id_from(body)?;
    let email = body
        .pointer("/metadata/email")
        .and_then(Value::as_str)
        .map(ToString::to_string);
    let newly = state
        .gamification
        .check_badges(user_id, email.as_deref())
        .await?;
    let names: Vec<&str> = newly.iter().map(|b| b.name()).collect();
    Ok(Json(json!({ "success": true, "new_badges": names })).into_response())
}

async fn update_streak(state: &AppState, body: &Value) -> Result<Response, AppError> {
    let user_id = user_id_from(body)?;
    let profile = state.gamification.update_streak(user_id).await?;
    Ok(Json(json!({ "success": true, "streak_count": profile.streak_count })).into_response())
}

async fn get_user_profile(state: &AppState, body: &Value) -> Result<Response, AppError> {
    let user_id = user_id_from(body)?;
    let view = state.gamification.profile(user_id).await?;
    Ok(Json(json!({
        "profile": view.profile,
        "badges": view.badges,
        "recent_transactions": view.recent_transactions,
    }))
    .into_response())
}

async fn get_leaderboard(state: &AppState) -> Result<Response, AppError> {
    let leaderboard = state.gamification.leaderboard(LEADERBOARD_LIMIT).await?;
    Ok(Json(json!({ "leaderboard": leaderboard })).into_response())
}

fn user_id_from(body: &Value) -> Result<UserId, AppError> {
    body.get("userId")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(UserId::from_uuid)
        .ok_or_else(|| AppError::bad_request("userId must be a UUID"))
}
