//! End-to-end HTTP tests over the full router with an in-memory store.
//!
//! The `/functions/manage-waitlist` assertions pin the exact legacy wire
//! shapes, including the HTTP 200 `{"success":false,..}` business failures.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use eventhub::clock::FixedClock;
use eventhub::server::{AppState, build_router};
use eventhub::store::{ChatStore, EventStore, InMemoryStore, ProfileStore};
use serde_json::{Value, json};
use std::sync::Arc;

fn test_server() -> TestServer {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
    ));
    let event_store: Arc<dyn EventStore> = store.clone();
    let profile_store: Arc<dyn ProfileStore> = store.clone();
    let chat_store: Arc<dyn ChatStore> = store;
    let state = AppState::new(event_store, profile_store, chat_store, clock, None);
    TestServer::new(build_router(state)).unwrap()
}

async fn create_event(server: &TestServer, capacity: u32) -> String {
    let response = server
        .post("/api/events")
        .json(&json!({
            "title": "Launch Party",
            "description": "Rooftop launch",
            "date": "2025-07-04",
            "time": "19:00:00",
            "location": "Rooftop",
            "capacity": capacity,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

async fn add_confirmed_guest(server: &TestServer, event_id: &str) {
    let response = server
        .post("/api/guests")
        .json(&json!({
            "event_id": event_id,
            "name": "Taken Seat",
            "email": "seat@example.com",
            "status": "confirmed",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
}

async fn join_waitlist(server: &TestServer, event_id: &str, name: &str) -> Value {
    let response = server
        .post("/functions/manage-waitlist")
        .json(&json!({
            "action": "add_to_waitlist",
            "eventId": event_id,
            "guestData": { "name": name, "email": format!("{name}@example.com") },
        }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

#[tokio::test]
async fn add_to_waitlist_returns_position() {
    let server = test_server();
    let event_id = create_event(&server, 1).await;

    let body = join_waitlist(&server, &event_id, "ada").await;
    assert_eq!(body, json!({ "success": true, "position": 1 }));

    let body = join_waitlist(&server, &event_id, "ben").await;
    assert_eq!(body, json!({ "success": true, "position": 2 }));
}

#[tokio::test]
async fn promote_when_full_keeps_the_legacy_shape() {
    let server = test_server();
    let event_id = create_event(&server, 1).await;
    add_confirmed_guest(&server, &event_id).await;
    join_waitlist(&server, &event_id, "ada").await;

    let response = server
        .post("/functions/manage-waitlist")
        .json(&json!({ "action": "promote_from_waitlist", "eventId": event_id }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "success": false, "message": "Event is still at capacity" })
    );
}

#[tokio::test]
async fn promote_empty_waitlist_keeps_the_legacy_shape() {
    let server = test_server();
    let event_id = create_event(&server, 2).await;

    let response = server
        .post("/functions/manage-waitlist")
        .json(&json!({ "action": "promote_from_waitlist", "eventId": event_id }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "success": false, "message": "No one on waitlist" })
    );
}

#[tokio::test]
async fn promote_returns_the_promoted_entry() {
    let server = test_server();
    let event_id = create_event(&server, 2).await;
    join_waitlist(&server, &event_id, "ada").await;

    let response = server
        .post("/functions/manage-waitlist")
        .json(&json!({ "action": "promote_from_waitlist", "eventId": event_id }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["success"], json!(true));
    let promoted = &body["promotedGuest"];
    assert_eq!(promoted["name"], json!("ada"));
    assert_eq!(promoted["email"], json!("ada@example.com"));
    assert_eq!(promoted["position"], json!(1));
    // The entry is returned as it read before the promotion mark.
    assert_eq!(promoted["promoted_at"], json!(null));

    // The seat is taken now.
    let event = server.get(&format!("/api/events/{event_id}")).await;
    assert_eq!(event.json::<Value>()["registered"], json!(1));
}

#[tokio::test]
async fn get_waitlist_lists_active_entries_in_order() {
    let server = test_server();
    let event_id = create_event(&server, 5).await;
    join_waitlist(&server, &event_id, "ada").await;
    join_waitlist(&server, &event_id, "ben").await;

    let response = server
        .post("/functions/manage-waitlist")
        .json(&json!({ "action": "get_waitlist", "eventId": event_id }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    let waitlist = body["waitlist"].as_array().unwrap();
    assert_eq!(waitlist.len(), 2);
    assert_eq!(waitlist[0]["name"], json!("ada"));
    assert_eq!(waitlist[1]["position"], json!(2));
}

#[tokio::test]
async fn unknown_action_is_a_legacy_500() {
    let server = test_server();
    let event_id = create_event(&server, 1).await;

    let response = server
        .post("/functions/manage-waitlist")
        .json(&json!({ "action": "explode", "eventId": event_id }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>(), json!({ "error": "Invalid action" }));
}

#[tokio::test]
async fn confirming_past_capacity_is_a_conflict() {
    let server = test_server();
    let event_id = create_event(&server, 1).await;
    add_confirmed_guest(&server, &event_id).await;

    let response = server
        .post("/api/guests")
        .json(&json!({
            "event_id": event_id,
            "name": "Late Guest",
            "email": "late@example.com",
            "status": "confirmed",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn shrinking_capacity_below_registered_is_rejected() {
    let server = test_server();
    let event_id = create_event(&server, 2).await;
    add_confirmed_guest(&server, &event_id).await;

    let response = server
        .put(&format!("/api/events/{event_id}"))
        .json(&json!({ "capacity": 0 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn analytics_summarizes_events_and_guests() {
    let server = test_server();
    let event_id = create_event(&server, 4).await;
    add_confirmed_guest(&server, &event_id).await;

    let response = server.get("/api/analytics").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["totalEvents"], json!(1));
    assert_eq!(body["totalGuests"], json!(1));
    assert_eq!(body["attendanceRate"], json!(25));
    assert_eq!(body["estimatedRevenue"], json!(50));
    assert_eq!(body["rsvpDistribution"]["confirmed"], json!(1));
    assert_eq!(body["monthlyTrends"][0]["month"], json!("Jul"));
}

#[tokio::test]
async fn chatbot_answers_and_returns_a_conversation_id() {
    let server = test_server();
    let event_id = create_event(&server, 4).await;

    let response = server
        .post("/functions/ai-chatbot")
        .json(&json!({
            "message": "Where is the event?",
            "eventId": event_id,
            "guestName": "Ada",
            "guestEmail": "ada@example.com",
        }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert!(body["response"].as_str().unwrap().contains("Rooftop"));
    let conversation_id = body["conversationId"].as_str().unwrap().to_string();

    // Follow-up sticks to the same conversation.
    let response = server
        .post("/functions/ai-chatbot")
        .json(&json!({
            "message": "And when?",
            "eventId": event_id,
            "conversationId": conversation_id,
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["conversationId"],
        json!(conversation_id)
    );
}

#[tokio::test]
async fn scheduling_returns_three_suggestions_without_a_key() {
    let server = test_server();

    let response = server
        .post("/functions/smart-scheduling")
        .json(&json!({ "eventType": "party", "duration": 3, "expectedAttendees": 40 }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 3);
    for suggestion in suggestions {
        assert_eq!(suggestion["confidence"], json!(70));
        assert!(suggestion["reasoning"].as_str().unwrap().contains("party"));
    }
}

#[tokio::test]
async fn gamification_round_trip() {
    let server = test_server();
    let user_id = uuid::Uuid::new_v4().to_string();

    let response = server
        .post("/functions/gamification-system")
        .json(&json!({
            "action": "award_points",
            "userId": user_id,
            "metadata": { "actionType": "event_created" },
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "success": true, "points_awarded": 100, "action_type": "event_created" })
    );

    let response = server
        .post("/functions/gamification-system")
        .json(&json!({
            "action": "award_points",
            "userId": user_id,
            "metadata": { "actionType": "wrote_a_poem" },
        }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "success": false, "message": "Invalid action type" })
    );

    let response = server
        .post("/functions/gamification-system")
        .json(&json!({ "action": "get_user_profile", "userId": user_id }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["profile"]["total_points"], json!(100));
    assert_eq!(body["recent_transactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn health_and_readiness() {
    let server = test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], json!("ok"));

    let response = server.get("/ready").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["ready"], json!(true));
}
