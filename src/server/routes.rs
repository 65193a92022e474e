//! Router configuration.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{analytics, chat, events, gamification, guests, scheduling, waitlist};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Build the complete Axum router.
///
/// Three surfaces:
/// - health checks at `/health` and `/ready`
/// - legacy function endpoints under `/functions`
/// - the REST API under `/api`
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Event management
        .route("/events", post(events::create_event))
        .route("/events", get(events::list_events))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id", put(events::update_event))
        .route("/events/:id", delete(events::delete_event))
        // Guest management
        .route("/guests", post(guests::create_guest))
        .route("/guests", get(guests::list_guests))
        .route("/guests/:id", get(guests::get_guest))
        .route("/guests/:id", put(guests::update_guest))
        .route("/guests/:id", delete(guests::delete_guest))
        // Dashboard analytics
        .route("/analytics", get(analytics::get_analytics));

    let function_routes = Router::new()
        .route("/manage-waitlist", post(waitlist::manage_waitlist))
        .route("/gamification-system", post(gamification::gamification_system))
        .route("/ai-chatbot", post(chat::ai_chatbot))
        .route("/smart-scheduling", post(scheduling::smart_scheduling));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/functions", function_routes)
        .nest("/api", api_routes)
        .with_state(state)
}
