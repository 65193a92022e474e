//! Shared application state for HTTP handlers.

use crate::assistant::{ChatService, CompletionClient, SchedulingService};
use crate::clock::Clock;
use crate::events::EventService;
use crate::gamification::GamificationService;
use crate::guests::GuestService;
use crate::store::{ChatStore, EventStore, ProfileStore};
use crate::waitlist::WaitlistService;
use std::sync::Arc;

/// Everything handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    /// Event CRUD
    pub events: EventService,
    /// Guest CRUD and seat accounting
    pub guests: GuestService,
    /// Waitlist joins and promotion
    pub waitlist: WaitlistService,
    /// Points, streaks, and badges
    pub gamification: GamificationService,
    /// Guest chat
    pub chat: ChatService,
    /// Scheduling suggestions
    pub scheduling: SchedulingService,
    /// Direct store handle for readiness checks and analytics reads
    pub event_store: Arc<dyn EventStore>,
}

impl AppState {
    /// Wires all services over the given stores.
    ///
    /// `completion_client = None` puts the assistant features in rule-based
    /// fallback mode.
    #[must_use]
    pub fn new(
        event_store: Arc<dyn EventStore>,
        profile_store: Arc<dyn ProfileStore>,
        chat_store: Arc<dyn ChatStore>,
        clock: Arc<dyn Clock>,
        completion_client: Option<CompletionClient>,
    ) -> Self {
        Self {
            events: EventService::new(Arc::clone(&event_store), Arc::clone(&clock)),
            guests: GuestService::new(Arc::clone(&event_store), Arc::clone(&clock)),
            waitlist: WaitlistService::new(Arc::clone(&event_store), Arc::clone(&clock)),
            gamification: GamificationService::new(profile_store, Arc::clone(&clock)),
            chat: ChatService::new(
                chat_store,
                Arc::clone(&event_store),
                completion_client.clone(),
                Arc::clone(&clock),
            ),
            scheduling: SchedulingService::new(
                Arc::clone(&event_store),
                completion_client,
                clock,
            ),
            event_store,
        }
    }
}
