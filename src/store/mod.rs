//! Storage layer for the EventHub backend.
//!
//! Three narrow async traits split by concern:
//!
//! - [`EventStore`] — events, guests, and the waitlist, including the two
//!   concurrency-sensitive primitives: a compare-and-swap on an event's
//!   `registered` count and the atomic promotion unit.
//! - [`ProfileStore`] — gamification profiles, points, and badges.
//! - [`ChatStore`] — assistant conversations and messages.
//!
//! [`postgres::PostgresStore`] implements all three against `PostgreSQL`;
//! [`memory::InMemoryStore`] implements them behind a single async mutex and
//! backs the test suite.

pub mod memory;
pub mod postgres;

use crate::types::{
    AwardedBadge, Badge, ChatMessage, Conversation, ConversationId, Event, EventId, Guest, GuestId,
    PointsTransaction, UserId, UserProfile, WaitlistEntry, WaitlistEntryId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the storage layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("row not found")]
    NotFound,

    /// An optimistic guard failed: a compare-and-swap saw a different value,
    /// or a uniqueness constraint rejected the write. Nothing was committed.
    #[error("conflicting concurrent update")]
    Conflict,

    /// The round trip exceeded its bound. The outcome is unknown: the write
    /// may or may not have been applied.
    #[error("store round trip timed out")]
    Timeout,

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(String),
}

/// The atomic promotion unit (steps 3-5 of the promotion operation).
///
/// Applied all-or-nothing by [`EventStore::apply_promotion`]: the confirmed
/// guest is inserted, the waitlist entry's `promoted_at` is set (guarded by
/// `promoted_at IS NULL`), and the event's `registered` count moves from
/// `expected_registered` to `new_registered` (guarded by a compare-and-swap).
/// Any guard failing aborts the whole unit with [`StoreError::Conflict`].
#[derive(Clone, Debug)]
pub struct Promotion {
    /// Event the promotion is against
    pub event_id: EventId,
    /// Waitlist entry being promoted
    pub entry_id: WaitlistEntryId,
    /// Confirmed guest record to insert
    pub guest: Guest,
    /// Timestamp written to the entry's `promoted_at`
    pub promoted_at: DateTime<Utc>,
    /// `registered` value the caller read in step 1
    pub expected_registered: u32,
    /// `registered` value after the promotion (always `expected + 1`)
    pub new_registered: u32,
}

/// Storage for events, guests, and the waitlist.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Liveness probe against the backing store.
    async fn ping(&self) -> Result<()>;

    // ───── events ─────

    /// Insert a new event row.
    async fn insert_event(&self, event: &Event) -> Result<()>;

    /// Fetch an event by id.
    async fn get_event(&self, id: EventId) -> Result<Option<Event>>;

    /// All events, ascending by date.
    async fn list_events(&self) -> Result<Vec<Event>>;

    /// Update an event's editable fields (everything except `registered`).
    /// Returns `false` when the row does not exist. The write is guarded
    /// against the live `registered` count: shrinking capacity below it is
    /// rejected with [`StoreError::Conflict`], atomically with respect to
    /// the seat compare-and-swap.
    async fn update_event(&self, event: &Event) -> Result<bool>;

    /// Delete an event and cascade its guests and waitlist entries.
    /// Returns `false` when the row does not exist.
    async fn delete_event(&self, id: EventId) -> Result<bool>;

    /// Compare-and-swap on the event's `registered` count.
    ///
    /// Succeeds only if the stored value still equals `expected`; returns
    /// `false` when the row changed underneath the caller (or is gone).
    async fn update_registered(&self, id: EventId, expected: u32, new: u32) -> Result<bool>;

    // ───── guests ─────

    /// Insert a new guest row.
    async fn insert_guest(&self, guest: &Guest) -> Result<()>;

    /// Fetch a guest by id.
    async fn get_guest(&self, id: GuestId) -> Result<Option<Guest>>;

    /// Guests, newest first, optionally scoped to one event.
    async fn list_guests(&self, event_id: Option<EventId>) -> Result<Vec<Guest>>;

    /// Update a guest row. Returns `false` when the row does not exist.
    async fn update_guest(&self, guest: &Guest) -> Result<bool>;

    /// Delete a guest row. Returns `false` when the row does not exist.
    async fn delete_guest(&self, id: GuestId) -> Result<bool>;

    // ───── waitlist ─────

    /// Number of waitlist entries ever created for the event (promoted
    /// entries included; positions are never reused).
    async fn count_waitlist(&self, event_id: EventId) -> Result<u32>;

    /// Append a waitlist entry. A duplicate (event, position) pair is
    /// rejected with [`StoreError::Conflict`].
    async fn insert_waitlist_entry(&self, entry: &WaitlistEntry) -> Result<()>;

    /// The unpromoted entry with the smallest position, if any.
    async fn next_unpromoted(&self, event_id: EventId) -> Result<Option<WaitlistEntry>>;

    /// All unpromoted entries, ascending by position.
    async fn active_waitlist(&self, event_id: EventId) -> Result<Vec<WaitlistEntry>>;

    /// Apply the promotion unit atomically; see [`Promotion`].
    async fn apply_promotion(&self, promotion: &Promotion) -> Result<()>;
}

/// Storage for gamification profiles, points, and badges.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile by user id.
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>>;

    /// Insert or replace a profile.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()>;

    /// Record a points transaction.
    async fn insert_transaction(&self, tx: &PointsTransaction) -> Result<()>;

    /// Most recent transactions for a user, newest first.
    async fn recent_transactions(&self, user_id: UserId, limit: u32)
    -> Result<Vec<PointsTransaction>>;

    /// Badges already held by the user.
    async fn awarded_badges(&self, user_id: UserId) -> Result<Vec<AwardedBadge>>;

    /// Award a badge; a repeat award of the same badge is a no-op.
    async fn award_badge(&self, award: &AwardedBadge) -> Result<()>;

    /// Top profiles by lifetime points, descending.
    async fn leaderboard(&self, limit: u32) -> Result<Vec<UserProfile>>;

    /// How many events the user has created (badge criterion).
    async fn count_events_created_by(&self, user_id: UserId) -> Result<u32>;

    /// How many confirmed RSVPs exist for the email (badge criterion).
    async fn count_confirmed_rsvps(&self, email: &str) -> Result<u32>;
}

/// Storage for assistant conversations.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert a new conversation.
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<()>;

    /// Fetch a conversation by id.
    async fn get_conversation(&self, id: ConversationId) -> Result<Option<Conversation>>;

    /// Append a message to a conversation.
    async fn insert_message(&self, message: &ChatMessage) -> Result<()>;

    /// Messages of a conversation, oldest first.
    async fn conversation_messages(&self, id: ConversationId) -> Result<Vec<ChatMessage>>;
}

/// Convenience used by badge checks: which of `all` is not yet held.
#[must_use]
pub fn missing_badges(held: &[AwardedBadge]) -> Vec<Badge> {
    Badge::all()
        .into_iter()
        .filter(|badge| !held.iter().any(|a| a.badge == *badge))
        .collect()
}
