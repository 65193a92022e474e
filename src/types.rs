//! Domain types for the EventHub backend.
//!
//! Value objects, entities, and enumerations shared by the storage layer,
//! the domain services, and the HTTP API. Identifiers are UUID newtypes so
//! an event ID can never be passed where a guest ID is expected.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a guest
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestId(Uuid);

impl GuestId {
    /// Creates a new random `GuestId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `GuestId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GuestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a waitlist entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaitlistEntryId(Uuid);

impl WaitlistEntryId {
    /// Creates a new random `WaitlistEntryId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `WaitlistEntryId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WaitlistEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WaitlistEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user (gamification profile owner)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an assistant conversation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(Uuid);

impl ConversationId {
    /// Creates a new random `ConversationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ConversationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Capacity
// ============================================================================

/// Maximum number of confirmed guests an event can hold
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Capacity(pub u32);

impl Capacity {
    /// Creates a new `Capacity`
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the capacity value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Event lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Event has not happened yet
    Upcoming,
    /// Event is over
    Completed,
}

impl EventStatus {
    /// Stable string form used in storage and on the wire
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Completed => "completed",
        }
    }

    /// Parse the storage form back into the enum
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upcoming" => Some(Self::Upcoming),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RSVP status of a guest
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestStatus {
    /// Guest has confirmed attendance (counts against event capacity)
    Confirmed,
    /// Invitation sent, no answer yet
    Pending,
    /// Guest declined
    Declined,
}

impl GuestStatus {
    /// Stable string form used in storage and on the wire
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
            Self::Declined => "declined",
        }
    }

    /// Parse the storage form back into the enum
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(Self::Confirmed),
            "pending" => Some(Self::Pending),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

impl fmt::Display for GuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guest category, shared by guests and waitlist entries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestCategory {
    /// VIP guest
    Vip,
    /// Regular guest
    Regular,
    /// Plus-one of another guest
    PlusOne,
}

impl GuestCategory {
    /// Stable string form used in storage and on the wire
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vip => "vip",
            Self::Regular => "regular",
            Self::PlusOne => "plus_one",
        }
    }

    /// Parse the storage form back into the enum
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vip" => Some(Self::Vip),
            "regular" => Some(Self::Regular),
            "plus_one" => Some(Self::PlusOne),
            _ => None,
        }
    }
}

impl Default for GuestCategory {
    fn default() -> Self {
        Self::Regular
    }
}

impl fmt::Display for GuestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Domain entities
// ============================================================================

/// Event entity
///
/// `registered` counts confirmed guests and is only ever mutated through the
/// storage layer's compare-and-swap primitives, so `registered <= capacity`
/// holds after any sequence of promotions and RSVPs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier
    pub id: EventId,
    /// Event title
    pub title: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Calendar date of the event
    pub date: NaiveDate,
    /// Start time of the event
    pub time: NaiveTime,
    /// Venue or address
    pub location: String,
    /// Maximum number of confirmed guests
    pub capacity: Capacity,
    /// Current count of confirmed guests
    pub registered: u32,
    /// Lifecycle status
    pub status: EventStatus,
    /// User who created the event, when known
    pub created_by: Option<UserId>,
    /// When the event was created
    pub created_at: DateTime<Utc>,
    /// When the event was last updated
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether the event has no seats left
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.registered >= self.capacity.value()
    }

    /// Seats still available
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.capacity.value().saturating_sub(self.registered)
    }
}

/// Guest entity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    /// Unique guest identifier
    pub id: GuestId,
    /// Event this guest belongs to, if any
    pub event_id: Option<EventId>,
    /// Guest name
    pub name: String,
    /// Guest email
    pub email: String,
    /// RSVP status
    pub status: GuestStatus,
    /// Guest category
    pub category: GuestCategory,
    /// Denormalized event title (kept for list views)
    pub event_title: String,
    /// When the guest responded, if they have
    pub rsvp_date: Option<DateTime<Utc>>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Waitlist entry
///
/// Entries are append-only: joining creates one, promotion sets
/// `promoted_at` exactly once, and nothing ever deletes them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    /// Unique entry identifier
    pub id: WaitlistEntryId,
    /// Event this entry is queued for
    pub event_id: EventId,
    /// Name of the person waiting
    pub name: String,
    /// Email of the person waiting
    pub email: String,
    /// Category the person will be admitted under
    pub category: GuestCategory,
    /// 1-based rank determining promotion order, unique per event
    pub position: u32,
    /// Set once when the entry is promoted to the guest list
    pub promoted_at: Option<DateTime<Utc>>,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// Whether this entry is still waiting
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.promoted_at.is_none()
    }
}

// ============================================================================
// Gamification entities
// ============================================================================

/// Gamification profile of a user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Profile owner
    pub user_id: UserId,
    /// Display name, if the user set one
    pub display_name: Option<String>,
    /// Lifetime points total
    pub total_points: u64,
    /// Experience points driving the level
    pub experience_points: u64,
    /// Current level, derived from experience
    pub level: u32,
    /// Consecutive days of activity
    pub streak_count: u32,
    /// Last day the user was active
    pub last_activity_date: Option<NaiveDate>,
    /// When the profile was last updated
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A fresh profile with no points and no streak
    #[must_use]
    pub const fn empty(user_id: UserId, updated_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            display_name: None,
            total_points: 0,
            experience_points: 0,
            level: 1,
            streak_count: 0,
            last_activity_date: None,
            updated_at,
        }
    }
}

/// A recorded points award
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointsTransaction {
    /// Transaction identifier
    pub id: Uuid,
    /// User the points were awarded to
    pub user_id: UserId,
    /// Points awarded
    pub points: u32,
    /// Action that earned the points (storage form, e.g. `event_created`)
    pub action_type: String,
    /// Human-readable description
    pub description: String,
    /// Related event, if any
    pub event_id: Option<EventId>,
    /// When the award happened
    pub created_at: DateTime<Utc>,
}

/// Badges a user can earn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Badge {
    /// Created a first event
    #[serde(rename = "First Event")]
    FirstEvent,
    /// Created ten or more events
    #[serde(rename = "Event Master")]
    EventMaster,
    /// RSVP'd to five or more events
    #[serde(rename = "Social Butterfly")]
    SocialButterfly,
    /// Kept a 30-day activity streak
    #[serde(rename = "Streak Master")]
    StreakMaster,
}

impl Badge {
    /// All badges, in award-check order
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [
            Self::FirstEvent,
            Self::EventMaster,
            Self::SocialButterfly,
            Self::StreakMaster,
        ]
    }

    /// Display name of the badge
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FirstEvent => "First Event",
            Self::EventMaster => "Event Master",
            Self::SocialButterfly => "Social Butterfly",
            Self::StreakMaster => "Streak Master",
        }
    }

    /// Parse the display name back into the enum
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "First Event" => Some(Self::FirstEvent),
            "Event Master" => Some(Self::EventMaster),
            "Social Butterfly" => Some(Self::SocialButterfly),
            "Streak Master" => Some(Self::StreakMaster),
            _ => None,
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A badge awarded to a user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AwardedBadge {
    /// User holding the badge
    pub user_id: UserId,
    /// Which badge
    pub badge: Badge,
    /// When it was awarded
    pub awarded_at: DateTime<Utc>,
}

// ============================================================================
// Assistant entities
// ============================================================================

/// A conversation between a guest and the assistant, scoped to one event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation identifier
    pub id: ConversationId,
    /// Event this conversation is about
    pub event_id: EventId,
    /// Email of the guest chatting
    pub guest_email: Option<String>,
    /// Name of the guest chatting
    pub guest_name: Option<String>,
    /// When the conversation started
    pub created_at: DateTime<Utc>,
}

/// Who sent a chat message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatSender {
    /// The guest
    User,
    /// The assistant
    Assistant,
}

impl ChatSender {
    /// Stable string form used in storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse the storage form back into the enum
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identifier
    pub id: Uuid,
    /// Conversation this message belongs to
    pub conversation_id: ConversationId,
    /// Who sent it
    pub sender: ChatSender,
    /// Message text
    pub message: String,
    /// When it was sent
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn event_capacity_accounting() {
        let event = Event {
            id: EventId::new(),
            title: "Launch".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            location: "HQ".to_string(),
            capacity: Capacity::new(2),
            registered: 1,
            status: EventStatus::Upcoming,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(!event.is_full());
        assert_eq!(event.remaining(), 1);
    }

    #[test]
    fn category_round_trips_wire_form() {
        for category in [GuestCategory::Vip, GuestCategory::Regular, GuestCategory::PlusOne] {
            assert_eq!(GuestCategory::parse(category.as_str()), Some(category));
        }
        // serde uses the same snake_case form as storage
        let json = serde_json::to_string(&GuestCategory::PlusOne).unwrap();
        assert_eq!(json, "\"plus_one\"");
    }

    #[test]
    fn badge_names_round_trip() {
        for badge in Badge::all() {
            assert_eq!(Badge::parse(badge.name()), Some(badge));
        }
    }
}
