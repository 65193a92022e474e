//! In-memory store used by the test suite and local demos.
//!
//! All tables live behind a single async mutex, so the atomic primitives
//! (`update_registered`, `apply_promotion`) are serialized exactly like
//! their transactional `PostgreSQL` counterparts: a concurrent promotion
//! either sees the old `registered` value and wins, or sees the guard fail
//! and gets [`StoreError::Conflict`].

use super::{ChatStore, EventStore, ProfileStore, Promotion, Result, StoreError};
use crate::types::{
    AwardedBadge, ChatMessage, Conversation, ConversationId, Event, EventId, Guest, GuestId,
    GuestStatus, PointsTransaction, UserId, UserProfile, WaitlistEntry,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    guests: HashMap<GuestId, Guest>,
    waitlist: Vec<WaitlistEntry>,
    profiles: HashMap<UserId, UserProfile>,
    transactions: Vec<PointsTransaction>,
    badges: Vec<AwardedBadge>,
    conversations: HashMap<ConversationId, Conversation>,
    messages: Vec<ChatMessage>,
}

/// In-memory implementation of all three store traits.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_event(&self, event: &Event) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.events.contains_key(&event.id) {
            return Err(StoreError::Conflict);
        }
        tables.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        Ok(self.tables.lock().await.events.get(&id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let tables = self.tables.lock().await;
        let mut events: Vec<Event> = tables.events.values().cloned().collect();
        events.sort_by_key(|e| (e.date, e.time));
        Ok(events)
    }

    async fn update_event(&self, event: &Event) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        match tables.events.get_mut(&event.id) {
            Some(row) => {
                // Same guard as the SQL statement: a shrink below the live
                // `registered` count is a conflict, not a write.
                if row.registered > event.capacity.value() {
                    return Err(StoreError::Conflict);
                }
                // `registered` is only mutated through the CAS primitives.
                let registered = row.registered;
                *row = event.clone();
                row.registered = registered;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_event(&self, id: EventId) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.events.remove(&id).is_none() {
            return Ok(false);
        }
        tables.guests.retain(|_, g| g.event_id != Some(id));
        tables.waitlist.retain(|w| w.event_id != id);
        Ok(true)
    }

    async fn update_registered(&self, id: EventId, expected: u32, new: u32) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        match tables.events.get_mut(&id) {
            Some(event) if event.registered == expected => {
                event.registered = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_guest(&self, guest: &Guest) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.guests.contains_key(&guest.id) {
            return Err(StoreError::Conflict);
        }
        tables.guests.insert(guest.id, guest.clone());
        Ok(())
    }

    async fn get_guest(&self, id: GuestId) -> Result<Option<Guest>> {
        Ok(self.tables.lock().await.guests.get(&id).cloned())
    }

    async fn list_guests(&self, event_id: Option<EventId>) -> Result<Vec<Guest>> {
        let tables = self.tables.lock().await;
        let mut guests: Vec<Guest> = tables
            .guests
            .values()
            .filter(|g| event_id.is_none() || g.event_id == event_id)
            .cloned()
            .collect();
        guests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(guests)
    }

    async fn update_guest(&self, guest: &Guest) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        match tables.guests.get_mut(&guest.id) {
            Some(row) => {
                *row = guest.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_guest(&self, id: GuestId) -> Result<bool> {
        Ok(self.tables.lock().await.guests.remove(&id).is_some())
    }

    async fn count_waitlist(&self, event_id: EventId) -> Result<u32> {
        let tables = self.tables.lock().await;
        let count = tables.waitlist.iter().filter(|w| w.event_id == event_id).count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn insert_waitlist_entry(&self, entry: &WaitlistEntry) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let duplicate = tables
            .waitlist
            .iter()
            .any(|w| w.event_id == entry.event_id && w.position == entry.position);
        if duplicate {
            return Err(StoreError::Conflict);
        }
        tables.waitlist.push(entry.clone());
        Ok(())
    }

    async fn next_unpromoted(&self, event_id: EventId) -> Result<Option<WaitlistEntry>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .waitlist
            .iter()
            .filter(|w| w.event_id == event_id && w.promoted_at.is_none())
            .min_by_key(|w| w.position)
            .cloned())
    }

    async fn active_waitlist(&self, event_id: EventId) -> Result<Vec<WaitlistEntry>> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<WaitlistEntry> = tables
            .waitlist
            .iter()
            .filter(|w| w.event_id == event_id && w.promoted_at.is_none())
            .cloned()
            .collect();
        entries.sort_by_key(|w| w.position);
        Ok(entries)
    }

    async fn apply_promotion(&self, promotion: &Promotion) -> Result<()> {
        let mut tables = self.tables.lock().await;

        // Guard 1: the entry must still be unpromoted.
        let entry_ok = tables
            .waitlist
            .iter()
            .any(|w| w.id == promotion.entry_id && w.promoted_at.is_none());
        if !entry_ok {
            return Err(StoreError::Conflict);
        }

        // Guard 2: the registered count must match what the caller read.
        let cas_ok = tables
            .events
            .get(&promotion.event_id)
            .is_some_and(|e| e.registered == promotion.expected_registered);
        if !cas_ok {
            return Err(StoreError::Conflict);
        }

        // All guards held under the one lock; apply all three effects.
        tables.guests.insert(promotion.guest.id, promotion.guest.clone());
        if let Some(entry) = tables.waitlist.iter_mut().find(|w| w.id == promotion.entry_id) {
            entry.promoted_at = Some(promotion.promoted_at);
        }
        if let Some(event) = tables.events.get_mut(&promotion.event_id) {
            event.registered = promotion.new_registered;
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>> {
        Ok(self.tables.lock().await.profiles.get(&user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.tables
            .lock()
            .await
            .profiles
            .insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn insert_transaction(&self, tx: &PointsTransaction) -> Result<()> {
        self.tables.lock().await.transactions.push(tx.clone());
        Ok(())
    }

    async fn recent_transactions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<PointsTransaction>> {
        let tables = self.tables.lock().await;
        let mut txs: Vec<PointsTransaction> = tables
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        txs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        txs.truncate(limit as usize);
        Ok(txs)
    }

    async fn awarded_badges(&self, user_id: UserId) -> Result<Vec<AwardedBadge>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .badges
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn award_badge(&self, award: &AwardedBadge) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let already_held = tables
            .badges
            .iter()
            .any(|b| b.user_id == award.user_id && b.badge == award.badge);
        if !already_held {
            tables.badges.push(award.clone());
        }
        Ok(())
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<UserProfile>> {
        let tables = self.tables.lock().await;
        let mut profiles: Vec<UserProfile> = tables.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        profiles.truncate(limit as usize);
        Ok(profiles)
    }

    async fn count_events_created_by(&self, user_id: UserId) -> Result<u32> {
        let tables = self.tables.lock().await;
        let count = tables
            .events
            .values()
            .filter(|e| e.created_by == Some(user_id))
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn count_confirmed_rsvps(&self, email: &str) -> Result<u32> {
        let tables = self.tables.lock().await;
        let count = tables
            .guests
            .values()
            .filter(|g| g.email == email && g.status == GuestStatus::Confirmed)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl ChatStore for InMemoryStore {
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<()> {
        self.tables
            .lock()
            .await
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn get_conversation(&self, id: ConversationId) -> Result<Option<Conversation>> {
        Ok(self.tables.lock().await.conversations.get(&id).cloned())
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<()> {
        self.tables.lock().await.messages.push(message.clone());
        Ok(())
    }

    async fn conversation_messages(&self, id: ConversationId) -> Result<Vec<ChatMessage>> {
        let tables = self.tables.lock().await;
        let mut messages: Vec<ChatMessage> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }
}
