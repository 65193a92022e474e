//! Event CRUD.
//!
//! `registered` is bookkeeping owned by the guest and waitlist services; the
//! update path here deliberately cannot touch it.

use crate::clock::Clock;
use crate::error::{EventHubError, Result};
use crate::store::{EventStore, StoreError};
use crate::types::{Capacity, Event, EventId, EventStatus, UserId};
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;

/// Fields for creating an event.
#[derive(Clone, Debug)]
pub struct NewEvent {
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
    pub capacity: Capacity,
    /// Creating user, when known
    pub created_by: Option<UserId>,
}

/// Editable fields for updating an event. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct EventPatch {
    /// New title
    pub title: Option<String>,
    /// New description (`Some(None)` clears it)
    pub description: Option<Option<String>>,
    /// New date
    pub date: Option<NaiveDate>,
    /// New start time
    pub time: Option<NaiveTime>,
    /// New location
    pub location: Option<String>,
    /// New capacity
    pub capacity: Option<Capacity>,
    /// New lifecycle status
    pub status: Option<EventStatus>,
}

/// Event CRUD operations.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl EventService {
    /// Creates a service over the given store and clock.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Creates an event with zero registered guests.
    ///
    /// # Errors
    ///
    /// [`EventHubError::Validation`] for a blank title or location.
    pub async fn create(&self, new: NewEvent) -> Result<Event> {
        let title = new.title.trim().to_string();
        let location = new.location.trim().to_string();
        if title.is_empty() || location.is_empty() {
            return Err(EventHubError::Validation(
                "Title and location are required".to_string(),
            ));
        }

        let now = self.clock.now();
        let event = Event {
            id: EventId::new(),
            title,
            description: new.description,
            date: new.date,
            time: new.time,
            location,
            capacity: new.capacity,
            registered: 0,
            status: EventStatus::Upcoming,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_event(&event).await?;
        tracing::info!(event_id = %event.id, title = %event.title, "created event");
        Ok(event)
    }

    /// All events, ascending by date.
    ///
    /// # Errors
    ///
    /// Fails when the store is unreachable.
    pub async fn list(&self) -> Result<Vec<Event>> {
        Ok(self.store.list_events().await?)
    }

    /// Fetches one event.
    ///
    /// # Errors
    ///
    /// [`EventHubError::EventNotFound`] for an unknown id.
    pub async fn get(&self, id: EventId) -> Result<Event> {
        self.store
            .get_event(id)
            .await?
            .ok_or(EventHubError::EventNotFound(id))
    }

    /// Applies a patch to an event's editable fields.
    ///
    /// Capacity can grow freely but can never shrink below the current
    /// registered count; confirmed seats are promises already made.
    ///
    /// # Errors
    ///
    /// [`EventHubError::EventNotFound`] for an unknown id,
    /// [`EventHubError::Validation`] for a capacity below `registered`.
    pub async fn update(&self, id: EventId, patch: EventPatch) -> Result<Event> {
        let mut event = self.get(id).await?;

        if let Some(capacity) = patch.capacity {
            if capacity.value() < event.registered {
                return Err(EventHubError::Validation(format!(
                    "Capacity {} is below the {} guests already registered",
                    capacity.value(),
                    event.registered
                )));
            }
            event.capacity = capacity;
        }
        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(EventHubError::Validation("Title is required".to_string()));
            }
            event.title = title;
        }
        if let Some(description) = patch.description {
            event.description = description;
        }
        if let Some(date) = patch.date {
            event.date = date;
        }
        if let Some(time) = patch.time {
            event.time = time;
        }
        if let Some(location) = patch.location {
            let location = location.trim().to_string();
            if location.is_empty() {
                return Err(EventHubError::Validation(
                    "Location is required".to_string(),
                ));
            }
            event.location = location;
        }
        if let Some(status) = patch.status {
            event.status = status;
        }
        event.updated_at = self.clock.now();

        match self.store.update_event(&event).await {
            Ok(true) => Ok(event),
            Ok(false) => Err(EventHubError::EventNotFound(id)),
            // A seat was taken between the validation read and the write;
            // the store's shrink guard rejected it. Re-read for the message.
            Err(StoreError::Conflict) => {
                let current = self.get(id).await?;
                Err(EventHubError::Validation(format!(
                    "Capacity {} is below the {} guests already registered",
                    event.capacity.value(),
                    current.registered
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes an event and everything hanging off it.
    ///
    /// # Errors
    ///
    /// [`EventHubError::EventNotFound`] for an unknown id.
    pub async fn delete(&self, id: EventId) -> Result<()> {
        if self.store.delete_event(id).await? {
            tracing::info!(event_id = %id, "deleted event");
            Ok(())
        } else {
            Err(EventHubError::EventNotFound(id))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::{InMemoryStore, Promotion, Result as StoreResult};
    use crate::types::{Guest, GuestId, WaitlistEntry};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    fn service() -> (Arc<InMemoryStore>, EventService) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        (Arc::clone(&store), EventService::new(store, clock))
    }

    fn new_event(capacity: u32) -> NewEvent {
        NewEvent {
            title: "Team Offsite".to_string(),
            description: Some("Annual planning".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 9, 12).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            location: "Mountain Lodge".to_string(),
            capacity: Capacity::new(capacity),
            created_by: None,
        }
    }

    #[tokio::test]
    async fn create_starts_empty_and_upcoming() {
        let (_, svc) = service();
        let event = svc.create(new_event(50)).await.unwrap();
        assert_eq!(event.registered, 0);
        assert_eq!(event.status, EventStatus::Upcoming);
        assert_eq!(svc.get(event.id).await.unwrap().title, "Team Offsite");
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let (_, svc) = service();
        let mut input = new_event(50);
        input.title = "   ".to_string();
        let err = svc.create(input).await.unwrap_err();
        assert!(matches!(err, EventHubError::Validation(_)));
    }

    #[tokio::test]
    async fn capacity_cannot_shrink_below_registered() {
        let (store, svc) = service();
        let event = svc.create(new_event(10)).await.unwrap();
        assert!(store.update_registered(event.id, 0, 4).await.unwrap());

        let patch = EventPatch {
            capacity: Some(Capacity::new(3)),
            ..EventPatch::default()
        };
        let err = svc.update(event.id, patch).await.unwrap_err();
        assert!(matches!(err, EventHubError::Validation(_)));

        let patch = EventPatch {
            capacity: Some(Capacity::new(4)),
            ..EventPatch::default()
        };
        let updated = svc.update(event.id, patch).await.unwrap();
        assert_eq!(updated.capacity.value(), 4);
        assert_eq!(updated.registered, 4);
    }

    /// Delegates to an [`InMemoryStore`] but lands a seat CAS right before
    /// each event write, standing in for a racing RSVP.
    struct RacingRsvpStore {
        inner: Arc<InMemoryStore>,
    }

    #[async_trait]
    impl EventStore for RacingRsvpStore {
        async fn ping(&self) -> StoreResult<()> {
            self.inner.ping().await
        }

        async fn insert_event(&self, event: &Event) -> StoreResult<()> {
            self.inner.insert_event(event).await
        }

        async fn get_event(&self, id: EventId) -> StoreResult<Option<Event>> {
            self.inner.get_event(id).await
        }

        async fn list_events(&self) -> StoreResult<Vec<Event>> {
            self.inner.list_events().await
        }

        async fn update_event(&self, event: &Event) -> StoreResult<bool> {
            let _ = self.inner.update_registered(event.id, 0, 1).await?;
            self.inner.update_event(event).await
        }

        async fn delete_event(&self, id: EventId) -> StoreResult<bool> {
            self.inner.delete_event(id).await
        }

        async fn update_registered(&self, id: EventId, expected: u32, new: u32) -> StoreResult<bool> {
            self.inner.update_registered(id, expected, new).await
        }

        async fn insert_guest(&self, guest: &Guest) -> StoreResult<()> {
            self.inner.insert_guest(guest).await
        }

        async fn get_guest(&self, id: GuestId) -> StoreResult<Option<Guest>> {
            self.inner.get_guest(id).await
        }

        async fn list_guests(&self, event_id: Option<EventId>) -> StoreResult<Vec<Guest>> {
            self.inner.list_guests(event_id).await
        }

        async fn update_guest(&self, guest: &Guest) -> StoreResult<bool> {
            self.inner.update_guest(guest).await
        }

        async fn delete_guest(&self, id: GuestId) -> StoreResult<bool> {
            self.inner.delete_guest(id).await
        }

        async fn count_waitlist(&self, event_id: EventId) -> StoreResult<u32> {
            self.inner.count_waitlist(event_id).await
        }

        async fn insert_waitlist_entry(&self, entry: &WaitlistEntry) -> StoreResult<()> {
            self.inner.insert_waitlist_entry(entry).await
        }

        async fn next_unpromoted(&self, event_id: EventId) -> StoreResult<Option<WaitlistEntry>> {
            self.inner.next_unpromoted(event_id).await
        }

        async fn active_waitlist(&self, event_id: EventId) -> StoreResult<Vec<WaitlistEntry>> {
            self.inner.active_waitlist(event_id).await
        }

        async fn apply_promotion(&self, promotion: &Promotion) -> StoreResult<()> {
            self.inner.apply_promotion(promotion).await
        }
    }

    #[tokio::test]
    async fn shrink_racing_a_seat_cas_cannot_break_the_invariant() {
        let inner = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        let racing = Arc::new(RacingRsvpStore {
            inner: Arc::clone(&inner),
        });
        let svc = EventService::new(
            Arc::clone(&racing) as Arc<dyn EventStore>,
            Arc::clone(&clock) as Arc<dyn crate::clock::Clock>,
        );

        // Validation reads registered=0 and accepts the shrink to 0; the
        // RSVP then lands before the write. The store guard must win.
        let event = svc.create(new_event(5)).await.unwrap();
        let patch = EventPatch {
            capacity: Some(Capacity::new(0)),
            ..EventPatch::default()
        };
        let err = svc.update(event.id, patch).await.unwrap_err();
        assert!(matches!(err, EventHubError::Validation(_)));

        let row = inner.get_event(event.id).await.unwrap().unwrap();
        assert!(row.registered <= row.capacity.value());
        assert_eq!(row.capacity.value(), 5);
    }

    #[tokio::test]
    async fn update_leaves_registered_alone() {
        let (store, svc) = service();
        let event = svc.create(new_event(10)).await.unwrap();
        assert!(store.update_registered(event.id, 0, 2).await.unwrap());

        let patch = EventPatch {
            title: Some("Renamed".to_string()),
            ..EventPatch::default()
        };
        let updated = svc.update(event.id, patch).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.registered, 2);
    }

    #[tokio::test]
    async fn delete_unknown_event() {
        let (_, svc) = service();
        let err = svc.delete(EventId::new()).await.unwrap_err();
        assert!(matches!(err, EventHubError::EventNotFound(_)));
    }
}
