//! Guest CRUD with seat accounting.
//!
//! A confirmed guest on an event holds a seat. Every transition into or out
//! of the confirmed state moves the event's `registered` count through the
//! store's compare-and-swap, so concurrent RSVPs can never oversell an
//! event. The guest row itself carries no seat state; `registered` on the
//! event is the single source of truth.

use crate::clock::Clock;
use crate::error::{EventHubError, Result};
use crate::store::{EventStore, StoreError};
use crate::types::{Event, EventId, Guest, GuestCategory, GuestId, GuestStatus};
use std::sync::Arc;

/// Optimistic retry bound for the seat compare-and-swap.
const MAX_SEAT_ATTEMPTS: u32 = 5;

/// Fields for creating a guest.
#[derive(Clone, Debug)]
pub struct NewGuest {
    /// Event the guest belongs to, when any
    pub event_id: Option<EventId>,
    /// Guest name
    pub name: String,
    /// Guest email
    pub email: String,
    /// RSVP status
    pub status: GuestStatus,
    /// Guest category
    pub category: GuestCategory,
}

/// Editable guest fields. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct GuestPatch {
    /// New name
    pub name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New RSVP status
    pub status: Option<GuestStatus>,
    /// New category
    pub category: Option<GuestCategory>,
}

/// Guest operations.
#[derive(Clone)]
pub struct GuestService {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl GuestService {
    /// Creates a service over the given store and clock.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Creates a guest. A confirmed guest on an event takes a seat first;
    /// if the insert then fails, the seat is handed back.
    ///
    /// # Errors
    ///
    /// [`EventHubError::Validation`] for a blank name or email,
    /// [`EventHubError::EventNotFound`] for an unknown event,
    /// [`EventHubError::CapacityExceeded`] when the event is full.
    pub async fn create(&self, new: NewGuest) -> Result<Guest> {
        let name = new.name.trim().to_string();
        let email = new.email.trim().to_string();
        if name.is_empty() || email.is_empty() {
            return Err(EventHubError::Validation(
                "Name and email are required".to_string(),
            ));
        }

        let event = match new.event_id {
            Some(event_id) => Some(self.read_event(event_id).await?),
            None => None,
        };

        let takes_seat = new.status == GuestStatus::Confirmed && event.is_some();
        if takes_seat {
            if let Some(event) = &event {
                self.reserve_seat(event.id).await?;
            }
        }

        let now = self.clock.now();
        let guest = Guest {
            id: GuestId::new(),
            event_id: new.event_id,
            name,
            email,
            status: new.status,
            category: new.category,
            event_title: event.as_ref().map(|e| e.title.clone()).unwrap_or_default(),
            rsvp_date: (new.status == GuestStatus::Confirmed).then_some(now),
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.store.insert_guest(&guest).await {
            // A timeout means the insert may have committed; releasing the
            // seat here could oversell, so the reservation stands until the
            // outcome is known.
            if takes_seat && !matches!(err, StoreError::Timeout) {
                if let Some(event) = &event {
                    self.release_seat(event.id).await?;
                }
            }
            return Err(err.into());
        }

        metrics::counter!("eventhub_guests_created_total").increment(1);
        tracing::info!(guest_id = %guest.id, status = guest.status.as_str(), "created guest");
        Ok(guest)
    }

    /// Guests, newest first, optionally scoped to one event.
    ///
    /// # Errors
    ///
    /// Fails when the store is unreachable.
    pub async fn list(&self, event_id: Option<EventId>) -> Result<Vec<Guest>> {
        Ok(self.store.list_guests(event_id).await?)
    }

    /// Fetches one guest.
    ///
    /// # Errors
    ///
    /// [`EventHubError::GuestNotFound`] for an unknown id.
    pub async fn get(&self, id: GuestId) -> Result<Guest> {
        self.store
            .get_guest(id)
            .await?
            .ok_or(EventHubError::GuestNotFound(id))
    }

    /// Applies a patch to a guest. A status change into the confirmed state
    /// takes a seat before the row is written; a change out of it hands the
    /// seat back after.
    ///
    /// # Errors
    ///
    /// [`EventHubError::GuestNotFound`] for an unknown id,
    /// [`EventHubError::CapacityExceeded`] when confirming on a full event.
    pub async fn update(&self, id: GuestId, patch: GuestPatch) -> Result<Guest> {
        let mut guest = self.get(id).await?;
        let was_confirmed = guest.status == GuestStatus::Confirmed;

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(EventHubError::Validation("Name is required".to_string()));
            }
            guest.name = name;
        }
        if let Some(email) = patch.email {
            let email = email.trim().to_string();
            if email.is_empty() {
                return Err(EventHubError::Validation("Email is required".to_string()));
            }
            guest.email = email;
        }
        if let Some(category) = patch.category {
            guest.category = category;
        }
        if let Some(status) = patch.status {
            guest.status = status;
        }

        let now = self.clock.now();
        let is_confirmed = guest.status == GuestStatus::Confirmed;
        if is_confirmed && !was_confirmed {
            guest.rsvp_date = Some(now);
            if let Some(event_id) = guest.event_id {
                self.reserve_seat(event_id).await?;
            }
        }
        guest.updated_at = now;

        let written = match self.store.update_guest(&guest).await {
            Ok(written) => written,
            Err(err) => {
                // The seat was taken before the write; hand it back on a
                // definite failure. A timeout leaves the write's outcome
                // unknown, so the reservation stands.
                if is_confirmed && !was_confirmed && !matches!(err, StoreError::Timeout) {
                    if let Some(event_id) = guest.event_id {
                        self.release_seat(event_id).await?;
                    }
                }
                return Err(err.into());
            }
        };
        if !written {
            return Err(EventHubError::GuestNotFound(id));
        }

        if was_confirmed && !is_confirmed {
            if let Some(event_id) = guest.event_id {
                self.release_seat(event_id).await?;
            }
        }

        Ok(guest)
    }

    /// Deletes a guest, releasing their seat if they held one.
    ///
    /// # Errors
    ///
    /// [`EventHubError::GuestNotFound`] for an unknown id.
    pub async fn delete(&self, id: GuestId) -> Result<()> {
        let guest = self.get(id).await?;
        if !self.store.delete_guest(id).await? {
            return Err(EventHubError::GuestNotFound(id));
        }
        if guest.status == GuestStatus::Confirmed {
            if let Some(event_id) = guest.event_id {
                self.release_seat(event_id).await?;
            }
        }
        Ok(())
    }

    async fn read_event(&self, event_id: EventId) -> Result<Event> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or(EventHubError::EventNotFound(event_id))
    }

    async fn reserve_seat(&self, event_id: EventId) -> Result<()> {
        for attempt in 1..=MAX_SEAT_ATTEMPTS {
            let event = self.read_event(event_id).await?;
            if event.is_full() {
                return Err(EventHubError::CapacityExceeded);
            }
            match self
                .store
                .update_registered(event_id, event.registered, event.registered + 1)
                .await
            {
                Ok(true) => return Ok(()),
                Ok(false) => {
                    tracing::debug!(event_id = %event_id, attempt, "seat count moved, retrying reserve");
                }
                Err(StoreError::Timeout) => return Err(EventHubError::StoreTimeout),
                Err(err) => return Err(err.into()),
            }
        }
        Err(EventHubError::Contention)
    }

    async fn release_seat(&self, event_id: EventId) -> Result<()> {
        for attempt in 1..=MAX_SEAT_ATTEMPTS {
            let event = self.read_event(event_id).await?;
            if event.registered == 0 {
                tracing::warn!(event_id = %event_id, "release with zero registered, ignoring");
                return Ok(());
            }
            match self
                .store
                .update_registered(event_id, event.registered, event.registered - 1)
                .await
            {
                Ok(true) => return Ok(()),
                Ok(false) => {
                    tracing::debug!(event_id = %event_id, attempt, "seat count moved, retrying release");
                }
                Err(StoreError::Timeout) => return Err(EventHubError::StoreTimeout),
                Err(err) => return Err(err.into()),
            }
        }
        Err(EventHubError::Contention)
    }
}
