//! Waitlist joins and capacity-guarded promotion.
//!
//! Promotion is the one operation where correctness under concurrency
//! matters: a promotion must never push an event's `registered` count past
//! its capacity, even when two promotions race. The service reads the event
//! and the head of the waitlist optimistically, then hands the store an
//! atomic [`Promotion`] unit whose guards re-check both reads. A guard
//! failure surfaces as [`StoreError::Conflict`] and the whole operation is
//! retried from the first read, so the loser of a race re-observes the event
//! as full and reports that instead of overbooking.

use crate::clock::Clock;
use crate::error::{EventHubError, Result};
use crate::store::{EventStore, Promotion, StoreError};
use crate::types::{Event, EventId, Guest, GuestCategory, GuestId, GuestStatus, WaitlistEntry, WaitlistEntryId};
use std::sync::Arc;

/// Optimistic retry bound for promotion and join.
const MAX_ATTEMPTS: u32 = 3;

/// A successful promotion: the confirmed guest that was created and the
/// waitlist entry it came from, as it read before being marked promoted.
#[derive(Clone, Debug)]
pub struct Promoted {
    /// The newly confirmed guest
    pub guest: Guest,
    /// The entry that was promoted (its `promoted_at` is still `None`)
    pub entry: WaitlistEntry,
}

/// Waitlist operations for a single event.
#[derive(Clone)]
pub struct WaitlistService {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl WaitlistService {
    /// Creates a service over the given store and clock.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Appends a person to the event's waitlist.
    ///
    /// The assigned position is `count + 1` over all entries ever created
    /// for the event, so positions keep growing even after promotions. Two
    /// racing joins that compute the same position collide on the store's
    /// uniqueness guard; the loser recounts and retries.
    ///
    /// # Errors
    ///
    /// [`EventHubError::Validation`] for a blank name or email,
    /// [`EventHubError::EventNotFound`] for an unknown event,
    /// [`EventHubError::Contention`] when retries are exhausted.
    pub async fn join(
        &self,
        event_id: EventId,
        name: &str,
        email: &str,
        category: GuestCategory,
    ) -> Result<WaitlistEntry> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(EventHubError::Validation(
                "Name and email are required".to_string(),
            ));
        }

        // Existence check only; joining stays open while the event is full.
        self.read_event(event_id).await?;

        for attempt in 1..=MAX_ATTEMPTS {
            let count = match self.store.count_waitlist(event_id).await {
                Err(StoreError::Timeout) => self.store.count_waitlist(event_id).await?,
                other => other?,
            };

            let entry = WaitlistEntry {
                id: WaitlistEntryId::new(),
                event_id,
                name: name.to_string(),
                email: email.to_string(),
                category,
                position: count + 1,
                promoted_at: None,
                created_at: self.clock.now(),
            };

            match self.store.insert_waitlist_entry(&entry).await {
                Ok(()) => {
                    metrics::counter!("eventhub_waitlist_joins_total").increment(1);
                    return Ok(entry);
                }
                Err(StoreError::Conflict) => {
                    tracing::debug!(
                        event_id = %event_id,
                        position = entry.position,
                        attempt,
                        "waitlist position taken, recounting"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(EventHubError::Contention)
    }

    /// The entry that would be promoted next, if any.
    ///
    /// # Errors
    ///
    /// Fails when the event is unknown or the store is unreachable.
    pub async fn peek_next(&self, event_id: EventId) -> Result<Option<WaitlistEntry>> {
        self.read_event(event_id).await?;
        match self.store.next_unpromoted(event_id).await {
            Err(StoreError::Timeout) => Ok(self.store.next_unpromoted(event_id).await?),
            other => Ok(other?),
        }
    }

    /// All unpromoted entries, ascending by position.
    ///
    /// # Errors
    ///
    /// Fails when the event is unknown or the store is unreachable.
    pub async fn list_active(&self, event_id: EventId) -> Result<Vec<WaitlistEntry>> {
        self.read_event(event_id).await?;
        match self.store.active_waitlist(event_id).await {
            Err(StoreError::Timeout) => Ok(self.store.active_waitlist(event_id).await?),
            other => Ok(other?),
        }
    }

    /// Promotes the head of the waitlist into a confirmed guest.
    ///
    /// Fails fast when the event is already at capacity or the waitlist is
    /// empty. The seat grab and the promotion mark are applied as one atomic
    /// unit; if a concurrent update invalidates either, the operation is
    /// retried from the capacity check.
    ///
    /// # Errors
    ///
    /// [`EventHubError::CapacityExceeded`] when no seat is free,
    /// [`EventHubError::WaitlistEmpty`] when nobody is waiting,
    /// [`EventHubError::EventNotFound`] for an unknown event,
    /// [`EventHubError::StoreTimeout`] when the atomic unit's outcome is
    /// unknown (never blindly retried),
    /// [`EventHubError::Contention`] when retries are exhausted.
    pub async fn promote(&self, event_id: EventId) -> Result<Promoted> {
        for attempt in 1..=MAX_ATTEMPTS {
            let event = self.read_event(event_id).await?;
            if event.is_full() {
                metrics::counter!("eventhub_promotions_total", "outcome" => "at_capacity")
                    .increment(1);
                return Err(EventHubError::CapacityExceeded);
            }

            let entry = match self.store.next_unpromoted(event_id).await {
                Err(StoreError::Timeout) => self.store.next_unpromoted(event_id).await?,
                other => other?,
            };
            let Some(entry) = entry else {
                metrics::counter!("eventhub_promotions_total", "outcome" => "empty").increment(1);
                return Err(EventHubError::WaitlistEmpty);
            };

            let now = self.clock.now();
            let guest = Guest {
                id: GuestId::new(),
                event_id: Some(event_id),
                name: entry.name.clone(),
                email: entry.email.clone(),
                status: GuestStatus::Confirmed,
                category: entry.category,
                event_title: event.title.clone(),
                rsvp_date: Some(now),
                created_at: now,
                updated_at: now,
            };
            let promotion = Promotion {
                event_id,
                entry_id: entry.id,
                guest: guest.clone(),
                promoted_at: now,
                expected_registered: event.registered,
                new_registered: event.registered + 1,
            };

            match self.store.apply_promotion(&promotion).await {
                Ok(()) => {
                    metrics::counter!("eventhub_promotions_total", "outcome" => "promoted")
                        .increment(1);
                    tracing::info!(
                        event_id = %event_id,
                        entry_id = %entry.id,
                        position = entry.position,
                        registered = promotion.new_registered,
                        "promoted waitlist entry"
                    );
                    return Ok(Promoted { guest, entry });
                }
                Err(StoreError::Conflict) => {
                    tracing::debug!(
                        event_id = %event_id,
                        attempt,
                        "promotion guard failed, re-reading event"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        metrics::counter!("eventhub_promotions_total", "outcome" => "contention").increment(1);
        Err(EventHubError::Contention)
    }

    async fn read_event(&self, event_id: EventId) -> Result<Event> {
        let event = match self.store.get_event(event_id).await {
            Err(StoreError::Timeout) => self.store.get_event(event_id).await?,
            other => other?,
        };
        event.ok_or(EventHubError::EventNotFound(event_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::InMemoryStore;
    use crate::types::{Capacity, EventStatus};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn service(store: Arc<InMemoryStore>) -> WaitlistService {
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        WaitlistService::new(store, clock)
    }

    fn sample_event(capacity: u32, registered: u32) -> Event {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
        Event {
            id: EventId::new(),
            title: "Launch Party".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
            time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            location: "Rooftop".to_string(),
            capacity: Capacity::new(capacity),
            registered,
            status: EventStatus::Upcoming,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seeded(capacity: u32, registered: u32) -> (Arc<InMemoryStore>, WaitlistService, EventId) {
        let store = Arc::new(InMemoryStore::new());
        let event = sample_event(capacity, registered);
        let event_id = event.id;
        store.insert_event(&event).await.unwrap();
        let svc = service(Arc::clone(&store));
        (store, svc, event_id)
    }

    #[tokio::test]
    async fn join_assigns_sequential_positions() {
        let (_, svc, event_id) = seeded(5, 0).await;

        let a = svc
            .join(event_id, "Ada", "ada@example.com", GuestCategory::Regular)
            .await
            .unwrap();
        let b = svc
            .join(event_id, "Ben", "ben@example.com", GuestCategory::Vip)
            .await
            .unwrap();
        let c = svc
            .join(event_id, "Cam", "cam@example.com", GuestCategory::Regular)
            .await
            .unwrap();

        assert_eq!(a.position, 1);
        assert_eq!(b.position, 2);
        assert_eq!(c.position, 3);

        let active = svc.list_active(event_id).await.unwrap();
        assert_eq!(active.len(), 3);
        assert!(active.windows(2).all(|w| w[0].position < w[1].position));
    }

    #[tokio::test]
    async fn join_rejects_blank_identity() {
        let (_, svc, event_id) = seeded(5, 0).await;

        let err = svc
            .join(event_id, "  ", "ada@example.com", GuestCategory::Regular)
            .await
            .unwrap_err();
        assert!(matches!(err, EventHubError::Validation(_)));

        let err = svc
            .join(event_id, "Ada", "", GuestCategory::Regular)
            .await
            .unwrap_err();
        assert!(matches!(err, EventHubError::Validation(_)));
    }

    #[tokio::test]
    async fn join_requires_existing_event() {
        let (_, svc, _) = seeded(5, 0).await;
        let err = svc
            .join(EventId::new(), "Ada", "ada@example.com", GuestCategory::Regular)
            .await
            .unwrap_err();
        assert!(matches!(err, EventHubError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn promote_fails_when_event_is_full() {
        let (store, svc, event_id) = seeded(1, 1).await;
        svc.join(event_id, "Ada", "ada@example.com", GuestCategory::Regular)
            .await
            .unwrap();

        let err = svc.promote(event_id).await.unwrap_err();
        assert_eq!(err, EventHubError::CapacityExceeded);

        // The waitlist and the count are untouched by the failed promotion.
        let event = store.get_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.registered, 1);
        let active = svc.list_active(event_id).await.unwrap();
        assert_eq!(active.len(), 1);
        assert!(active[0].promoted_at.is_none());
    }

    #[tokio::test]
    async fn promote_moves_head_of_waitlist() {
        let (store, svc, event_id) = seeded(2, 1).await;
        svc.join(event_id, "Ada", "ada@example.com", GuestCategory::Regular)
            .await
            .unwrap();
        svc.join(event_id, "Ben", "ben@example.com", GuestCategory::Vip)
            .await
            .unwrap();

        let promoted = svc.promote(event_id).await.unwrap();
        assert_eq!(promoted.guest.name, "Ada");
        assert_eq!(promoted.guest.status, GuestStatus::Confirmed);
        assert_eq!(promoted.guest.event_title, "Launch Party");
        assert!(promoted.guest.rsvp_date.is_some());
        assert_eq!(promoted.entry.position, 1);
        assert!(promoted.entry.promoted_at.is_none());

        let event = store.get_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.registered, 2);

        let next = svc.peek_next(event_id).await.unwrap().unwrap();
        assert_eq!(next.name, "Ben");
        assert_eq!(next.position, 2);
    }

    #[tokio::test]
    async fn promote_empty_waitlist() {
        let (_, svc, event_id) = seeded(2, 0).await;
        let err = svc.promote(event_id).await.unwrap_err();
        assert_eq!(err, EventHubError::WaitlistEmpty);
    }

    #[tokio::test]
    async fn promote_unknown_event() {
        let (_, svc, _) = seeded(2, 0).await;
        let err = svc.promote(EventId::new()).await.unwrap_err();
        assert!(matches!(err, EventHubError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_promotions_fill_exactly_one_seat() {
        let (store, svc, event_id) = seeded(1, 0).await;
        svc.join(event_id, "Ada", "ada@example.com", GuestCategory::Regular)
            .await
            .unwrap();
        svc.join(event_id, "Ben", "ben@example.com", GuestCategory::Regular)
            .await
            .unwrap();

        let first = tokio::spawn({
            let svc = svc.clone();
            async move { svc.promote(event_id).await }
        });
        let second = tokio::spawn({
            let svc = svc.clone();
            async move { svc.promote(event_id).await }
        });

        let results = [first.await.unwrap(), second.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(results
            .iter()
            .any(|r| r.as_ref().err() == Some(&EventHubError::CapacityExceeded)));

        let event = store.get_event(event_id).await.unwrap().unwrap();
        assert_eq!(event.registered, 1);
        assert_eq!(svc.list_active(event_id).await.unwrap().len(), 1);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Whatever interleaving of joins and promotions runs, the
            // registered count never exceeds capacity and never drops.
            #[test]
            fn registered_stays_within_capacity(
                capacity in 0u32..4,
                registered in 0u32..4,
                ops in proptest::collection::vec(proptest::bool::ANY, 1..24),
            ) {
                let registered = registered.min(capacity);
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .unwrap();
                rt.block_on(async move {
                    let (store, svc, event_id) = seeded(capacity, registered).await;
                    let mut joined = 0u32;
                    for join_next in ops {
                        if join_next {
                            joined += 1;
                            svc.join(
                                event_id,
                                &format!("guest-{joined}"),
                                &format!("guest-{joined}@example.com"),
                                GuestCategory::Regular,
                            )
                            .await
                            .unwrap();
                        } else {
                            match svc.promote(event_id).await {
                                Ok(_)
                                | Err(EventHubError::CapacityExceeded)
                                | Err(EventHubError::WaitlistEmpty) => {}
                                Err(other) => panic!("unexpected error: {other}"),
                            }
                        }
                        let event = store.get_event(event_id).await.unwrap().unwrap();
                        assert!(event.registered <= event.capacity.value());
                        assert!(event.registered >= registered);
                    }
                });
            }
        }
    }
}
