//! `PostgreSQL` implementation of the store traits.
//!
//! Queries are plain `sqlx::query`/`query_as` with tuple rows. Every round
//! trip is wrapped in a bounded timeout: an elapsed bound maps to
//! [`StoreError::Timeout`], which callers treat as "outcome unknown" rather
//! than "did not happen".
//!
//! The two concurrency-sensitive primitives rely on the database:
//! `update_registered` is a conditional `UPDATE ... WHERE registered = $expected`
//! (compare-and-swap), and `apply_promotion` runs its three writes inside one
//! transaction with the same guard plus `promoted_at IS NULL`.

use super::{ChatStore, EventStore, ProfileStore, Promotion, Result, StoreError};
use crate::types::{
    AwardedBadge, Badge, Capacity, ChatMessage, ChatSender, Conversation, ConversationId, Event,
    EventId, EventStatus, Guest, GuestCategory, GuestId, GuestStatus, PointsTransaction, UserId,
    UserProfile, WaitlistEntry, WaitlistEntryId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

/// `PostgreSQL`-backed store implementing all three store traits.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    round_trip_timeout: Duration,
}

type EventRow = (
    Uuid,
    String,
    Option<String>,
    NaiveDate,
    NaiveTime,
    String,
    i32,
    i32,
    String,
    Option<Uuid>,
    DateTime<Utc>,
    DateTime<Utc>,
);

type GuestRow = (
    Uuid,
    Option<Uuid>,
    String,
    String,
    String,
    String,
    String,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
    DateTime<Utc>,
);

type WaitlistRow = (
    Uuid,
    Uuid,
    String,
    String,
    String,
    i32,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
);

type ProfileRow = (
    Uuid,
    Option<String>,
    i64,
    i64,
    i32,
    i32,
    Option<NaiveDate>,
    DateTime<Utc>,
);

type TransactionRow = (
    Uuid,
    Uuid,
    i32,
    String,
    String,
    Option<Uuid>,
    DateTime<Utc>,
);

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool, round_trip_timeout: Duration) -> Self {
        Self {
            pool,
            round_trip_timeout,
        }
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Bound a store round trip; elapse means the outcome is unknown.
    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        match tokio::time::timeout(self.round_trip_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        }
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Database(err.to_string()),
    }
}

#[allow(clippy::cast_sign_loss)]
fn event_from_row(row: EventRow) -> Result<Event> {
    let (id, title, description, date, time, location, capacity, registered, status, created_by, created_at, updated_at) =
        row;
    let status = EventStatus::parse(&status)
        .ok_or_else(|| StoreError::Database(format!("unknown event status '{status}'")))?;
    Ok(Event {
        id: EventId::from_uuid(id),
        title,
        description,
        date,
        time,
        location,
        capacity: Capacity::new(capacity as u32),
        registered: registered as u32,
        status,
        created_by: created_by.map(UserId::from_uuid),
        created_at,
        updated_at,
    })
}

fn guest_from_row(row: GuestRow) -> Result<Guest> {
    let (id, event_id, name, email, status, category, event_title, rsvp_date, created_at, updated_at) =
        row;
    let status = GuestStatus::parse(&status)
        .ok_or_else(|| StoreError::Database(format!("unknown guest status '{status}'")))?;
    let category = GuestCategory::parse(&category)
        .ok_or_else(|| StoreError::Database(format!("unknown guest category '{category}'")))?;
    Ok(Guest {
        id: GuestId::from_uuid(id),
        event_id: event_id.map(EventId::from_uuid),
        name,
        email,
        status,
        category,
        event_title,
        rsvp_date,
        created_at,
        updated_at,
    })
}

#[allow(clippy::cast_sign_loss)]
fn waitlist_from_row(row: WaitlistRow) -> Result<WaitlistEntry> {
    let (id, event_id, name, email, category, position, promoted_at, created_at) = row;
    let category = GuestCategory::parse(&category)
        .ok_or_else(|| StoreError::Database(format!("unknown guest category '{category}'")))?;
    Ok(WaitlistEntry {
        id: WaitlistEntryId::from_uuid(id),
        event_id: EventId::from_uuid(event_id),
        name,
        email,
        category,
        position: position as u32,
        promoted_at,
        created_at,
    })
}

#[allow(clippy::cast_sign_loss)]
fn profile_from_row(row: ProfileRow) -> UserProfile {
    let (user_id, display_name, total_points, experience_points, level, streak_count, last_activity_date, updated_at) =
        row;
    UserProfile {
        user_id: UserId::from_uuid(user_id),
        display_name,
        total_points: total_points as u64,
        experience_points: experience_points as u64,
        level: level as u32,
        streak_count: streak_count as u32,
        last_activity_date,
        updated_at,
    }
}

#[allow(clippy::cast_sign_loss)]
fn transaction_from_row(row: TransactionRow) -> PointsTransaction {
    let (id, user_id, points, action_type, description, event_id, created_at) = row;
    PointsTransaction {
        id,
        user_id: UserId::from_uuid(user_id),
        points: points as u32,
        action_type,
        description,
        event_id: event_id.map(EventId::from_uuid),
        created_at,
    }
}

#[allow(clippy::cast_possible_wrap)]
#[async_trait]
impl EventStore for PostgresStore {
    async fn ping(&self) -> Result<()> {
        self.bounded(async {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(())
        })
        .await
    }

    async fn insert_event(&self, event: &Event) -> Result<()> {
        self.bounded(async {
            sqlx::query(
                "INSERT INTO events
                    (id, title, description, date, time, location, capacity, registered,
                     status, created_by, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(event.id.as_uuid())
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(event.time)
            .bind(&event.location)
            .bind(event.capacity.value() as i32)
            .bind(event.registered as i32)
            .bind(event.status.as_str())
            .bind(event.created_by.map(|u| *u.as_uuid()))
            .bind(event.created_at)
            .bind(event.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
        .await
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>> {
        self.bounded(async {
            let row: Option<EventRow> = sqlx::query_as(
                "SELECT id, title, description, date, time, location, capacity, registered,
                        status, created_by, created_at, updated_at
                 FROM events WHERE id = $1",
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
            row.map(event_from_row).transpose()
        })
        .await
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        self.bounded(async {
            let rows: Vec<EventRow> = sqlx::query_as(
                "SELECT id, title, description, date, time, location, capacity, registered,
                        status, created_by, created_at, updated_at
                 FROM events ORDER BY date ASC, time ASC",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            rows.into_iter().map(event_from_row).collect()
        })
        .await
    }

    async fn update_event(&self, event: &Event) -> Result<bool> {
        // The shrink guard runs in the same statement as the write, so a
        // concurrent seat CAS cannot slip `registered` past the new capacity
        // between a read and this update.
        self.bounded(async {
            let result = sqlx::query(
                "UPDATE events SET
                    title = $2, description = $3, date = $4, time = $5, location = $6,
                    capacity = $7, status = $8, updated_at = $9
                 WHERE id = $1 AND registered <= $7",
            )
            .bind(event.id.as_uuid())
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.date)
            .bind(event.time)
            .bind(&event.location)
            .bind(event.capacity.value() as i32)
            .bind(event.status.as_str())
            .bind(event.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            if result.rows_affected() == 1 {
                return Ok(true);
            }
            let exists = sqlx::query("SELECT 1 FROM events WHERE id = $1")
                .bind(event.id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?
                .is_some();
            if exists {
                Err(StoreError::Conflict)
            } else {
                Ok(false)
            }
        })
        .await
    }

    async fn delete_event(&self, id: EventId) -> Result<bool> {
        // Guests and waitlist entries cascade via foreign keys.
        self.bounded(async {
            let result = sqlx::query("DELETE FROM events WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(result.rows_affected() == 1)
        })
        .await
    }

    async fn update_registered(&self, id: EventId, expected: u32, new: u32) -> Result<bool> {
        self.bounded(async {
            let result = sqlx::query(
                "UPDATE events SET registered = $3, updated_at = NOW()
                 WHERE id = $1 AND registered = $2",
            )
            .bind(id.as_uuid())
            .bind(expected as i32)
            .bind(new as i32)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(result.rows_affected() == 1)
        })
        .await
    }

    async fn insert_guest(&self, guest: &Guest) -> Result<()> {
        self.bounded(async {
            sqlx::query(
                "INSERT INTO guests
                    (id, event_id, name, email, status, category, event_title, rsvp_date,
                     created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(guest.id.as_uuid())
            .bind(guest.event_id.map(|e| *e.as_uuid()))
            .bind(&guest.name)
            .bind(&guest.email)
            .bind(guest.status.as_str())
            .bind(guest.category.as_str())
            .bind(&guest.event_title)
            .bind(guest.rsvp_date)
            .bind(guest.created_at)
            .bind(guest.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
        .await
    }

    async fn get_guest(&self, id: GuestId) -> Result<Option<Guest>> {
        self.bounded(async {
            let row: Option<GuestRow> = sqlx::query_as(
                "SELECT id, event_id, name, email, status, category, event_title, rsvp_date,
                        created_at, updated_at
                 FROM guests WHERE id = $1",
            )
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
            row.map(guest_from_row).transpose()
        })
        .await
    }

    async fn list_guests(&self, event_id: Option<EventId>) -> Result<Vec<Guest>> {
        self.bounded(async {
            let rows: Vec<GuestRow> = sqlx::query_as(
                "SELECT id, event_id, name, email, status, category, event_title, rsvp_date,
                        created_at, updated_at
                 FROM guests
                 WHERE $1::uuid IS NULL OR event_id = $1
                 ORDER BY created_at DESC",
            )
            .bind(event_id.map(|e| *e.as_uuid()))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            rows.into_iter().map(guest_from_row).collect()
        })
        .await
    }

    async fn update_guest(&self, guest: &Guest) -> Result<bool> {
        self.bounded(async {
            let result = sqlx::query(
                "UPDATE guests SET
                    event_id = $2, name = $3, email = $4, status = $5, category = $6,
                    event_title = $7, rsvp_date = $8, updated_at = $9
                 WHERE id = $1",
            )
            .bind(guest.id.as_uuid())
            .bind(guest.event_id.map(|e| *e.as_uuid()))
            .bind(&guest.name)
            .bind(&guest.email)
            .bind(guest.status.as_str())
            .bind(guest.category.as_str())
            .bind(&guest.event_title)
            .bind(guest.rsvp_date)
            .bind(guest.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(result.rows_affected() == 1)
        })
        .await
    }

    async fn delete_guest(&self, id: GuestId) -> Result<bool> {
        self.bounded(async {
            let result = sqlx::query("DELETE FROM guests WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(result.rows_affected() == 1)
        })
        .await
    }

    async fn count_waitlist(&self, event_id: EventId) -> Result<u32> {
        self.bounded(async {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM waitlist WHERE event_id = $1")
                    .bind(event_id.as_uuid())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx)?;
            Ok(u32::try_from(count).unwrap_or(u32::MAX))
        })
        .await
    }

    async fn insert_waitlist_entry(&self, entry: &WaitlistEntry) -> Result<()> {
        // The unique (event_id, position) index turns a racing join into
        // StoreError::Conflict, which the service retries with a fresh count.
        self.bounded(async {
            sqlx::query(
                "INSERT INTO waitlist
                    (id, event_id, name, email, category, \"position\", promoted_at, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(entry.id.as_uuid())
            .bind(entry.event_id.as_uuid())
            .bind(&entry.name)
            .bind(&entry.email)
            .bind(entry.category.as_str())
            .bind(entry.position as i32)
            .bind(entry.promoted_at)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
        .await
    }

    async fn next_unpromoted(&self, event_id: EventId) -> Result<Option<WaitlistEntry>> {
        self.bounded(async {
            let row: Option<WaitlistRow> = sqlx::query_as(
                "SELECT id, event_id, name, email, category, \"position\", promoted_at, created_at
                 FROM waitlist
                 WHERE event_id = $1 AND promoted_at IS NULL
                 ORDER BY \"position\" ASC
                 LIMIT 1",
            )
            .bind(event_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
            row.map(waitlist_from_row).transpose()
        })
        .await
    }

    async fn active_waitlist(&self, event_id: EventId) -> Result<Vec<WaitlistEntry>> {
        self.bounded(async {
            let rows: Vec<WaitlistRow> = sqlx::query_as(
                "SELECT id, event_id, name, email, category, \"position\", promoted_at, created_at
                 FROM waitlist
                 WHERE event_id = $1 AND promoted_at IS NULL
                 ORDER BY \"position\" ASC",
            )
            .bind(event_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            rows.into_iter().map(waitlist_from_row).collect()
        })
        .await
    }

    async fn apply_promotion(&self, promotion: &Promotion) -> Result<()> {
        self.bounded(async {
            let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

            let guest = &promotion.guest;
            sqlx::query(
                "INSERT INTO guests
                    (id, event_id, name, email, status, category, event_title, rsvp_date,
                     created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(guest.id.as_uuid())
            .bind(guest.event_id.map(|e| *e.as_uuid()))
            .bind(&guest.name)
            .bind(&guest.email)
            .bind(guest.status.as_str())
            .bind(guest.category.as_str())
            .bind(&guest.event_title)
            .bind(guest.rsvp_date)
            .bind(guest.created_at)
            .bind(guest.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

            let marked = sqlx::query(
                "UPDATE waitlist SET promoted_at = $2
                 WHERE id = $1 AND promoted_at IS NULL",
            )
            .bind(promotion.entry_id.as_uuid())
            .bind(promotion.promoted_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
            if marked.rows_affected() != 1 {
                // Dropping the transaction rolls everything back.
                return Err(StoreError::Conflict);
            }

            let bumped = sqlx::query(
                "UPDATE events SET registered = $3, updated_at = $4
                 WHERE id = $1 AND registered = $2",
            )
            .bind(promotion.event_id.as_uuid())
            .bind(promotion.expected_registered as i32)
            .bind(promotion.new_registered as i32)
            .bind(promotion.promoted_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
            if bumped.rows_affected() != 1 {
                return Err(StoreError::Conflict);
            }

            tx.commit().await.map_err(map_sqlx)?;
            Ok(())
        })
        .await
    }
}

#[allow(clippy::cast_possible_wrap)]
#[async_trait]
impl ProfileStore for PostgresStore {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>> {
        self.bounded(async {
            let row: Option<ProfileRow> = sqlx::query_as(
                "SELECT user_id, display_name, total_points, experience_points, level,
                        streak_count, last_activity_date, updated_at
                 FROM user_profiles WHERE user_id = $1",
            )
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(row.map(profile_from_row))
        })
        .await
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.bounded(async {
            sqlx::query(
                "INSERT INTO user_profiles
                    (user_id, display_name, total_points, experience_points, level,
                     streak_count, last_activity_date, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 ON CONFLICT (user_id) DO UPDATE SET
                    display_name = EXCLUDED.display_name,
                    total_points = EXCLUDED.total_points,
                    experience_points = EXCLUDED.experience_points,
                    level = EXCLUDED.level,
                    streak_count = EXCLUDED.streak_count,
                    last_activity_date = EXCLUDED.last_activity_date,
                    updated_at = EXCLUDED.updated_at",
            )
            .bind(profile.user_id.as_uuid())
            .bind(&profile.display_name)
            .bind(profile.total_points as i64)
            .bind(profile.experience_points as i64)
            .bind(profile.level as i32)
            .bind(profile.streak_count as i32)
            .bind(profile.last_activity_date)
            .bind(profile.updated_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
        .await
    }

    async fn insert_transaction(&self, tx: &PointsTransaction) -> Result<()> {
        self.bounded(async {
            sqlx::query(
                "INSERT INTO points_transactions
                    (id, user_id, points, action_type, description, event_id, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(tx.id)
            .bind(tx.user_id.as_uuid())
            .bind(tx.points as i32)
            .bind(&tx.action_type)
            .bind(&tx.description)
            .bind(tx.event_id.map(|e| *e.as_uuid()))
            .bind(tx.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
        .await
    }

    async fn recent_transactions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<PointsTransaction>> {
        self.bounded(async {
            let rows: Vec<TransactionRow> = sqlx::query_as(
                "SELECT id, user_id, points, action_type, description, event_id, created_at
                 FROM points_transactions
                 WHERE user_id = $1
                 ORDER BY created_at DESC
                 LIMIT $2",
            )
            .bind(user_id.as_uuid())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(rows.into_iter().map(transaction_from_row).collect())
        })
        .await
    }

    async fn awarded_badges(&self, user_id: UserId) -> Result<Vec<AwardedBadge>> {
        self.bounded(async {
            let rows: Vec<(Uuid, String, DateTime<Utc>)> = sqlx::query_as(
                "SELECT user_id, badge, awarded_at
                 FROM user_badges WHERE user_id = $1
                 ORDER BY awarded_at ASC",
            )
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(rows
                .into_iter()
                .filter_map(|(user_id, badge, awarded_at)| {
                    let Some(badge) = Badge::parse(&badge) else {
                        tracing::warn!(badge, "skipping unknown badge name in user_badges");
                        return None;
                    };
                    Some(AwardedBadge {
                        user_id: UserId::from_uuid(user_id),
                        badge,
                        awarded_at,
                    })
                })
                .collect())
        })
        .await
    }

    async fn award_badge(&self, award: &AwardedBadge) -> Result<()> {
        self.bounded(async {
            sqlx::query(
                "INSERT INTO user_badges (user_id, badge, awarded_at)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (user_id, badge) DO NOTHING",
            )
            .bind(award.user_id.as_uuid())
            .bind(award.badge.name())
            .bind(award.awarded_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
        .await
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<UserProfile>> {
        self.bounded(async {
            let rows: Vec<ProfileRow> = sqlx::query_as(
                "SELECT user_id, display_name, total_points, experience_points, level,
                        streak_count, last_activity_date, updated_at
                 FROM user_profiles
                 ORDER BY total_points DESC
                 LIMIT $1",
            )
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(rows.into_iter().map(profile_from_row).collect())
        })
        .await
    }

    async fn count_events_created_by(&self, user_id: UserId) -> Result<u32> {
        self.bounded(async {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM events WHERE created_by = $1")
                    .bind(user_id.as_uuid())
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx)?;
            Ok(u32::try_from(count).unwrap_or(u32::MAX))
        })
        .await
    }

    async fn count_confirmed_rsvps(&self, email: &str) -> Result<u32> {
        self.bounded(async {
            let (count,): (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM guests WHERE email = $1 AND status = 'confirmed'",
            )
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(u32::try_from(count).unwrap_or(u32::MAX))
        })
        .await
    }
}

#[async_trait]
impl ChatStore for PostgresStore {
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<()> {
        self.bounded(async {
            sqlx::query(
                "INSERT INTO chat_conversations
                    (id, event_id, guest_email, guest_name, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(conversation.id.as_uuid())
            .bind(conversation.event_id.as_uuid())
            .bind(&conversation.guest_email)
            .bind(&conversation.guest_name)
            .bind(conversation.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
        .await
    }

    async fn get_conversation(&self, id: ConversationId) -> Result<Option<Conversation>> {
        self.bounded(async {
            let row: Option<(Uuid, Uuid, Option<String>, Option<String>, DateTime<Utc>)> =
                sqlx::query_as(
                    "SELECT id, event_id, guest_email, guest_name, created_at
                     FROM chat_conversations WHERE id = $1",
                )
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(row.map(|(id, event_id, guest_email, guest_name, created_at)| Conversation {
                id: ConversationId::from_uuid(id),
                event_id: EventId::from_uuid(event_id),
                guest_email,
                guest_name,
                created_at,
            }))
        })
        .await
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<()> {
        self.bounded(async {
            sqlx::query(
                "INSERT INTO chat_messages
                    (id, conversation_id, sender, message, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(message.id)
            .bind(message.conversation_id.as_uuid())
            .bind(message.sender.as_str())
            .bind(&message.message)
            .bind(message.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
        .await
    }

    async fn conversation_messages(&self, id: ConversationId) -> Result<Vec<ChatMessage>> {
        self.bounded(async {
            let rows: Vec<(Uuid, Uuid, String, String, DateTime<Utc>)> = sqlx::query_as(
                "SELECT id, conversation_id, sender, message, created_at
                 FROM chat_messages
                 WHERE conversation_id = $1
                 ORDER BY created_at ASC",
            )
            .bind(id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            rows.into_iter()
                .map(|(id, conversation_id, sender, message, created_at)| {
                    let sender = ChatSender::parse(&sender).ok_or_else(|| {
                        StoreError::Database(format!("unknown chat sender '{sender}'"))
                    })?;
                    Ok(ChatMessage {
                        id,
                        conversation_id: ConversationId::from_uuid(conversation_id),
                        sender,
                        message,
                        created_at,
                    })
                })
                .collect()
        })
        .await
    }
}
