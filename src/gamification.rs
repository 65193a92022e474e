//! Points, levels, streaks, and badges.
//!
//! The point values and level curve are product constants: every 1000
//! experience points is one level, starting at level 1. Streaks count
//! consecutive active days; a gap resets to 1, and a second action on the
//! same day leaves the streak untouched.

use crate::clock::Clock;
use crate::error::{EventHubError, Result};
use crate::store::{ProfileStore, missing_badges};
use crate::types::{
    AwardedBadge, Badge, EventId, PointsTransaction, UserId, UserProfile,
};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

/// Actions that earn points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointsAction {
    /// User created an event
    EventCreated,
    /// User confirmed an RSVP
    RsvpConfirmed,
    /// User attended an event
    EventAttended,
    /// User logged in today
    DailyLogin,
    /// User completed a referral
    ReferralCompleted,
    /// User filled out their profile
    ProfileCompleted,
}

impl PointsAction {
    /// Parses the storage form, e.g. `event_created`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "event_created" => Some(Self::EventCreated),
            "rsvp_confirmed" => Some(Self::RsvpConfirmed),
            "event_attended" => Some(Self::EventAttended),
            "daily_login" => Some(Self::DailyLogin),
            "referral_completed" => Some(Self::ReferralCompleted),
            "profile_completed" => Some(Self::ProfileCompleted),
            _ => None,
        }
    }

    /// Stable string form used in storage and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EventCreated => "event_created",
            Self::RsvpConfirmed => "rsvp_confirmed",
            Self::EventAttended => "event_attended",
            Self::DailyLogin => "daily_login",
            Self::ReferralCompleted => "referral_completed",
            Self::ProfileCompleted => "profile_completed",
        }
    }

    /// Points this action is worth.
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            Self::EventCreated => 100,
            Self::RsvpConfirmed => 25,
            Self::EventAttended => 50,
            Self::DailyLogin => 10,
            Self::ReferralCompleted => 200,
            Self::ProfileCompleted => 50,
        }
    }

    /// Human-readable transaction description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::EventCreated => "Created an event",
            Self::RsvpConfirmed => "Confirmed an RSVP",
            Self::EventAttended => "Attended an event",
            Self::DailyLogin => "Daily login",
            Self::ReferralCompleted => "Completed a referral",
            Self::ProfileCompleted => "Completed their profile",
        }
    }
}

/// Level implied by an experience total. 1000 experience per level.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn level_for(experience: u64) -> u32 {
    (experience / 1000) as u32 + 1
}

/// Streak value after activity on `today`, given the previous activity day.
#[must_use]
pub fn next_streak(last_activity: Option<NaiveDate>, today: NaiveDate, current: u32) -> u32 {
    match last_activity {
        Some(last) if last == today => current,
        Some(last) if today.signed_duration_since(last).num_days() == 1 => current + 1,
        _ => 1,
    }
}

/// Outcome of awarding points.
#[derive(Clone, Debug)]
pub struct AwardOutcome {
    /// Profile after the award
    pub profile: UserProfile,
    /// Points just granted
    pub points_awarded: u32,
    /// Whether the award pushed the user over a level boundary
    pub leveled_up: bool,
}

/// Full profile view for the API.
#[derive(Clone, Debug)]
pub struct ProfileView {
    /// The profile itself
    pub profile: UserProfile,
    /// Badges held
    pub badges: Vec<AwardedBadge>,
    /// Ten most recent point awards
    pub recent_transactions: Vec<PointsTransaction>,
}

/// Gamification operations.
#[derive(Clone)]
pub struct GamificationService {
    store: Arc<dyn ProfileStore>,
    clock: Arc<dyn Clock>,
}

impl GamificationService {
    /// Creates a service over the given store and clock.
    #[must_use]
    pub fn new(store: Arc<dyn ProfileStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Awards points for an action, recording a transaction and updating
    /// the profile's totals and level. Creates the profile on first touch.
    ///
    /// # Errors
    ///
    /// [`EventHubError::Validation`] for an unknown action string.
    pub async fn award_points(
        &self,
        user_id: UserId,
        action: &str,
        event_id: Option<EventId>,
    ) -> Result<AwardOutcome> {
        let action = PointsAction::parse(action)
            .ok_or_else(|| EventHubError::Validation(format!("Unknown action type '{action}'")))?;

        let now = self.clock.now();
        let mut profile = self
            .store
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::empty(user_id, now));

        let points = action.points();
        let level_before = profile.level;
        profile.total_points += u64::from(points);
        profile.experience_points += u64::from(points);
        profile.level = level_for(profile.experience_points);
        profile.updated_at = now;

        let tx = PointsTransaction {
            id: Uuid::new_v4(),
            user_id,
            points,
            action_type: action.as_str().to_string(),
            description: action.description().to_string(),
            event_id,
            created_at: now,
        };
        self.store.insert_transaction(&tx).await?;
        self.store.upsert_profile(&profile).await?;

        metrics::counter!("eventhub_points_awarded_total").increment(u64::from(points));
        let leveled_up = profile.level > level_before;
        if leveled_up {
            tracing::info!(user_id = %user_id, level = profile.level, "user leveled up");
        }

        Ok(AwardOutcome {
            profile,
            points_awarded: points,
            leveled_up,
        })
    }

    /// Records activity for today and adjusts the streak: consecutive days
    /// extend it, a repeat on the same day is a no-op, a gap resets it.
    ///
    /// # Errors
    ///
    /// Fails when the store is unreachable.
    pub async fn update_streak(&self, user_id: UserId) -> Result<UserProfile> {
        let now = self.clock.now();
        let today = now.date_naive();

        let mut profile = self
            .store
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::empty(user_id, now));

        profile.streak_count = next_streak(profile.last_activity_date, today, profile.streak_count);
        profile.last_activity_date = Some(today);
        profile.updated_at = now;
        self.store.upsert_profile(&profile).await?;
        Ok(profile)
    }

    /// Evaluates badge criteria and awards anything newly earned.
    /// Returns only the badges granted by this call.
    ///
    /// # Errors
    ///
    /// Fails when the store is unreachable.
    pub async fn check_badges(
        &self,
        user_id: UserId,
        email: Option<&str>,
    ) -> Result<Vec<Badge>> {
        let held = self.store.awarded_badges(user_id).await?;
        let candidates = missing_badges(&held);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let profile = self.store.get_profile(user_id).await?;
        let mut newly_awarded = Vec::new();

        for badge in candidates {
            let earned = match badge {
                Badge::FirstEvent => self.store.count_events_created_by(user_id).await? >= 1,
                Badge::EventMaster => self.store.count_events_created_by(user_id).await? >= 10,
                Badge::SocialButterfly => match email {
                    Some(email) => self.store.count_confirmed_rsvps(email).await? >= 5,
                    None => false,
                },
                Badge::StreakMaster => {
                    profile.as_ref().is_some_and(|p| p.streak_count >= 30)
                }
            };
            if earned {
                self.store
                    .award_badge(&AwardedBadge {
                        user_id,
                        badge,
                        awarded_at: now,
                    })
                    .await?;
                tracing::info!(user_id = %user_id, badge = badge.name(), "awarded badge");
                newly_awarded.push(badge);
            }
        }

        Ok(newly_awarded)
    }

    /// Profile with badges and the ten most recent transactions.
    /// An untouched user gets an empty profile rather than an error.
    ///
    /// # Errors
    ///
    /// Fails when the store is unreachable.
    pub async fn profile(&self, user_id: UserId) -> Result<ProfileView> {
        let profile = self
            .store
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::empty(user_id, self.clock.now()));
        let badges = self.store.awarded_badges(user_id).await?;
        let recent_transactions = self.store.recent_transactions(user_id, 10).await?;
        Ok(ProfileView {
            profile,
            badges,
            recent_transactions,
        })
    }

    /// Top profiles by lifetime points.
    ///
    /// # Errors
    ///
    /// Fails when the store is unreachable.
    pub async fn leaderboard(&self, limit: u32) -> Result<Vec<UserProfile>> {
        Ok(self.store.leaderboard(limit).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::{EventStore, InMemoryStore};
    use crate::types::{Capacity, Event, EventStatus, Guest, GuestCategory, GuestId, GuestStatus};
    use chrono::{NaiveTime, TimeZone, Utc};

    fn service_at(day: NaiveDate) -> (Arc<InMemoryStore>, GamificationService) {
        let store = Arc::new(InMemoryStore::new());
        let at = day.and_hms_opt(12, 0, 0).unwrap().and_utc();
        let clock = Arc::new(FixedClock(at));
        let svc = GamificationService::new(Arc::clone(&store) as Arc<dyn ProfileStore>, clock);
        (store, svc)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn level_curve() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(999), 1);
        assert_eq!(level_for(1000), 2);
        assert_eq!(level_for(4500), 5);
    }

    #[test]
    fn streak_transitions() {
        let today = day(2025, 6, 10);
        // First ever activity.
        assert_eq!(next_streak(None, today, 0), 1);
        // Same-day repeat leaves the streak alone.
        assert_eq!(next_streak(Some(today), today, 4), 4);
        // Yesterday extends.
        assert_eq!(next_streak(Some(day(2025, 6, 9)), today, 4), 5);
        // A gap resets.
        assert_eq!(next_streak(Some(day(2025, 6, 7)), today, 4), 1);
    }

    #[tokio::test]
    async fn award_creates_profile_and_records_transaction() {
        let (store, svc) = service_at(day(2025, 6, 10));
        let user = UserId::new();

        let outcome = svc.award_points(user, "event_created", None).await.unwrap();
        assert_eq!(outcome.points_awarded, 100);
        assert_eq!(outcome.profile.total_points, 100);
        assert_eq!(outcome.profile.level, 1);
        assert!(!outcome.leveled_up);

        let txs = store.recent_transactions(user, 10).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].action_type, "event_created");
    }

    #[tokio::test]
    async fn award_rejects_unknown_action() {
        let (_, svc) = service_at(day(2025, 6, 10));
        let err = svc
            .award_points(UserId::new(), "wrote_a_poem", None)
            .await
            .unwrap_err();
        assert!(matches!(err, EventHubError::Validation(_)));
    }

    #[tokio::test]
    async fn crossing_a_thousand_experience_levels_up() {
        let (_, svc) = service_at(day(2025, 6, 10));
        let user = UserId::new();

        // Five referrals: 1000 experience, level 2.
        for _ in 0..4 {
            svc.award_points(user, "referral_completed", None).await.unwrap();
        }
        let outcome = svc.award_points(user, "referral_completed", None).await.unwrap();
        assert_eq!(outcome.profile.experience_points, 1000);
        assert_eq!(outcome.profile.level, 2);
        assert!(outcome.leveled_up);
    }

    #[tokio::test]
    async fn streak_extends_across_consecutive_days() {
        let user = UserId::new();
        let store = Arc::new(InMemoryStore::new());

        for (d, expected) in [(10, 1), (11, 2), (12, 3)] {
            let at = day(2025, 6, d).and_hms_opt(8, 0, 0).unwrap().and_utc();
            let svc = GamificationService::new(
                Arc::clone(&store) as Arc<dyn ProfileStore>,
                Arc::new(FixedClock(at)),
            );
            let profile = svc.update_streak(user).await.unwrap();
            assert_eq!(profile.streak_count, expected);
        }

        // Skip a day: reset.
        let at = day(2025, 6, 14).and_hms_opt(8, 0, 0).unwrap().and_utc();
        let svc = GamificationService::new(
            Arc::clone(&store) as Arc<dyn ProfileStore>,
            Arc::new(FixedClock(at)),
        );
        let profile = svc.update_streak(user).await.unwrap();
        assert_eq!(profile.streak_count, 1);
    }

    #[tokio::test]
    async fn first_event_badge_awarded_once() {
        let (store, svc) = service_at(day(2025, 6, 10));
        let user = UserId::new();

        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let event = Event {
            id: crate::types::EventId::new(),
            title: "Meetup".to_string(),
            description: None,
            date: day(2025, 7, 1),
            time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            location: "Cafe".to_string(),
            capacity: Capacity::new(20),
            registered: 0,
            status: EventStatus::Upcoming,
            created_by: Some(user),
            created_at: now,
            updated_at: now,
        };
        store.insert_event(&event).await.unwrap();

        let newly = svc.check_badges(user, None).await.unwrap();
        assert_eq!(newly, vec![Badge::FirstEvent]);

        // Second check awards nothing new.
        let newly = svc.check_badges(user, None).await.unwrap();
        assert!(newly.is_empty());
        assert_eq!(store.awarded_badges(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn social_butterfly_needs_five_confirmed_rsvps() {
        let (store, svc) = service_at(day(2025, 6, 10));
        let user = UserId::new();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();

        for i in 0..5 {
            let guest = Guest {
                id: GuestId::new(),
                event_id: None,
                name: format!("Ada {i}"),
                email: "ada@example.com".to_string(),
                status: GuestStatus::Confirmed,
                category: GuestCategory::Regular,
                event_title: String::new(),
                rsvp_date: Some(now),
                created_at: now,
                updated_at: now,
            };
            store.insert_guest(&guest).await.unwrap();
        }

        let newly = svc.check_badges(user, Some("ada@example.com")).await.unwrap();
        assert!(newly.contains(&Badge::SocialButterfly));
    }

    #[tokio::test]
    async fn untouched_user_gets_empty_profile_view() {
        let (_, svc) = service_at(day(2025, 6, 10));
        let view = svc.profile(UserId::new()).await.unwrap();
        assert_eq!(view.profile.total_points, 0);
        assert_eq!(view.profile.level, 1);
        assert!(view.badges.is_empty());
        assert!(view.recent_transactions.is_empty());
    }
}
