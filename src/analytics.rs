//! Dashboard analytics derived from events and guests.
//!
//! Pure aggregation over in-memory slices; the HTTP layer fetches the rows
//! and hands them over. Rates are whole percentages rounded half-up, and a
//! zero denominator yields 0 rather than an error.

use crate::types::{Event, Guest, GuestStatus};
use serde::Serialize;
use std::collections::BTreeMap;

/// Flat ticket price used for revenue estimates, in dollars.
const TICKET_PRICE: u64 = 50;

/// Events and registrations for one calendar month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyTrend {
    /// Abbreviated month name, e.g. `Jun`
    pub month: String,
    /// Events scheduled in the month
    pub events: u32,
    /// Registered guests across those events
    pub guests: u32,
}

/// Share of guests per RSVP status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpDistribution {
    /// Confirmed guests
    pub confirmed: u32,
    /// Pending guests
    pub pending: u32,
    /// Declined guests
    pub declined: u32,
}

/// Aggregated dashboard numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// Total number of events
    pub total_events: u32,
    /// Total number of guests
    pub total_guests: u32,
    /// Sum of registered counts across events
    pub total_registered: u32,
    /// Sum of capacities across events
    pub total_capacity: u32,
    /// Registered seats as a whole percentage of capacity
    pub attendance_rate: u32,
    /// Confirmed guests as a whole percentage of all guests
    pub conversion_rate: u32,
    /// Estimated revenue in dollars (confirmed guests at a flat price)
    pub estimated_revenue: u64,
    /// Per-month counts, ascending by calendar month
    pub monthly_trends: Vec<MonthlyTrend>,
    /// Guest counts per RSVP status
    pub rsvp_distribution: RsvpDistribution,
}

/// Whole-percentage ratio, rounded half-up; 0 when the denominator is 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentage(numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    (f64::from(numerator) / f64::from(denominator) * 100.0).round() as u32
}

/// Aggregates events and guests into dashboard numbers.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn summarize(events: &[Event], guests: &[Guest]) -> AnalyticsSummary {
    let total_registered: u32 = events.iter().map(|e| e.registered).sum();
    let total_capacity: u32 = events.iter().map(|e| e.capacity.value()).sum();

    let mut distribution = RsvpDistribution {
        confirmed: 0,
        pending: 0,
        declined: 0,
    };
    for guest in guests {
        match guest.status {
            GuestStatus::Confirmed => distribution.confirmed += 1,
            GuestStatus::Pending => distribution.pending += 1,
            GuestStatus::Declined => distribution.declined += 1,
        }
    }

    // BTreeMap keyed by (year, month) keeps the trend in calendar order.
    let mut by_month: BTreeMap<(i32, u32), (u32, u32)> = BTreeMap::new();
    for event in events {
        use chrono::Datelike;
        let key = (event.date.year(), event.date.month());
        let slot = by_month.entry(key).or_insert((0, 0));
        slot.0 += 1;
        slot.1 += event.registered;
    }
    let monthly_trends = by_month
        .into_iter()
        .map(|((_, month), (events, guests))| MonthlyTrend {
            month: month_abbrev(month).to_string(),
            events,
            guests,
        })
        .collect();

    AnalyticsSummary {
        total_events: events.len() as u32,
        total_guests: guests.len() as u32,
        total_registered,
        total_capacity,
        attendance_rate: percentage(total_registered, total_capacity),
        conversion_rate: percentage(distribution.confirmed, guests.len() as u32),
        estimated_revenue: u64::from(distribution.confirmed) * TICKET_PRICE,
        monthly_trends,
        rsvp_distribution: distribution,
    }
}

const fn month_abbrev(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        _ => "Dec",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{
        Capacity, EventId, EventStatus, GuestCategory, GuestId,
    };
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn event(date: NaiveDate, capacity: u32, registered: u32) -> Event {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Event {
            id: EventId::new(),
            title: "Event".to_string(),
            description: None,
            date,
            time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            location: "Hall".to_string(),
            capacity: Capacity::new(capacity),
            registered,
            status: EventStatus::Upcoming,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn guest(status: GuestStatus) -> Guest {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Guest {
            id: GuestId::new(),
            event_id: None,
            name: "Guest".to_string(),
            email: "guest@example.com".to_string(),
            status,
            category: GuestCategory::Regular,
            event_title: String::new(),
            rsvp_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn empty_inputs_yield_zeroes() {
        let summary = summarize(&[], &[]);
        assert_eq!(summary.total_events, 0);
        assert_eq!(summary.attendance_rate, 0);
        assert_eq!(summary.conversion_rate, 0);
        assert_eq!(summary.estimated_revenue, 0);
        assert!(summary.monthly_trends.is_empty());
    }

    #[test]
    fn rates_round_to_whole_percentages() {
        let events = vec![event(date(6, 1), 30, 10)];
        let guests = vec![
            guest(GuestStatus::Confirmed),
            guest(GuestStatus::Confirmed),
            guest(GuestStatus::Pending),
        ];
        let summary = summarize(&events, &guests);
        // 10 / 30 = 33.33 -> 33; 2 / 3 = 66.67 -> 67.
        assert_eq!(summary.attendance_rate, 33);
        assert_eq!(summary.conversion_rate, 67);
        assert_eq!(summary.estimated_revenue, 100);
        assert_eq!(
            summary.rsvp_distribution,
            RsvpDistribution {
                confirmed: 2,
                pending: 1,
                declined: 0
            }
        );
    }

    #[test]
    fn monthly_trends_are_in_calendar_order() {
        let events = vec![
            event(date(9, 5), 10, 3),
            event(date(3, 1), 10, 5),
            event(date(3, 20), 10, 2),
        ];
        let summary = summarize(&events, &[]);
        assert_eq!(
            summary.monthly_trends,
            vec![
                MonthlyTrend {
                    month: "Mar".to_string(),
                    events: 2,
                    guests: 7
                },
                MonthlyTrend {
                    month: "Sep".to_string(),
                    events: 1,
                    guests: 3
                },
            ]
        );
    }
}
