//! Business metrics.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `eventhub_waitlist_joins_total` - Waitlist entries created
//! - `eventhub_promotions_total{outcome}` - Promotion attempts by outcome
//!   (promoted, at_capacity, empty, contention)
//! - `eventhub_guests_created_total` - Guests created
//! - `eventhub_points_awarded_total` - Gamification points granted

use metrics::describe_counter;

/// Initialize and register all business metrics descriptions.
///
/// Called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "eventhub_waitlist_joins_total",
        "Total number of waitlist entries created"
    );
    describe_counter!(
        "eventhub_promotions_total",
        "Total number of promotion attempts by outcome (promoted, at_capacity, empty, contention)"
    );
    describe_counter!(
        "eventhub_guests_created_total",
        "Total number of guests created"
    );
    describe_counter!(
        "eventhub_points_awarded_total",
        "Total number of gamification points granted"
    );
}
