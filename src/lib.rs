//! EventHub - an event management backend.
//!
//! EventHub tracks events with bounded capacity, their guest lists, and a
//! per-event waitlist, plus gamification (points, streaks, badges),
//! dashboard analytics, and AI-assisted chat and scheduling.
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum)
//! ┌───────────────┐  ┌─────────────────────┐
//! │  REST /api    │  │  legacy /functions  │
//! └───────┬───────┘  └──────────┬──────────┘
//!         └──────────┬──────────┘
//!                    ▼
//!     Services (events, guests, waitlist,
//!      gamification, analytics, assistant)
//!                    │
//!                    ▼
//!     Store traits ── PostgreSQL / in-memory
//! ```
//!
//! # Capacity invariant
//!
//! An event's `registered` count never exceeds its capacity. Every path that
//! takes or releases a seat goes through the store's compare-and-swap on
//! `registered`; waitlist promotion additionally couples the seat grab with
//! marking the entry promoted in one atomic store operation, so two racing
//! promotions can never oversell the last seat.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analytics;
pub mod api;
pub mod assistant;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod gamification;
pub mod guests;
pub mod metrics;
pub mod server;
pub mod store;
pub mod types;
pub mod waitlist;

pub use config::Config;
pub use error::{EventHubError, Result};
