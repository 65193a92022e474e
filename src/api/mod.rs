//! HTTP handlers.
//!
//! Two surfaces share these modules: the REST API under `/api`, and the
//! legacy function endpoints under `/functions` whose wire shapes are kept
//! compatible with existing clients.

pub mod analytics;
pub mod chat;
pub mod error;
pub mod events;
pub mod gamification;
pub mod guests;
pub mod scheduling;
pub mod waitlist;

pub use error::AppError;
