//! AI-assisted guest chat and scheduling suggestions.
//!
//! Both features work through the same completion client and degrade the
//! same way: without an API key (or when the API misbehaves) they fall back
//! to rule-based answers instead of failing the request.

pub mod chat;
pub mod client;
pub mod scheduling;

pub use chat::{ChatReply, ChatRequest, ChatService};
pub use client::{ChatRole, CompletionClient, CompletionError, CompletionMessage, CompletionRequest};
pub use scheduling::{SchedulingRequest, SchedulingService, Suggestion};
