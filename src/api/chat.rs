//! Chat function endpoint.

use super::error::AppError;
use crate::assistant::ChatRequest;
use crate::server::state::AppState;
use crate::types::{ConversationId, EventId};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `POST /functions/ai-chatbot` request body.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    /// The guest's message
    pub message: String,
    /// Event the question is about
    #[serde(rename = "eventId")]
    pub event_id: Uuid,
    /// Guest email, when known
    #[serde(rename = "guestEmail")]
    pub guest_email: Option<String>,
    /// Guest name, when known
    #[serde(rename = "guestName")]
    pub guest_name: Option<String>,
    /// Conversation to continue, if any
    #[serde(rename = "conversationId")]
    pub conversation_id: Option<Uuid>,
}

/// `POST /functions/ai-chatbot` response body.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The assistant's reply
    pub response: String,
    /// Conversation the exchange belongs to
    #[serde(rename = "conversationId")]
    pub conversation_id: ConversationId,
}

/// `POST /functions/ai-chatbot`
///
/// # Errors
///
/// Fails for a blank message, an unknown event or conversation, or when
/// the store is unreachable.
pub async fn ai_chatbot(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, AppError> {
    let reply = state
        .chat
        .chat(ChatRequest {
            event_id: EventId::from_uuid(body.event_id),
            message: body.message,
            guest_email: body.guest_email,
            guest_name: body.guest_name,
            conversation_id: body.conversation_id.map(ConversationId::from_uuid),
        })
        .await?;

    Ok(Json(ChatResponse {
        response: reply.response,
        conversation_id: reply.conversation_id,
    }))
}
