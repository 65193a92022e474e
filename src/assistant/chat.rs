//! Guest-facing event chat.
//!
//! Every exchange is persisted: the guest's message before the reply is
//! computed, the reply after. With no completion client configured the
//! service answers from the event record directly.

use super::client::{ChatRole, CompletionClient, CompletionMessage, CompletionRequest};
use crate::clock::Clock;
use crate::error::{EventHubError, Result};
use crate::store::{ChatStore, EventStore};
use crate::types::{
    ChatMessage, ChatSender, Conversation, ConversationId, Event, EventId,
};
use std::sync::Arc;
use uuid::Uuid;

const CHAT_MAX_TOKENS: u32 = 500;
const CHAT_TEMPERATURE: f32 = 0.7;

/// An incoming chat message.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    /// Event the question is about
    pub event_id: EventId,
    /// The guest's message
    pub message: String,
    /// Guest email, when known
    pub guest_email: Option<String>,
    /// Guest name, when known
    pub guest_name: Option<String>,
    /// Existing conversation to continue, if any
    pub conversation_id: Option<ConversationId>,
}

/// The assistant's reply.
#[derive(Clone, Debug)]
pub struct ChatReply {
    /// Reply text
    pub response: String,
    /// Conversation the exchange belongs to
    pub conversation_id: ConversationId,
}

/// Chat operations.
#[derive(Clone)]
pub struct ChatService {
    chat_store: Arc<dyn ChatStore>,
    event_store: Arc<dyn EventStore>,
    client: Option<CompletionClient>,
    clock: Arc<dyn Clock>,
}

impl ChatService {
    /// Creates a service; `client = None` selects rule-based replies.
    #[must_use]
    pub fn new(
        chat_store: Arc<dyn ChatStore>,
        event_store: Arc<dyn EventStore>,
        client: Option<CompletionClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            chat_store,
            event_store,
            client,
            clock,
        }
    }

    /// Handles one guest message and returns the assistant's reply.
    ///
    /// # Errors
    ///
    /// [`EventHubError::Validation`] for a blank message,
    /// [`EventHubError::EventNotFound`] for an unknown event,
    /// [`EventHubError::ConversationNotFound`] for an unknown conversation id.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
        let message = request.message.trim().to_string();
        if message.is_empty() {
            return Err(EventHubError::Validation(
                "Message is required".to_string(),
            ));
        }

        let event = self
            .event_store
            .get_event(request.event_id)
            .await?
            .ok_or(EventHubError::EventNotFound(request.event_id))?;

        let conversation = match request.conversation_id {
            Some(id) => self
                .chat_store
                .get_conversation(id)
                .await?
                .ok_or(EventHubError::ConversationNotFound)?,
            None => {
                let conversation = Conversation {
                    id: ConversationId::new(),
                    event_id: request.event_id,
                    guest_email: request.guest_email,
                    guest_name: request.guest_name,
                    created_at: self.clock.now(),
                };
                self.chat_store.insert_conversation(&conversation).await?;
                conversation
            }
        };

        let history = self
            .chat_store
            .conversation_messages(conversation.id)
            .await?;

        self.chat_store
            .insert_message(&ChatMessage {
                id: Uuid::new_v4(),
                conversation_id: conversation.id,
                sender: ChatSender::User,
                message: message.clone(),
                created_at: self.clock.now(),
            })
            .await?;

        let response = match &self.client {
            Some(client) => {
                let completion = CompletionRequest {
                    messages: vec![
                        CompletionMessage {
                            role: ChatRole::System,
                            content: system_prompt(&event, &history),
                        },
                        CompletionMessage {
                            role: ChatRole::User,
                            content: message.clone(),
                        },
                    ],
                    max_tokens: CHAT_MAX_TOKENS,
                    temperature: CHAT_TEMPERATURE,
                };
                match client.complete(completion).await {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!(error = %err, "completion failed, using rule-based reply");
                        rule_based_reply(&event, &message)
                    }
                }
            }
            None => rule_based_reply(&event, &message),
        };

        self.chat_store
            .insert_message(&ChatMessage {
                id: Uuid::new_v4(),
                conversation_id: conversation.id,
                sender: ChatSender::Assistant,
                message: response.clone(),
                created_at: self.clock.now(),
            })
            .await?;

        Ok(ChatReply {
            response,
            conversation_id: conversation.id,
        })
    }
}

fn system_prompt(event: &Event, history: &[ChatMessage]) -> String {
    let event_context = format!(
        "Event: {}\nDate: {} at {}\nLocation: {}\nCapacity: {}\nCurrently registered: {}\nDescription: {}",
        event.title,
        event.date,
        event.time,
        event.location,
        event.capacity.value(),
        event.registered,
        event
            .description
            .as_deref()
            .unwrap_or("No description provided"),
    );

    let conversation_history = history
        .iter()
        .map(|m| {
            let speaker = match m.sender {
                ChatSender::User => "Guest",
                ChatSender::Assistant => "Assistant",
            };
            format!("{speaker}: {}", m.message)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an AI assistant for EventHub, helping guests with RSVP and event-related questions.\n\n\
         Event Details:\n{event_context}\n\n\
         You can help with:\n\
         - RSVP confirmations and changes\n\
         - Event details and logistics\n\
         - Special requests (dietary restrictions, accessibility needs)\n\
         - Waitlist management\n\
         - Plus-one registrations\n\
         - General event questions\n\n\
         Be helpful, professional, and concise. If you need to perform actions like updating RSVPs, \
         ask for confirmation first.\n\n\
         Previous conversation:\n{conversation_history}"
    )
}

/// Keyword-matched answer from the event record itself.
fn rule_based_reply(event: &Event, message: &str) -> String {
    let lowered = message.to_lowercase();
    if lowered.contains("where") || lowered.contains("location") {
        format!("{} takes place at {}.", event.title, event.location)
    } else if lowered.contains("when") || lowered.contains("time") || lowered.contains("date") {
        format!(
            "{} is scheduled for {} at {}.",
            event.title, event.date, event.time
        )
    } else if lowered.contains("waitlist") || lowered.contains("full") {
        if event.is_full() {
            format!(
                "{} is currently full ({} of {} seats taken), but you can join the waitlist and \
                 we will promote you as soon as a seat opens up.",
                event.title,
                event.registered,
                event.capacity.value()
            )
        } else {
            format!(
                "{} still has {} open seats, so you can RSVP directly.",
                event.title,
                event.remaining()
            )
        }
    } else {
        format!(
            "Thanks for reaching out about {}! It takes place on {} at {} at {}. \
             Let me know if you have questions about your RSVP, the waitlist, or the venue.",
            event.title, event.date, event.time, event.location
        )
    }
}
