//! Date and time suggestions for new events.
//!
//! With a completion client the service asks the model for suggestions
//! grounded in the last year of events; without one (or when the model's
//! answer cannot be parsed) it falls back to fixed time slots per event
//! type spread over the coming weeks.

use super::client::{ChatRole, CompletionClient, CompletionMessage, CompletionRequest};
use crate::clock::Clock;
use crate::error::Result;
use crate::store::EventStore;
use crate::types::Event;
use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SCHEDULING_MAX_TOKENS: u32 = 1000;
const SCHEDULING_TEMPERATURE: f32 = 0.3;
const FALLBACK_CONFIDENCE: u32 = 70;

/// What kind of event is being planned.
#[derive(Clone, Debug)]
pub struct SchedulingRequest {
    /// Free-form event type, e.g. `corporate` or `party`
    pub event_type: String,
    /// Expected duration in hours
    pub duration_hours: Option<u32>,
    /// Expected headcount
    pub expected_attendees: Option<u32>,
    /// Free-form preferences
    pub preferences: Option<String>,
}

/// One suggested slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Suggested date
    pub date: NaiveDate,
    /// Suggested start time, `HH:MM`
    pub time: String,
    /// Confidence score, 0 to 100
    pub confidence: u32,
    /// Why this slot
    pub reasoning: String,
}

#[derive(Deserialize)]
struct SuggestionsEnvelope {
    suggestions: Vec<Suggestion>,
}

/// Scheduling suggestion operations.
#[derive(Clone)]
pub struct SchedulingService {
    event_store: Arc<dyn EventStore>,
    client: Option<CompletionClient>,
    clock: Arc<dyn Clock>,
}

impl SchedulingService {
    /// Creates a service; `client = None` selects rule-based suggestions.
    #[must_use]
    pub fn new(
        event_store: Arc<dyn EventStore>,
        client: Option<CompletionClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            event_store,
            client,
            clock,
        }
    }

    /// Suggests dates and times for the described event.
    ///
    /// # Errors
    ///
    /// Fails when the store is unreachable. Completion failures are not
    /// errors; they downgrade to the rule-based fallback.
    pub async fn suggest(&self, request: SchedulingRequest) -> Result<Vec<Suggestion>> {
        let today = self.clock.now().date_naive();

        let Some(client) = &self.client else {
            return Ok(fallback_suggestions(&request.event_type, today));
        };

        let year_ago = today - Duration::days(365);
        let history: Vec<Event> = self
            .event_store
            .list_events()
            .await?
            .into_iter()
            .filter(|e| e.date >= year_ago)
            .collect();

        let completion = CompletionRequest {
            messages: vec![CompletionMessage {
                role: ChatRole::User,
                content: prompt(&request, &history),
            }],
            max_tokens: SCHEDULING_MAX_TOKENS,
            temperature: SCHEDULING_TEMPERATURE,
        };

        match client.complete(completion).await {
            Ok(content) => match serde_json::from_str::<SuggestionsEnvelope>(&content) {
                Ok(envelope) => Ok(envelope.suggestions),
                Err(err) => {
                    tracing::warn!(error = %err, "unparseable suggestions, using fallback");
                    Ok(fallback_suggestions(&request.event_type, today))
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "completion failed, using fallback suggestions");
                Ok(fallback_suggestions(&request.event_type, today))
            }
        }
    }
}

fn prompt(request: &SchedulingRequest, history: &[Event]) -> String {
    let historical = if history.is_empty() {
        "No historical data available".to_string()
    } else {
        history
            .iter()
            .map(|e| {
                format!(
                    "{} {}, {}/{} attended",
                    e.date,
                    e.time,
                    e.registered,
                    e.capacity.value()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let duration = request
        .duration_hours
        .map_or_else(|| "Unspecified".to_string(), |h| h.to_string());
    let attendees = request
        .expected_attendees
        .map_or_else(|| "Unspecified".to_string(), |n| n.to_string());

    format!(
        "As an AI scheduling assistant, suggest optimal dates and times for an event with these details:\n\
         - Event Type: {event_type}\n\
         - Expected Duration: {duration} hours\n\
         - Expected Attendees: {attendees}\n\
         - Preferences: {preferences}\n\n\
         Historical data from similar events:\n{historical}\n\n\
         Consider these factors:\n\
         1. Day of the week preferences for {event_type} events\n\
         2. Time of day optimization for {attendees} attendees\n\
         3. Seasonal considerations\n\
         4. Common scheduling conflicts\n\
         5. Historical attendance patterns\n\n\
         Provide 3-5 specific date/time suggestions with confidence scores (0-100) and reasoning for each.\n\
         Format as JSON: {{\"suggestions\": [{{\"date\": \"YYYY-MM-DD\", \"time\": \"HH:MM\", \"confidence\": 85, \"reasoning\": \"explanation\"}}]}}",
        event_type = request.event_type,
        preferences = request.preferences.as_deref().unwrap_or("None specified"),
    )
}

/// Fixed slots per event type, one suggestion per week for the next month.
fn fallback_suggestions(event_type: &str, today: NaiveDate) -> Vec<Suggestion> {
    let slots: &[&str] = match event_type {
        "corporate" | "workshop" => &["09:00", "14:00"],
        "party" => &["19:00", "20:00"],
        _ => &["10:00", "15:00"],
    };

    let mut rng = rand::thread_rng();
    (7..35)
        .step_by(7)
        .take(3)
        .map(|days| Suggestion {
            date: today + Duration::days(days),
            time: slots[rng.gen_range(0..slots.len())].to_string(),
            confidence: FALLBACK_CONFIDENCE,
            reasoning: format!("Optimal {event_type} timing based on industry standards"),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::InMemoryStore;
    use chrono::{TimeZone, Utc};

    fn service() -> SchedulingService {
        SchedulingService::new(
            Arc::new(InMemoryStore::new()),
            None,
            Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            )),
        )
    }

    #[tokio::test]
    async fn fallback_produces_three_weekly_suggestions() {
        let svc = service();
        let suggestions = svc
            .suggest(SchedulingRequest {
                event_type: "party".to_string(),
                duration_hours: Some(4),
                expected_attendees: Some(80),
                preferences: None,
            })
            .await
            .unwrap();

        assert_eq!(suggestions.len(), 3);
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        for (i, suggestion) in suggestions.iter().enumerate() {
            let days = 7 * (i as i64 + 1);
            assert_eq!(suggestion.date, today + Duration::days(days));
            assert!(["19:00", "20:00"].contains(&suggestion.time.as_str()));
            assert_eq!(suggestion.confidence, FALLBACK_CONFIDENCE);
        }
    }

    #[tokio::test]
    async fn fallback_slots_follow_the_event_type() {
        let svc = service();
        let suggestions = svc
            .suggest(SchedulingRequest {
                event_type: "workshop".to_string(),
                duration_hours: None,
                expected_attendees: None,
                preferences: None,
            })
            .await
            .unwrap();
        assert!(suggestions
            .iter()
            .all(|s| ["09:00", "14:00"].contains(&s.time.as_str())));
    }

    #[test]
    fn model_output_parses_into_suggestions() {
        let content = r#"{"suggestions":[{"date":"2025-07-04","time":"19:00","confidence":85,"reasoning":"Holiday weekend"}]}"#;
        let envelope: SuggestionsEnvelope = serde_json::from_str(content).unwrap();
        assert_eq!(envelope.suggestions.len(), 1);
        assert_eq!(envelope.suggestions[0].confidence, 85);
    }
}
