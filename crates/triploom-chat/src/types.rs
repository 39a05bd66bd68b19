//! Wire and domain types for the chat pipeline.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use triploom_storage::Trip;

// =============================================================================
// Messages
// =============================================================================

/// Speaker of a chat message. Anything other than exactly `assistant` is a user turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ChatRole {
    #[default]
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl From<String> for ChatRole {
    fn from(raw: String) -> Self {
        if raw == "assistant" {
            ChatRole::Assistant
        } else {
            ChatRole::User
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Content of the last message, or `""` when there are none.
pub fn last_content(messages: &[ChatMessage]) -> &str {
    messages.last().map(|m| m.content.as_str()).unwrap_or("")
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRequest {
    pub trip_id: String,
    pub page_key: String,
    pub page_context: Option<Map<String, Value>>,
    pub messages: Vec<ChatMessage>,
    pub refresh: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannerChatRequest {
    pub messages: Vec<ChatMessage>,
    pub planner_context: Option<Map<String, Value>>,
    pub refresh: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshContextRequest {
    pub trip_id: String,
    pub page_key: String,
}

// =============================================================================
// Sources
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Error,
    SkippedMissingInputs,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStatus::Ok => "ok",
            SourceStatus::Error => "error",
            SourceStatus::SkippedMissingInputs => "skipped_missing_inputs",
        }
    }
}

/// Outcome of one context source consulted for a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub name: String,
    pub status: SourceStatus,
    pub fetched_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Source {
    pub fn new(name: &str, status: SourceStatus, detail: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            fetched_at: now_rfc3339(),
            detail,
        }
    }

    pub fn ok(name: &str) -> Self {
        Self::new(name, SourceStatus::Ok, None)
    }
}

/// Current UTC time as RFC 3339 with second precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

// =============================================================================
// Context payload
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripContext {
    pub id: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub timezone: String,
}

impl From<&Trip> for TripContext {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id.clone(),
            destination: trip.destination.clone(),
            start_date: trip.start_date.format("%Y-%m-%d").to_string(),
            end_date: trip.end_date.format("%Y-%m-%d").to_string(),
            timezone: trip.timezone.clone(),
        }
    }
}

/// Context handed to the model for one request.
///
/// Built once, then serialized into the prompt and the context snapshot.
/// Live-data fragments land in `extra` in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<TripContext>,
    pub page_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_context: Option<Map<String, Value>>,
    #[serde(rename = "userID", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planner_context: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContextPayload {
    /// Payload for page chat: trip identity plus non-empty page context.
    pub fn for_trip(trip: &Trip, page_key: &str, page_context: Option<&Map<String, Value>>) -> Self {
        Self {
            trip: Some(TripContext::from(trip)),
            page_key: page_key.to_string(),
            page_context: page_context.filter(|m| !m.is_empty()).cloned(),
            ..Default::default()
        }
    }

    /// Payload for the planner agent, which has no trip yet.
    pub fn for_planner(user_id: &str, planner_context: Option<&Map<String, Value>>) -> Self {
        Self {
            page_key: "agent".to_string(),
            user_id: Some(user_id.to_string()),
            planner_context: planner_context.filter(|m| !m.is_empty()).cloned(),
            ..Default::default()
        }
    }

    /// Merge live-data fragments. Later keys overwrite earlier ones.
    pub fn with_extra(mut self, fragments: Map<String, Value>) -> Self {
        self.extra.extend(fragments);
        self
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub conversation_id: String,
    pub answer: String,
    pub highlights: Vec<String>,
    pub suggested_actions: Vec<String>,
    pub sources: Vec<Source>,
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerDraftItem {
    pub day_index: u32,
    pub title: String,
    pub time_block: String,
    pub category: String,
    pub notes: String,
}

/// Structured trip plan inferred from a planner conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travelers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub itinerary: Vec<PlannerDraftItem>,
}

impl PlannerDraft {
    /// True when nothing worth showing was inferred. Budget alone does not count.
    pub fn is_empty(&self) -> bool {
        self.destination.is_none()
            && self.country.is_none()
            && self.cities.is_empty()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.travelers.is_none()
            && self.activities.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerChatResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planner_draft: Option<PlannerDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshContextResponse {
    pub updated_at: String,
    pub page_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_unknown_roles_become_user() {
        let msgs: Vec<ChatMessage> = serde_json::from_value(json!([
            {"role": "assistant", "content": "a"},
            {"role": "system", "content": "b"},
            {"role": "Assistant", "content": "c"},
            {"role": " assistant ", "content": "d"},
            {"content": "e"}
        ]))
        .unwrap();
        let roles: Vec<ChatRole> = msgs.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                ChatRole::Assistant,
                ChatRole::User,
                ChatRole::User,
                ChatRole::User,
                ChatRole::User
            ]
        );
        assert_eq!(serde_json::to_value(ChatRole::Assistant).unwrap(), "assistant");
    }

    #[test]
    fn test_chat_request_tolerates_missing_fields() {
        let req: ChatRequest = serde_json::from_value(json!({"tripId": "t1"})).unwrap();
        assert_eq!(req.trip_id, "t1");
        assert!(req.page_key.is_empty());
        assert!(req.messages.is_empty());
        assert!(!req.refresh);
    }

    #[test]
    fn test_source_wire_shape() {
        let src = Source::new(
            "next_flight_status",
            SourceStatus::SkippedMissingInputs,
            Some("missing".into()),
        );
        let json = serde_json::to_value(&src).unwrap();
        assert_eq!(json["status"], "skipped_missing_inputs");
        assert_eq!(json["detail"], "missing");
        assert!(json["fetchedAt"].as_str().unwrap().ends_with('Z'));

        let json = serde_json::to_value(Source::ok("trip_db_context")).unwrap();
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn test_context_payload_shape() {
        let trip = Trip {
            id: "trip-1".into(),
            destination: "Lisbon".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            timezone: "Europe/Lisbon".into(),
        };
        let empty = Map::new();
        let mut fragments = Map::new();
        fragments.insert("flightStatus".into(), json!({"status": "on_time"}));

        let payload = ContextPayload::for_trip(&trip, "flights", Some(&empty)).with_extra(fragments);
        let json = payload.to_json();
        assert_eq!(json["trip"]["startDate"], "2025-06-01");
        assert_eq!(json["pageKey"], "flights");
        assert!(json.get("pageContext").is_none());
        assert_eq!(json["flightStatus"]["status"], "on_time");

        let planner = ContextPayload::for_planner("user-1", None).to_json();
        assert_eq!(planner["pageKey"], "agent");
        assert_eq!(planner["userID"], "user-1");
        assert!(planner.get("trip").is_none());
    }

    #[test]
    fn test_planner_draft_omits_empty_fields() {
        let draft = PlannerDraft {
            destination: Some("Lisbon".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json, json!({"destination": "Lisbon"}));
        assert!(!draft.is_empty());

        let budget_only = PlannerDraft {
            budget_total: Some(2000.0),
            ..Default::default()
        };
        assert!(budget_only.is_empty());
    }
}
