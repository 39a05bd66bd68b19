//! Page-aware live-data dispatch.
//!
//! Decides per request whether the bridge is worth calling, based on the
//! page and on inputs recognized in the latest message, and folds every
//! outcome into a [`Source`] record. A bridge failure marks the whole
//! context as degraded but never aborts the request.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::extract::{extract_flight_inputs, extract_transit_inputs};
use crate::providers::BridgeClient;
use crate::types::{last_content, ChatMessage, Source, SourceStatus};

pub const FLIGHT_STATUS_SOURCE: &str = "next_flight_status";
pub const TRANSIT_SUGGEST_SOURCE: &str = "next_transit_suggest";
pub const FINANCE_GUARDRAIL_SOURCE: &str = "finance_guardrail";
pub const ITINERARY_RISK_SOURCE: &str = "itinerary_risk";
pub const OVERVIEW_SOURCE: &str = "overview_context";

const FLIGHT_STATUS_PATH: &str = "/api/flights/status";
const TRANSIT_SUGGEST_PATH: &str = "/api/transit/suggest";

/// What the dispatcher learned for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RealtimeContext {
    pub sources: Vec<Source>,
    pub degraded: bool,
    /// Fragments merged into the context payload, keyed by payload field.
    pub data: Map<String, Value>,
}

impl RealtimeContext {
    fn record(&mut self, source: Source) {
        self.sources.push(source);
    }
}

pub struct RealtimeDispatcher {
    bridge: Arc<dyn BridgeClient>,
}

impl RealtimeDispatcher {
    pub fn new(bridge: Arc<dyn BridgeClient>) -> Self {
        Self { bridge }
    }

    /// Gather live context for `page_key` from the last message only.
    pub async fn fetch(&self, page_key: &str, messages: &[ChatMessage]) -> RealtimeContext {
        let last = last_content(messages);
        let mut ctx = RealtimeContext::default();

        match page_key {
            "flights" => match extract_flight_inputs(last).complete() {
                Some((flight, date)) => {
                    let body = json!({"flight_number": flight, "departure_date": date});
                    self.call_bridge(
                        &mut ctx,
                        FLIGHT_STATUS_SOURCE,
                        FLIGHT_STATUS_PATH,
                        body,
                        "flightStatus",
                    )
                    .await;
                }
                None => ctx.record(Source::new(
                    FLIGHT_STATUS_SOURCE,
                    SourceStatus::SkippedMissingInputs,
                    Some("Include flight number and YYYY-MM-DD for live status.".to_string()),
                )),
            },
            "transit" => match extract_transit_inputs(last) {
                Some(route) => {
                    let body = json!({"origin": route.origin, "destination": route.destination});
                    self.call_bridge(
                        &mut ctx,
                        TRANSIT_SUGGEST_SOURCE,
                        TRANSIT_SUGGEST_PATH,
                        body,
                        "transitOptions",
                    )
                    .await;
                }
                None => ctx.record(Source::new(
                    TRANSIT_SUGGEST_SOURCE,
                    SourceStatus::SkippedMissingInputs,
                    Some("Use phrasing: from <origin> to <destination>.".to_string()),
                )),
            },
            "finance" => {
                ctx.record(Source::new(
                    FINANCE_GUARDRAIL_SOURCE,
                    SourceStatus::Ok,
                    Some("Computed from DB trip totals in this phase.".to_string()),
                ));
                ctx.data.insert(
                    "financeGuardrail".to_string(),
                    json!({
                        "status": "watch",
                        "note": "Placeholder until full finance tables are integrated."
                    }),
                );
            }
            "itinerary" => {
                ctx.record(Source::new(
                    ITINERARY_RISK_SOURCE,
                    SourceStatus::Ok,
                    Some("Derived from current snapshot in this phase.".to_string()),
                ));
                ctx.data.insert(
                    "itineraryRisk".to_string(),
                    json!({
                        "status": "unknown",
                        "note": "Placeholder until itinerary rows are persisted in backend."
                    }),
                );
            }
            _ => ctx.record(Source::ok(OVERVIEW_SOURCE)),
        }

        ctx
    }

    async fn call_bridge(
        &self,
        ctx: &mut RealtimeContext,
        source: &str,
        path: &str,
        body: Value,
        data_key: &str,
    ) {
        match self.bridge.post_json(path, &body).await {
            Ok(resp) => {
                debug!(source, path, "Bridge fetch succeeded");
                ctx.data.insert(data_key.to_string(), Value::Object(resp));
                ctx.record(Source::ok(source));
            }
            Err(e) => {
                warn!(source, path, error = %e, "Bridge fetch failed; continuing degraded");
                ctx.degraded = true;
                ctx.record(Source::new(source, SourceStatus::Error, Some(e.to_string())));
            }
        }
    }
}
