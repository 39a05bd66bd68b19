//! Deterministic answers used when the model yields nothing usable.

use crate::extract::extract_transit_inputs;
use crate::providers::PLACEHOLDER_ANSWER;
use crate::types::{last_content, ChatMessage};

/// Answer for the planner agent when the model yields nothing usable.
pub const PLANNER_FALLBACK: &str = "I can help build this trip plan. Share destination, dates (or month), traveler count, and top experiences, then I’ll draft a practical plan you can apply.";

/// True when the model output should be replaced by a local answer.
pub fn is_unusable(text: &str) -> bool {
    text.trim().is_empty() || text == PLACEHOLDER_ANSWER
}

/// Page-aware answer built only from the conversation and the degraded flag.
pub fn synthesize(page_key: &str, messages: &[ChatMessage], degraded: bool) -> String {
    let last = last_content(messages).trim();

    if page_key == "transit" {
        match (extract_transit_inputs(last), degraded) {
            (Some(route), true) => {
                return format!(
                    "I can’t fetch live transit suggestions right now, but I can still guide you. For {} to {}, FlixBus is commonly an option on this corridor. Next actions: 1) check FlixBus for your exact date/time, 2) compare against rail duration/price, 3) pick the best reliability-cost tradeoff.",
                    route.origin, route.destination
                );
            }
            (Some(route), false) => {
                return format!(
                    "For {} to {}, I can help compare bus vs rail if you share your target departure date/time.",
                    route.origin, route.destination
                );
            }
            (None, true) => {
                return "Live transit data is unavailable right now. Share route in the format 'from <origin> to <destination>' and I’ll provide a structured bus-vs-rail recommendation.".to_string();
            }
            (None, false) => {}
        }
    }

    if degraded {
        "I can still help, but live data is currently unavailable. Share the key details and I’ll give a best-available recommendation with clear assumptions.".to_string()
    } else {
        "Share a bit more detail and I’ll give a concrete next-step recommendation.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(text: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(text)]
    }

    #[test]
    fn test_is_unusable() {
        assert!(is_unusable(""));
        assert!(is_unusable("   \n\t"));
        assert!(is_unusable("I could not generate a response."));
        assert!(!is_unusable(" I could not generate a response. "));
        assert!(!is_unusable("Take the 9:00 train."));
    }

    #[test]
    fn test_transit_degraded_with_route() {
        let answer = synthesize("transit", &one("  from Berlin to Prague "), true);
        assert!(answer.contains("For Berlin to Prague"));
        assert!(answer.contains("FlixBus"));
        assert!(answer.contains("3) pick the best reliability-cost tradeoff"));
    }

    #[test]
    fn test_transit_with_route_not_degraded() {
        let answer = synthesize("transit", &one("from Berlin to Prague"), false);
        assert_eq!(
            answer,
            "For Berlin to Prague, I can help compare bus vs rail if you share your target departure date/time."
        );
    }

    #[test]
    fn test_transit_degraded_without_route() {
        let answer = synthesize("transit", &one("any buses?"), true);
        assert!(answer.starts_with("Live transit data is unavailable right now."));
    }

    #[test]
    fn test_transit_without_route_not_degraded_uses_generic() {
        let answer = synthesize("transit", &one("any buses?"), false);
        assert!(answer.starts_with("Share a bit more detail"));
    }

    #[test]
    fn test_generic_answers() {
        assert!(synthesize("flights", &one("hi"), true).starts_with("I can still help"));
        assert!(synthesize("overview", &[], false).starts_with("Share a bit more detail"));
    }
}
