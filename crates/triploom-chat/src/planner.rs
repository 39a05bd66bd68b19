//! Trip-draft inference for the planner agent.
//!
//! Every field is inferred by its own matcher so each heuristic can be tested
//! in isolation. Structured hints from the planner form always win over free
//! text. Matchers fail soft: no match means the field stays empty.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};

use crate::types::{ChatMessage, ChatRole, PlannerDraft, PlannerDraftItem};

const MAX_CITIES: usize = 6;
const MAX_ACTIVITIES: usize = 8;

// =============================================================================
// Compiled patterns
// =============================================================================

// Keywords match in any case; the captured place name must be title case.
static DESTINATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:to|in|for)\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+){0,2})\b")
        .expect("Invalid destination regex")
});

static COUNTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:in|to)\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+){0,2})\b")
        .expect("Invalid country regex")
});

static CITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:in|to|via)\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+){0,2})")
        .expect("Invalid city regex")
});

static TRIP_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(20[0-9]{2}-[0-9]{2}-[0-9]{2})\b").expect("Invalid date regex"));

static TRAVELER_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([0-9]{1,2})\s+(?:travelers?|people|adults?)\b")
        .expect("Invalid traveler regex")
});

static FIRST_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("Invalid integer regex"));

static BUDGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:budget|spend|cost)[^0-9]{0,20}([0-9]{2,6})").expect("Invalid budget regex")
});

// =============================================================================
// Helpers
// =============================================================================

fn string_hint<'a>(ctx: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    ctx.and_then(|m| m.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([',', ';', '\n'])
}

/// Trim, drop empties, and dedupe case-insensitively keeping first-seen casing.
fn dedup_ci<'a>(items: impl IntoIterator<Item = &'a str>, cap: Option<usize>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let item = item.trim();
        if item.is_empty() || !seen.insert(item.to_lowercase()) {
            continue;
        }
        out.push(item.to_string());
        if cap.is_some_and(|c| out.len() >= c) {
            break;
        }
    }
    out
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Planner hints, the answer, and the user's own messages, one per line.
fn combined_text(ctx: Option<&Map<String, Value>>, messages: &[ChatMessage], answer: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    parts.extend(string_hint(ctx, "mustDoExperiences"));
    parts.extend(string_hint(ctx, "concerns"));
    parts.push(answer.trim());
    parts.extend(
        messages
            .iter()
            .filter(|m| m.role != ChatRole::Assistant)
            .map(|m| m.content.trim()),
    );
    parts.retain(|p| !p.is_empty());
    parts.join("\n")
}

// =============================================================================
// Matchers
// =============================================================================

pub fn infer_destination(ctx: Option<&Map<String, Value>>, text: &str) -> Option<String> {
    string_hint(ctx, "destination")
        .map(str::to_string)
        .or_else(|| first_capture(&DESTINATION, text))
}

pub fn infer_country(ctx: Option<&Map<String, Value>>, text: &str) -> Option<String> {
    string_hint(ctx, "country")
        .map(str::to_string)
        .or_else(|| first_capture(&COUNTRY, text))
}

pub fn infer_cities(ctx: Option<&Map<String, Value>>, text: &str) -> Vec<String> {
    let hinted = match ctx.and_then(|m| m.get("cities")) {
        Some(Value::Array(items)) => dedup_ci(items.iter().filter_map(Value::as_str), None),
        Some(Value::String(raw)) => dedup_ci(split_list(raw), None),
        _ => Vec::new(),
    };
    if !hinted.is_empty() {
        return hinted;
    }

    dedup_ci(
        CITY.captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str()),
        Some(MAX_CITIES),
    )
}

/// First two trip dates in order of appearance. Never reordered.
pub fn infer_date_range(text: &str) -> (Option<String>, Option<String>) {
    let mut dates = TRIP_DATE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let start = dates.next();
    let end = dates.next();
    (start, end)
}

/// Traveler count, or 0 when nothing credible was found.
pub fn infer_travelers(ctx: Option<&Map<String, Value>>, text: &str) -> u32 {
    match ctx.and_then(|m| m.get("travelers")) {
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_f64().filter(|v| *v >= 1.0) {
                return v as u32;
            }
        }
        Some(Value::String(raw)) => {
            let parsed = FIRST_INTEGER
                .find(raw)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .filter(|n| *n > 0);
            if let Some(n) = parsed {
                return n;
            }
            if raw.to_lowercase().contains("solo") {
                return 1;
            }
        }
        _ => {}
    }

    let counted = TRAVELER_COUNT
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0);
    if let Some(n) = counted {
        return n;
    }

    if text.to_lowercase().contains("solo") {
        return 1;
    }
    0
}

pub fn infer_budget(text: &str) -> Option<f64> {
    BUDGET
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| *v > 0.0)
}

pub fn infer_activities(ctx: Option<&Map<String, Value>>, text: &str) -> Vec<String> {
    let base = string_hint(ctx, "mustDoExperiences").unwrap_or(text);
    dedup_ci(split_list(base), Some(MAX_ACTIVITIES))
}

/// One item per day, one activity per day, never more days than activities.
///
/// The day count is the inclusive date span when both dates parse and the
/// range is not inverted; otherwise it is the activity count.
pub fn build_itinerary_skeleton(
    activities: &[String],
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Vec<PlannerDraftItem> {
    if activities.is_empty() {
        return Vec::new();
    }

    let parse = |raw: Option<&str>| raw.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
    let days = match (parse(start_date), parse(end_date)) {
        (Some(start), Some(end)) if end >= start => ((end - start).num_days() + 1).max(1) as usize,
        _ => activities.len(),
    }
    .min(activities.len());

    activities
        .iter()
        .take(days)
        .enumerate()
        .map(|(i, title)| PlannerDraftItem {
            day_index: i as u32 + 1,
            title: title.clone(),
            time_block: "afternoon".to_string(),
            category: "activities".to_string(),
            notes: "Drafted by Agent planner conversation.".to_string(),
        })
        .collect()
}

/// Infer a trip draft, or `None` when nothing worth showing was found.
pub fn build_planner_draft(
    ctx: Option<&Map<String, Value>>,
    messages: &[ChatMessage],
    answer: &str,
) -> Option<PlannerDraft> {
    let text = combined_text(ctx, messages, answer);
    let (start_date, end_date) = infer_date_range(&text);
    let activities = infer_activities(ctx, &text);
    let itinerary =
        build_itinerary_skeleton(&activities, start_date.as_deref(), end_date.as_deref());
    let travelers = infer_travelers(ctx, &text);

    let draft = PlannerDraft {
        destination: infer_destination(ctx, &text),
        country: infer_country(ctx, &text),
        cities: infer_cities(ctx, &text),
        start_date,
        end_date,
        travelers: (travelers > 0).then_some(travelers),
        budget_total: infer_budget(&text),
        activities,
        itinerary,
    };

    (!draft.is_empty()).then_some(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hints(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    // =========================================================================
    // Destination / country / cities
    // =========================================================================

    #[test]
    fn test_destination_prefers_hint() {
        let ctx = hints(json!({"destination": "  Kyoto "}));
        assert_eq!(
            infer_destination(Some(&ctx), "fly to Lisbon").as_deref(),
            Some("Kyoto")
        );
    }

    #[test]
    fn test_destination_from_text() {
        assert_eq!(
            infer_destination(None, "Plan a week TO New York City please").as_deref(),
            Some("New York City")
        );
        assert_eq!(infer_destination(None, "take me somewhere warm"), None);
        assert_eq!(infer_destination(None, "i want to go to lisbon"), None);
    }

    #[test]
    fn test_country_uses_in_or_to() {
        assert_eq!(
            infer_country(None, "Ideas for Spain, ideally in Portugal").as_deref(),
            Some("Portugal")
        );
        let ctx = hints(json!({"country": ""}));
        assert_eq!(
            infer_country(Some(&ctx), "a week in Japan").as_deref(),
            Some("Japan")
        );
    }

    #[test]
    fn test_cities_from_array_hint_dedupes() {
        let ctx = hints(json!({"cities": ["Lisbon", " lisbon ", "Porto", 3, ""]}));
        assert_eq!(infer_cities(Some(&ctx), ""), vec!["Lisbon", "Porto"]);
    }

    #[test]
    fn test_cities_from_string_hint() {
        let ctx = hints(json!({"cities": "Rome; Florence,\nVenice, rome"}));
        assert_eq!(
            infer_cities(Some(&ctx), ""),
            vec!["Rome", "Florence", "Venice"]
        );
    }

    #[test]
    fn test_cities_scanned_and_capped() {
        let text = "to Aa in Bb via Cc to Dd in Ee via Ff to Gg in aa";
        let cities = infer_cities(None, text);
        assert_eq!(cities, vec!["Aa", "Bb", "Cc", "Dd", "Ee", "Ff"]);

        let cities = infer_cities(None, "start in Paris, then to Lyon, back in Paris");
        assert_eq!(cities, vec!["Paris", "Lyon"]);
    }

    // =========================================================================
    // Dates / travelers / budget / activities
    // =========================================================================

    #[test]
    fn test_date_range() {
        assert_eq!(
            infer_date_range("2025-06-10 then 2025-06-01 and 2025-07-01"),
            (Some("2025-06-10".into()), Some("2025-06-01".into()))
        );
        assert_eq!(
            infer_date_range("leaving 2025-06-10"),
            (Some("2025-06-10".into()), None)
        );
        assert_eq!(infer_date_range("1999-01-01 next summer"), (None, None));
    }

    #[test]
    fn test_travelers_from_hints() {
        let ctx = hints(json!({"travelers": "3 adults"}));
        assert_eq!(infer_travelers(Some(&ctx), ""), 3);

        let ctx = hints(json!({"travelers": 4}));
        assert_eq!(infer_travelers(Some(&ctx), "2 people"), 4);

        let ctx = hints(json!({"travelers": "solo trip"}));
        assert_eq!(infer_travelers(Some(&ctx), ""), 1);

        let ctx = hints(json!({"travelers": 0}));
        assert_eq!(infer_travelers(Some(&ctx), "2 people"), 2);
    }

    #[test]
    fn test_travelers_from_text() {
        assert_eq!(infer_travelers(None, "we are 2 Adults"), 2);
        assert_eq!(infer_travelers(None, "a solo trip"), 1);
        assert_eq!(infer_travelers(None, "a trip"), 0);
        assert_eq!(infer_travelers(None, "0 travelers"), 0);
    }

    #[test]
    fn test_budget() {
        assert_eq!(infer_budget("Budget is about 2500 EUR"), Some(2500.0));
        assert_eq!(infer_budget("we can spend $1200"), Some(1200.0));
        assert_eq!(infer_budget("budget 5"), None);
        assert_eq!(infer_budget("3000 total"), None);
    }

    #[test]
    fn test_numbers_require_ascii_digits() {
        assert_eq!(infer_budget("budget ١٢٣٤ or 5000"), Some(5000.0));
        assert_eq!(
            infer_date_range("٢٠٢٥-٠٦-٠١ to 2025-06-03"),
            (Some("2025-06-03".into()), None)
        );
        assert_eq!(infer_travelers(None, "٣ adults"), 0);
    }

    #[test]
    fn test_activities_split_and_capped() {
        let ctx = hints(json!({"mustDoExperiences": "Tram 28, Belem; tram 28\nFado night"}));
        assert_eq!(
            infer_activities(Some(&ctx), "ignored"),
            vec!["Tram 28", "Belem", "Fado night"]
        );

        let many = (1..=10).map(|i| format!("a{}", i)).collect::<Vec<_>>().join(",");
        assert_eq!(infer_activities(None, &many).len(), MAX_ACTIVITIES);
    }

    // =========================================================================
    // Itinerary skeleton
    // =========================================================================

    #[test]
    fn test_skeleton_clamped_to_date_span() {
        let activities = vec!["Museum".to_string(), "Beach".to_string(), "Market".to_string()];
        let items = build_itinerary_skeleton(&activities, Some("2025-06-01"), Some("2025-06-02"));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].day_index, 1);
        assert_eq!(items[0].title, "Museum");
        assert_eq!(items[1].day_index, 2);
        assert_eq!(items[1].title, "Beach");
        assert_eq!(items[1].time_block, "afternoon");
        assert_eq!(items[1].category, "activities");
        assert_eq!(items[1].notes, "Drafted by Agent planner conversation.");
    }

    #[test]
    fn test_skeleton_never_exceeds_activities() {
        let activities = vec!["Museum".to_string(), "Beach".to_string()];
        let items = build_itinerary_skeleton(&activities, Some("2025-06-01"), Some("2025-06-20"));
        assert_eq!(items.len(), 2);

        let items = build_itinerary_skeleton(&activities, Some("2025-06-05"), Some("2025-06-01"));
        assert_eq!(items.len(), 2);

        let items = build_itinerary_skeleton(&activities, Some("2025-06-01"), Some("2025-06-01"));
        assert_eq!(items.len(), 1);

        assert!(build_itinerary_skeleton(&[], Some("2025-06-01"), None).is_empty());
    }

    // =========================================================================
    // Whole draft
    // =========================================================================

    #[test]
    fn test_draft_from_conversation() {
        let ctx = hints(json!({"mustDoExperiences": "Tram 28, Belem tower; Fado night"}));
        let messages = vec![
            ChatMessage::user(
                "Plan a trip to Lisbon for 2 adults from 2025-06-01 to 2025-06-02. Budget 3000 euros.",
            ),
            ChatMessage::assistant("Happy to help with Porto too."),
        ];

        let draft = build_planner_draft(Some(&ctx), &messages, "Sounds great.").unwrap();
        assert_eq!(draft.destination.as_deref(), Some("Lisbon"));
        assert_eq!(draft.cities, vec!["Lisbon"]);
        assert_eq!(draft.start_date.as_deref(), Some("2025-06-01"));
        assert_eq!(draft.end_date.as_deref(), Some("2025-06-02"));
        assert_eq!(draft.travelers, Some(2));
        assert_eq!(draft.budget_total, Some(3000.0));
        assert_eq!(draft.activities, vec!["Tram 28", "Belem tower", "Fado night"]);
        assert_eq!(draft.itinerary.len(), 2);
    }

    #[test]
    fn test_draft_absent_when_nothing_inferred() {
        assert_eq!(build_planner_draft(None, &[], ""), None);

        let messages = vec![ChatMessage::assistant("Going to Lisbon with 4 people")];
        assert_eq!(build_planner_draft(None, &messages, "   "), None);
    }
}
