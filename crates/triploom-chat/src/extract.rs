//! Pattern-based recognizers for flight and transit inputs in a single message.

use std::sync::LazyLock;

use regex::Regex;

static FLIGHT_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-Z0-9]{2,3}\s?[0-9]{1,4}[A-Z]?)\b").expect("Invalid flight regex")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{4}-[0-9]{2}-[0-9]{2})\b").expect("Invalid date regex"));

static TRANSIT_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)from\s+(.+?)\s+to\s+(.+)$").expect("Invalid transit regex")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightInputs {
    /// Upper-cased with spaces removed, e.g. `AA123`.
    pub flight_number: Option<String>,
    /// `YYYY-MM-DD`, not validated as a calendar date.
    pub date: Option<String>,
}

impl FlightInputs {
    /// Both parts, when present.
    pub fn complete(&self) -> Option<(&str, &str)> {
        match (&self.flight_number, &self.date) {
            (Some(f), Some(d)) => Some((f.as_str(), d.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitInputs {
    pub origin: String,
    pub destination: String,
}

pub fn extract_flight_inputs(text: &str) -> FlightInputs {
    let upper = text.to_uppercase();
    let flight_number = FLIGHT_NUMBER
        .captures(&upper)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().replace(' ', ""));
    let date = ISO_DATE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    FlightInputs {
        flight_number,
        date,
    }
}

/// Origin and destination from "from X to Y", or `None` unless both are present.
pub fn extract_transit_inputs(text: &str) -> Option<TransitInputs> {
    let caps = TRANSIT_ROUTE.captures(text.trim())?;
    let origin = caps.get(1)?.as_str().trim();
    let destination = caps.get(2)?.as_str().trim();
    if origin.is_empty() || destination.is_empty() {
        return None;
    }
    Some(TransitInputs {
        origin: origin.to_string(),
        destination: destination.to_string(),
    })
}
