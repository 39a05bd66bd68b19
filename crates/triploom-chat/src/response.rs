//! Static response decorations derived from the page key.

/// Highlights attached to every page chat answer.
pub fn highlights(page_key: &str) -> Vec<String> {
    vec![
        "Read-only guidance generated from current trip context".to_string(),
        format!("Page-aware reasoning for {}", page_key),
    ]
}

/// Two next-step suggestions for the page the user is on.
pub fn suggest_actions_for_page(page_key: &str) -> Vec<String> {
    let actions: [&str; 2] = match page_key {
        "flights" => [
            "Share exact flight number and date for live status",
            "Compare price-time tradeoff before selecting",
        ],
        "transit" => [
            "Provide 'from X to Y' for route options",
            "Save top route to itinerary notes",
        ],
        "finance" => ["Review highest-spend category", "Set per-day budget target"],
        _ => ["Ask for next best step", "Request a prioritized checklist"],
    };
    actions.iter().map(|a| a.to_string()).collect()
}

/// `"flights"` becomes `"Flights assistant"`.
pub fn conversation_title(page_key: &str) -> String {
    let titled = page_key
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ");
    format!("{} assistant", titled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlights() {
        assert_eq!(
            highlights("flights"),
            vec![
                "Read-only guidance generated from current trip context",
                "Page-aware reasoning for flights"
            ]
        );
    }

    #[test]
    fn test_suggested_actions() {
        assert_eq!(
            suggest_actions_for_page("transit")[0],
            "Provide 'from X to Y' for route options"
        );
        assert_eq!(
            suggest_actions_for_page("finance"),
            vec!["Review highest-spend category", "Set per-day budget target"]
        );
        assert_eq!(
            suggest_actions_for_page("docs"),
            suggest_actions_for_page("overview")
        );
    }

    #[test]
    fn test_conversation_title() {
        assert_eq!(conversation_title("flights"), "Flights assistant");
        assert_eq!(conversation_title("group plan"), "Group Plan assistant");
        assert_eq!(conversation_title(""), " assistant");
    }
}
