//! HTML helpers for pulling text out of parsed documents

use scraper::{ElementRef, Html, Selector};

/// Parses a rule string into a selector, logging rules that do not parse
///
/// Rule maps are hand-curated, so a typo in one rule must not abort the
/// whole extraction run.
pub fn parse_selector(rule: &str) -> Option<Selector> {
    match Selector::parse(rule) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!(rule, error = ?e, "Skipping unparsable selector rule");
            None
        }
    }
}

/// Text content of an element, concatenated and trimmed
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Applies `rule` to `document` and returns the first match's content
///
/// With `attribute` set, the value of that attribute is read instead of the
/// element text; a match without the attribute yields nothing.
pub fn select_content(document: &Html, rule: &str, attribute: Option<&str>) -> Option<String> {
    let selector = parse_selector(rule)?;
    let element = document.select(&selector).next()?;

    match attribute {
        Some(name) => element.value().attr(name).map(|v| v.trim().to_string()),
        None => Some(element_text(&element)),
    }
}

/// Applies `rule` and returns the text of every match
pub fn select_all_text(document: &Html, rule: &str) -> Vec<String> {
    let Some(selector) = parse_selector(rule) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .collect()
}
