//! Small helpers shared by the extraction and ingestion paths.

use chrono::{DateTime, NaiveDate, Utc};
use co_core::{Error, Result};
use scraper::{Html, Selector};
use url::Url;

pub fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))
}

pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::Scraping(format!("Invalid selector {}: {}", selector, e)))
}

pub fn parse_selectors(selectors: &[String]) -> Result<Vec<Selector>> {
    selectors.iter().map(|s| parse_selector(s)).collect()
}

/// Trimmed text of the first element matching `selector` that has any.
pub fn extract_text(document: &Html, selector: &str) -> Option<String> {
    let selector = parse_selector(selector).ok()?;
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .find(|text| !text.is_empty())
}

pub fn extract_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = parse_selector(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// Values of `key` across the page's JSON-LD blocks. Handles plain
/// strings, `{ "name": ... }` objects and arrays of either.
pub fn json_ld_values(document: &Html, key: &str) -> Vec<String> {
    let mut values = Vec::new();
    let Ok(script_selector) = Selector::parse("script[type='application/ld+json']") else {
        return values;
    };

    for script in document.select(&script_selector) {
        let Ok(json) = serde_json::from_str::<serde_json::Value>(script.text().collect::<String>().trim()) else {
            continue;
        };
        let nodes = match json.get("@graph").and_then(|g| g.as_array()) {
            Some(graph) => graph.clone(),
            None => vec![json],
        };
        for node in nodes {
            match node.get(key) {
                Some(serde_json::Value::Array(items)) => values.extend(items.iter().filter_map(name_of)),
                Some(value) => values.extend(name_of(value)),
                None => {}
            }
        }
    }

    values
}

fn name_of(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.trim().to_string()),
        serde_json::Value::Object(obj) => obj.get("name").and_then(|n| n.as_str()).map(|n| n.trim().to_string()),
        _ => None,
    }
    .filter(|s| !s.is_empty())
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
