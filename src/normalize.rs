// src/normalize.rs
//! Listing normalizer: raw per-source records → canonical [`Listing`]s with
//! stable ids. Malformed records are logged and skipped; one bad record
//! never aborts its siblings.

use chrono::NaiveDate;
use metrics::counter;

use crate::listing::{Listing, Source};
use crate::scrape::normalize_text;
use crate::scrape::types::RawListing;

/// Formats the sites have been observed to use for deadlines.
const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%d.%b.%Y",
    "%d-%b-%Y",
    "%d.%m.%Y",
];

pub fn parse_closing_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Build the canonical listing, or `None` when the record is unusable
/// (missing key, title, or url).
pub fn normalize(raw: &RawListing, source: Source) -> Option<Listing> {
    let Some(key) = raw.key.as_deref().map(str::trim).filter(|k| !k.is_empty()) else {
        skip(source, "no source-local key");
        return None;
    };

    let title = raw
        .title
        .as_deref()
        .map(normalize_text)
        .filter(|t| !t.is_empty());
    let Some(title) = title else {
        skip(source, "missing title");
        return None;
    };

    let Some(url) = raw.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
        skip(source, "missing url");
        return None;
    };

    let description = normalize_text(&raw.description);
    let raw_text = if description.is_empty() {
        title.clone()
    } else {
        format!("{title} {description}")
    };

    Some(Listing {
        id: format!("{}:{key}", source.key()),
        source,
        title,
        url: url.to_string(),
        closing_date: raw.deadline.as_deref().and_then(parse_closing_date),
        deadline: raw.deadline.clone(),
        raw_text,
    })
}

/// Normalize a whole batch, dropping (and counting) malformed records.
pub fn normalize_batch(records: &[RawListing], source: Source) -> Vec<Listing> {
    records
        .iter()
        .filter_map(|raw| normalize(raw, source))
        .collect()
}

fn skip(source: Source, reason: &str) {
    tracing::warn!(target: "normalize", source = %source, reason, "skipping malformed record");
    counter!("scrape_malformed_total").increment(1);
}
