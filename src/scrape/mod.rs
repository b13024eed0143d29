// src/scrape/mod.rs
pub mod providers;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::scrape::types::{SiteProvider, SourceBatch};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "scrape_listings_total",
            "Raw listings extracted from career sites."
        );
        describe_counter!(
            "scrape_source_errors_total",
            "Source fetches that failed after all retries."
        );
        describe_counter!(
            "scrape_malformed_total",
            "Raw records dropped during normalization."
        );
        describe_gauge!(
            "scrape_last_run_ts",
            "Unix ts when the scrape pipeline last ran."
        );
    });
}

/// Normalize scraped markup into plain matching text: decode HTML entities,
/// strip tags, fold curly quotes, collapse whitespace, cap the length.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{2013}', '\u{2014}'], "-");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > 2000 {
        out = out.chars().take(2000).collect();
    }

    out
}

/// Scan free text for a deadline phrase and return the raw date string.
/// Patterns cover the wordings the three sites actually use.
pub fn find_deadline_text(text: &str) -> Option<String> {
    static PATTERNS: OnceCell<Vec<regex::Regex>> = OnceCell::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            r"(?i)last application date[\s:]*(\d{1,2}[./-][A-Za-z]{3}[./-]\d{4}|\d{4}-\d{2}-\d{2}|\d{1,2}[./-]\d{1,2}[./-]\d{4})",
            r"(?i)application deadline[:\s]+([A-Za-z]+ \d{1,2},? \d{4})",
            r"(?i)deadline[:\s]+(\d{4}-\d{2}-\d{2})",
            r"(?i)deadline[:\s]+(\d{1,2}[/-]\d{1,2}[/-]\d{4})",
            r"(?i)apply by[:\s]+([A-Za-z]+ \d{1,2},? \d{4})",
            r"(?i)expires?[:\s]+([A-Za-z]+ \d{1,2},? \d{4})",
            r"(\d{4}-\d{2}-\d{2})",
        ]
        .iter()
        .map(|p| regex::Regex::new(p).expect("deadline regex"))
        .collect()
    });

    for re in patterns {
        if let Some(caps) = re.captures(text) {
            if let Some(m) = caps.get(1) {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}

/// Fetch every configured source independently with bounded retries.
/// A source that exhausts its retries yields `success: false` and an empty
/// record set; the run continues.
pub async fn fetch_all(providers: &[Box<dyn SiteProvider>], max_retries: u8) -> Vec<SourceBatch> {
    ensure_metrics_described();

    let mut batches = Vec::with_capacity(providers.len());
    for provider in providers {
        let source = provider.source();
        let mut attempt: u8 = 0;
        let batch = loop {
            attempt += 1;
            match provider.fetch_listings().await {
                Ok(records) => {
                    counter!("scrape_listings_total").increment(records.len() as u64);
                    tracing::info!(
                        target: "scrape",
                        source = %source,
                        found = records.len(),
                        "source scraped"
                    );
                    break SourceBatch {
                        source,
                        success: true,
                        records,
                    };
                }
                Err(e) if attempt < max_retries => {
                    tracing::warn!(
                        target: "scrape",
                        source = %source,
                        error = ?e,
                        attempt,
                        "source fetch failed, retrying"
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(
                        500u64 << (attempt - 1),
                    ))
                    .await;
                }
                Err(e) => {
                    tracing::warn!(
                        target: "scrape",
                        source = %source,
                        error = ?e,
                        "source fetch failed, giving up for this run"
                    );
                    counter!("scrape_source_errors_total").increment(1);
                    break SourceBatch {
                        source,
                        success: false,
                        records: Vec::new(),
                    };
                }
            }
        };
        batches.push(batch);
    }

    gauge!("scrape_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
    batches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_strips_tags_and_collapses_ws() {
        let s = "  <b>PhD&nbsp;position</b> in <i>neuroscience</i>  ";
        assert_eq!(normalize_text(s), "PhD position in neuroscience");
    }

    #[test]
    fn normalize_text_folds_curly_quotes() {
        let s = "\u{201C}stem\u{201D} \u{2018}cell\u{2019} \u{2013} lab";
        assert_eq!(normalize_text(s), "\"stem\" 'cell' - lab");
    }

    #[test]
    fn deadline_phrase_variants_are_found() {
        assert_eq!(
            find_deadline_text("Deadline: 2026-03-15 apply now"),
            Some("2026-03-15".to_string())
        );
        assert_eq!(
            find_deadline_text("Last application date 15.Mar.2026"),
            Some("15.Mar.2026".to_string())
        );
        assert_eq!(
            find_deadline_text("Apply by March 15, 2026"),
            Some("March 15, 2026".to_string())
        );
        assert_eq!(find_deadline_text("no dates here"), None);
    }
}
