// src/scrape/providers/mod.rs
pub mod academic_positions;
pub mod ki_doktorand;
pub mod ki_varbi;

use std::time::Duration;

pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (compatible; KI-Job-Tracker/1.0)";

pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Slice of `html` around a regex match, clamped to char boundaries.
/// Providers scan this window for deadlines and descriptions sitting near
/// an anchor in the markup.
pub(crate) fn context_window(html: &str, start: usize, end: usize, radius: usize) -> &str {
    let lo = floor_char_boundary(html, start.saturating_sub(radius));
    let hi = ceil_char_boundary(html, (end + radius).min(html.len()));
    &html[lo..hi]
}

/// Forward-only variant of [`context_window`].
pub(crate) fn forward_window(html: &str, from: usize, len: usize) -> &str {
    let lo = ceil_char_boundary(html, from.min(html.len()));
    let hi = ceil_char_boundary(html, (from + len).min(html.len()));
    &html[lo..hi]
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Join a scraped href against the site root, decoding entity-escaped
/// ampersands on the way.
pub(crate) fn absolute_url(site_root: &str, href: &str) -> String {
    let href = html_escape::decode_html_entities(href).to_string();
    if href.starts_with("http://") || href.starts_with("https://") {
        href
    } else if href.starts_with('/') {
        format!("{site_root}{href}")
    } else {
        format!("{site_root}/{href}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_url_joins_and_decodes() {
        assert_eq!(
            absolute_url("https://ki.varbi.com", "/en/what:job/jobID:1/"),
            "https://ki.varbi.com/en/what:job/jobID:1/"
        );
        assert_eq!(
            absolute_url("https://ki.varbi.com", "en/job?jobID=2&amp;x=1"),
            "https://ki.varbi.com/en/job?jobID=2&x=1"
        );
        assert_eq!(
            absolute_url("https://ki.varbi.com", "https://other.example/j/3"),
            "https://other.example/j/3"
        );
    }

    #[test]
    fn context_window_respects_char_boundaries() {
        let s = "ansökningsdag 2026-01-31 — slut";
        let w = context_window(s, 14, 24, 6);
        assert!(w.contains("2026-01-31"));
    }
}
