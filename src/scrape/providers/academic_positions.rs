// src/scrape/providers/academic_positions.rs
//! KI PhD listings on academicpositions.com. Job links carry either a
//! numeric id or a slug; as a last resort the href hash becomes the key so
//! the id stays stable across runs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use super::{absolute_url, forward_window, http_client};
use crate::listing::Source;
use crate::scrape::types::{RawListing, SiteProvider};
use crate::scrape::{find_deadline_text, normalize_text};

const BASE_URL: &str =
    "https://academicpositions.com/jobs/employer/karolinska-institutet/position/phd";
const SITE_ROOT: &str = "https://academicpositions.com";

pub struct AcademicPositionsProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl AcademicPositionsProvider {
    pub fn from_url() -> Self {
        Self {
            mode: Mode::Http {
                url: BASE_URL.to_string(),
                client: http_client(30),
            },
        }
    }

    /// Parse a captured HTML page instead of fetching; used by tests.
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    fn parse_listings(html: &str) -> Vec<RawListing> {
        static RE_ANCHOR: OnceCell<Regex> = OnceCell::new();
        let re_anchor = RE_ANCHOR.get_or_init(|| {
            Regex::new(r##"(?is)<a\b[^>]*href\s*=\s*"([^"]*/jobs?/[^"#]+)"[^>]*>(.*?)</a>"##)
                .expect("academic anchor regex")
        });
        static RE_PARA: OnceCell<Regex> = OnceCell::new();
        let re_para =
            RE_PARA.get_or_init(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("para regex"));

        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut out = Vec::new();

        for caps in re_anchor.captures_iter(html) {
            let (Some(href), Some(inner)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let Some(key) = job_key(href.as_str()) else {
                continue;
            };
            if !seen_keys.insert(key.clone()) {
                continue;
            }

            let title = normalize_text(inner.as_str());
            if title.chars().count() < 5 {
                continue;
            }

            // Card content follows the title anchor; only look forward so a
            // neighbouring card's dates don't bleed in.
            let window = forward_window(html, inner.end(), 1000);
            let description = re_para
                .captures(window)
                .and_then(|c| c.get(1))
                .map(|m| {
                    let mut d = normalize_text(m.as_str());
                    d.truncate(d.char_indices().nth(200).map_or(d.len(), |(i, _)| i));
                    d
                })
                .unwrap_or_default();
            let deadline = find_deadline_text(&normalize_text(window));

            out.push(RawListing {
                key: Some(key),
                title: Some(title),
                url: Some(absolute_url(SITE_ROOT, href.as_str())),
                deadline,
                description,
            });
        }

        out
    }
}

/// Numeric id preferred, slug accepted, href hash as last resort.
fn job_key(href: &str) -> Option<String> {
    static RE_NUMERIC: OnceCell<Regex> = OnceCell::new();
    let re_numeric =
        RE_NUMERIC.get_or_init(|| Regex::new(r"/jobs?/(\d+)").expect("numeric key regex"));
    if let Some(m) = re_numeric.captures(href).and_then(|c| c.get(1)) {
        return Some(m.as_str().to_string());
    }

    static RE_SLUG: OnceCell<Regex> = OnceCell::new();
    let re_slug =
        RE_SLUG.get_or_init(|| Regex::new(r"/jobs?/([a-z0-9-]+)").expect("slug key regex"));
    if let Some(m) = re_slug.captures(href).and_then(|c| c.get(1)) {
        return Some(m.as_str().to_string());
    }

    if href.is_empty() {
        return None;
    }
    let digest = Sha256::digest(href.as_bytes());
    let mut key = String::with_capacity(10);
    for b in digest.iter().take(5) {
        use std::fmt::Write as _;
        let _ = write!(&mut key, "{b:02x}");
    }
    Some(key)
}

#[async_trait]
impl SiteProvider for AcademicPositionsProvider {
    async fn fetch_listings(&self) -> Result<Vec<RawListing>> {
        match &self.mode {
            Mode::Fixture(s) => Ok(Self::parse_listings(s)),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("academic_positions http get")?
                    .error_for_status()
                    .context("academic_positions non-2xx")?
                    .text()
                    .await
                    .context("academic_positions body text")?;
                Ok(Self::parse_listings(&body))
            }
        }
    }

    fn source(&self) -> Source {
        Source::AcademicPositions
    }
}
