// src/scrape/providers/ki_varbi.rs
//! Staff positions at ki.varbi.com. Varbi lists jobs as anchors whose href
//! carries a numeric jobID.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashSet;

use super::{absolute_url, context_window, forward_window, http_client};
use crate::listing::Source;
use crate::scrape::types::{RawListing, SiteProvider};
use crate::scrape::{find_deadline_text, normalize_text};

const BASE_URL: &str = "https://ki.varbi.com/en/";
const SITE_ROOT: &str = "https://ki.varbi.com";

pub struct KiVarbiProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl KiVarbiProvider {
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
            Regex::new(r#"(?is)<a\b[^>]*href\s*=\s*"([^"]*jobID[=:]\d+[^"]*)"[^>]*>(.*?)</a>"#)
                .expect("varbi anchor regex")
        });
        static RE_JOB_ID: OnceCell<Regex> = OnceCell::new();
        let re_job_id =
            RE_JOB_ID.get_or_init(|| Regex::new(r"jobID[=:](\d+)").expect("jobID regex"));

        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut out = Vec::new();

        for caps in re_anchor.captures_iter(html) {
            let (Some(href), Some(inner)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let Some(key) = re_job_id
                .captures(href.as_str())
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
            else {
                continue;
            };
            if !seen_keys.insert(key.clone()) {
                continue;
            }

            let mut title = normalize_text(inner.as_str());
            if title.chars().count() < 5 {
                // Navigation arrows and icon links; try the markup right
                // after the anchor before dropping the hit.
                let after = forward_window(html, inner.end(), 300);
                title = normalize_text(after);
                if title.chars().count() < 5 {
                    continue;
                }
            }
            title.truncate(title.char_indices().nth(200).map_or(title.len(), |(i, _)| i));

            let window = context_window(html, caps.get(0).map_or(0, |m| m.start()), inner.end(), 600);
            let deadline = find_deadline_text(&normalize_text(window));

            out.push(RawListing {
                key: Some(key),
                title: Some(title),
                url: Some(absolute_url(SITE_ROOT, href.as_str())),
                deadline,
                description: String::new(),
            });
        }

        out
    }
}

#[async_trait]
impl SiteProvider for KiVarbiProvider {
    async fn fetch_listings(&self) -> Result<Vec<RawListing>> {
        match &self.mode {
            Mode::Fixture(s) => Ok(Self::parse_listings(s)),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("ki_varbi http get")?
                    .error_for_status()
                    .context("ki_varbi non-2xx")?
                    .text()
                    .await
                    .context("ki_varbi body text")?;
                Ok(Self::parse_listings(&body))
            }
        }
    }

    fn source(&self) -> Source {
        Source::KiVarbi
    }
}
