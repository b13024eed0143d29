// src/scrape/providers/ki_doktorand.rs
//! Doctoral positions at kidoktorand.varbi.com. The index page only lists
//! titles, so in HTTP mode each posting's detail page is fetched for its
//! "Last application date".

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashSet;

use super::{absolute_url, http_client};
use crate::listing::Source;
use crate::scrape::types::{RawListing, SiteProvider};
use crate::scrape::{find_deadline_text, normalize_text};

const BASE_URL: &str = "https://kidoktorand.varbi.com/en/";
const SITE_ROOT: &str = "https://kidoktorand.varbi.com";

pub struct KiDoktorandProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl KiDoktorandProvider {
    pub fn from_url() -> Self {
        Self {
            mode: Mode::Http {
                url: BASE_URL.to_string(),
                client: http_client(30),
            },
        }
    }

    /// Parse a captured HTML page instead of fetching; used by tests.
    /// Fixture mode skips the per-posting detail fetch.
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    fn parse_listings(html: &str) -> Vec<RawListing> {
        static RE_ANCHOR: OnceCell<Regex> = OnceCell::new();
        let re_anchor = RE_ANCHOR.get_or_init(|| {
            Regex::new(r#"(?is)<a\b[^>]*href\s*=\s*"([^"]*/what:job/jobID:\d+[^"]*)"[^>]*>(.*?)</a>"#)
                .expect("doktorand anchor regex")
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

            let title = normalize_text(inner.as_str());
            if title.is_empty() {
                continue;
            }

            out.push(RawListing {
                key: Some(key),
                title: Some(title),
                url: Some(absolute_url(SITE_ROOT, href.as_str())),
                deadline: None,
                description: String::new(),
            });
        }

        out
    }

    /// Fetch one posting's detail page and pull the deadline out of its
    /// text. Failures degrade to "no deadline", never to a source error.
    async fn fetch_deadline(client: &reqwest::Client, url: &str) -> Option<String> {
        let body = match client.get(url).send().await {
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => resp.text().await.ok()?,
                Err(e) => {
                    tracing::debug!(target: "scrape", url, error = ?e, "detail page non-2xx");
                    return None;
                }
            },
            Err(e) => {
                tracing::debug!(target: "scrape", url, error = ?e, "detail page fetch failed");
                return None;
            }
        };
        find_deadline_text(&normalize_text(&body))
    }
}

#[async_trait]
impl SiteProvider for KiDoktorandProvider {
    async fn fetch_listings(&self) -> Result<Vec<RawListing>> {
        match &self.mode {
            Mode::Fixture(s) => Ok(Self::parse_listings(s)),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("ki_doktorand http get")?
                    .error_for_status()
                    .context("ki_doktorand non-2xx")?
                    .text()
                    .await
                    .context("ki_doktorand body text")?;

                let mut listings = Self::parse_listings(&body);
                let detail_client = http_client(15);
                for listing in &mut listings {
                    if let Some(url) = listing.url.as_deref() {
                        listing.deadline = Self::fetch_deadline(&detail_client, url).await;
                    }
                }
                Ok(listings)
            }
        }
    }

    fn source(&self) -> Source {
        Source::KiDoktorand
    }
}
