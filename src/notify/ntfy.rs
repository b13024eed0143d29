// src/notify/ntfy.rs
//! ntfy.sh transport: one POST per alert, metadata in HTTP headers, body as
//! plain text. Bounded retry with exponential backoff.

use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;

use super::Notifier;
use crate::classify::{Classification, Priority};
use crate::listing::Listing;

const MAX_TITLE_CHARS: usize = 60;

pub struct NtfyNotifier {
    url: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl NtfyNotifier {
    pub fn new(topic: &str) -> Self {
        Self {
            url: format!("https://ntfy.sh/{topic}"),
            client: Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    /// Point at a different server (tests use a local listener).
    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Connectivity check, wired to `--test-notify`.
    pub async fn notify_test(&self) -> Result<()> {
        self.post(
            "This is a test notification from your KI job tracker.\n\nIf you see this, notifications are working!",
            &[
                ("Title", "KI Job Tracker - Test".to_string()),
                ("Tags", "white_check_mark,test_tube".to_string()),
                ("Priority", "low".to_string()),
            ],
        )
        .await
    }

    async fn post(&self, body: &str, headers: &[(&str, String)]) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let mut req = self
                .client
                .post(&self.url)
                .timeout(self.timeout)
                .body(body.to_string());
            for (name, value) in headers {
                req = req.header(*name, value.as_str());
            }

            match req.send().await {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1)))
                                .await;
                            continue;
                        }
                        return Err(anyhow!("ntfy HTTP error: {e}"));
                    }
                    return Ok(());
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                        continue;
                    }
                    return Err(anyhow!("ntfy request failed: {e}"));
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Notifier for NtfyNotifier {
    async fn notify_new(&self, listing: &Listing, classification: &Classification) -> Result<()> {
        let title = alert_title(&listing.title);

        let mut lines = Vec::new();
        if let Some(deadline) = &listing.deadline {
            lines.push(format!("Deadline: {deadline}"));
        }
        lines.push(format!("Source: {}", listing.source.display_name()));
        if !classification.matched_keywords.is_empty() {
            let tier = match classification.priority {
                Priority::High => "High priority",
                Priority::Medium => "Medium priority",
                Priority::None => "Matched",
            };
            lines.push(format!(
                "{tier}: {}",
                classification.matched_keywords.join(", ")
            ));
        }

        let priority = match classification.priority {
            Priority::High => "high",
            _ => "default",
        };

        self.post(
            &lines.join("\n"),
            &[
                ("Title", title),
                ("Click", listing.url.clone()),
                ("Tags", "briefcase,sweden".to_string()),
                ("Priority", priority.to_string()),
            ],
        )
        .await
    }

    async fn notify_summary(&self, new_count: usize, total_open: usize) -> Result<()> {
        let (title, body, priority) = if new_count == 0 {
            (
                "KI Jobs - Daily Check".to_string(),
                format!("No new matching positions today.\n\nTotal open matching positions: {total_open}"),
                "low",
            )
        } else {
            (
                format!("KI Jobs - {new_count} New Position(s)!"),
                format!("Found {new_count} new matching position(s)!\n\nTotal open matching positions: {total_open}"),
                "default",
            )
        };

        self.post(
            &body,
            &[
                ("Title", title),
                ("Tags", "clipboard".to_string()),
                ("Priority", priority.to_string()),
            ],
        )
        .await
    }
}

fn alert_title(job_title: &str) -> String {
    let short: String = job_title.chars().take(MAX_TITLE_CHARS).collect();
    let mut title = format!("New KI Position: {}", sanitize_header(&short));
    if job_title.chars().count() > MAX_TITLE_CHARS {
        title.push_str("...");
    }
    title
}

/// HTTP header values must be ASCII; fold typographic punctuation and drop
/// whatever remains.
fn sanitize_header(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            other => other,
        })
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_folds_typography_and_drops_non_ascii() {
        assert_eq!(
            sanitize_header("Postdoc \u{2013} \u{201C}iPSC\u{201D} lab, Solna\u{00e9}"),
            "Postdoc - \"iPSC\" lab, Solna"
        );
    }

    #[test]
    fn long_titles_are_truncated_with_ellipsis() {
        let long = "x".repeat(80);
        let t = alert_title(&long);
        assert!(t.ends_with("..."));
        assert_eq!(t, format!("New KI Position: {}...", "x".repeat(60)));
    }

    #[test]
    fn short_titles_stay_untouched() {
        assert_eq!(
            alert_title("PhD in neuroscience"),
            "New KI Position: PhD in neuroscience"
        );
    }
}
