// src/pipeline.rs
//! Orchestrator for one tracker run: scrape → normalize → classify →
//! reconcile → notify → render → persist.
//!
//! The run is atomic with respect to state: nothing is written until the
//! pipeline reaches the end, and the previous state file stays authoritative
//! if anything before persistence blows up.

use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeSet;

use crate::classify;
use crate::config::AppConfig;
use crate::dashboard::{self, DashboardEntry};
use crate::listing::Source;
use crate::normalize;
use crate::notify::Notifier;
use crate::reconcile::{reconcile, SourceScrape};
use crate::scrape::{self, types::SiteProvider};
use crate::state;

#[derive(Debug, Default)]
pub struct RunSummary {
    pub scraped: usize,
    pub relevant: usize,
    pub newly_appeared: usize,
    pub notified: usize,
    pub expired: usize,
    pub failed_sources: Vec<Source>,
}

pub async fn run_once(
    cfg: &AppConfig,
    providers: &[Box<dyn SiteProvider>],
    notifier: &dyn Notifier,
) -> Result<RunSummary> {
    let previous = state::load_state(&cfg.state_path)?;
    tracing::info!(
        target: "pipeline",
        tracked = previous.seen_ids.len(),
        "run starting"
    );

    let batches = scrape::fetch_all(providers, cfg.fetch_retries).await;
    let scraped: usize = batches.iter().map(|b| b.records.len()).sum();
    let failed_sources: Vec<Source> = batches
        .iter()
        .filter(|b| !b.success)
        .map(|b| b.source)
        .collect();

    // Normalize and classify per source; only relevant listings go further.
    let mut scrapes: Vec<SourceScrape> = Vec::with_capacity(batches.len());
    let mut open_entries: Vec<DashboardEntry> = Vec::new();
    let mut entry_ids: BTreeSet<String> = BTreeSet::new();
    for batch in &batches {
        let mut relevant = Vec::new();
        for listing in normalize::normalize_batch(&batch.records, batch.source) {
            let classification = classify::classify(&listing.raw_text, &cfg.keywords);
            if !classification.is_relevant() {
                continue;
            }
            if entry_ids.insert(listing.id.clone()) {
                open_entries.push(DashboardEntry {
                    listing: listing.clone(),
                    classification,
                });
            }
            relevant.push(listing);
        }
        scrapes.push(SourceScrape {
            source: batch.source,
            success: batch.success,
            listings: relevant,
        });
    }
    let relevant = open_entries.len();

    let now = Utc::now();
    let outcome = reconcile(&previous, &scrapes, cfg.tag_retention, now);

    // Push notifications are best-effort; a transport failure is logged and
    // must not stop rendering or persistence.
    let mut notified = 0usize;
    for listing in &outcome.newly_appeared {
        let classification = classify::classify(&listing.raw_text, &cfg.keywords);
        tracing::info!(
            target: "pipeline",
            id = %listing.id,
            title = %listing.title,
            keywords = ?classification.matched_keywords,
            "new matching listing"
        );
        match notifier.notify_new(listing, &classification).await {
            Ok(()) => notified += 1,
            Err(e) => {
                tracing::warn!(target: "notify", id = %listing.id, error = ?e, "notification failed");
            }
        }
    }

    // Dashboard shows the open set: current relevant listings minus the
    // user's irrelevant tags.
    open_entries.retain(|e| !outcome.state.irrelevant_ids.contains(&e.listing.id));
    let today = now.date_naive();
    let html = dashboard::render(
        &open_entries,
        today,
        &now.format("%Y-%m-%d %H:%M UTC").to_string(),
    );
    if let Err(e) = dashboard::write_dashboard(&cfg.dashboard_path, &html) {
        tracing::error!(target: "dashboard", error = ?e, "dashboard write failed");
    }

    // The one fatal step: prior state must survive unless this succeeds.
    state::save_state(&cfg.state_path, &outcome.state)?;

    let summary = RunSummary {
        scraped,
        relevant,
        newly_appeared: outcome.newly_appeared.len(),
        notified,
        expired: outcome.expired,
        failed_sources,
    };
    tracing::info!(
        target: "pipeline",
        scraped = summary.scraped,
        relevant = summary.relevant,
        new = summary.newly_appeared,
        notified = summary.notified,
        expired = summary.expired,
        failed_sources = ?summary.failed_sources,
        "run complete"
    );
    Ok(summary)
}
