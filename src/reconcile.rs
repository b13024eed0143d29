// src/reconcile.rs
//! State reconciler: derives the new tracked state and the new-arrivals set
//! from a fresh scrape plus prior state.
//!
//! Seen-state tracks "currently open AND relevant", not "ever seen": a
//! listing expires by vanishing from a successful fresh scrape, so no
//! closing-date comparison is needed. Sources whose fetch failed this run
//! keep their prior ids untouched — a transient failure on one site must
//! never read as mass expiry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::listing::{Listing, Source};

/// Persisted singleton tracking relevant listing ids plus user-curated tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenState {
    #[serde(default)]
    pub seen_ids: BTreeSet<String>,
    #[serde(default)]
    pub applied_ids: BTreeSet<String>,
    #[serde(default)]
    pub irrelevant_ids: BTreeSet<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl SeenState {
    pub fn mark_applied(&mut self, id: &str) {
        self.applied_ids.insert(id.to_string());
    }

    pub fn mark_irrelevant(&mut self, id: &str) {
        self.irrelevant_ids.insert(id.to_string());
    }

    pub fn clear_tags(&mut self, id: &str) {
        self.applied_ids.remove(id);
        self.irrelevant_ids.remove(id);
    }
}

/// What happens to `applied_ids`/`irrelevant_ids` when a listing expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRetention {
    /// Tags live only while the listing is still tracked (default).
    WhileOpen,
    /// Tags survive expiry; user decisions are never auto-removed.
    KeepHistory,
}

impl std::str::FromStr for TagRetention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "while-open" | "while_open" => Ok(TagRetention::WhileOpen),
            "keep-history" | "keep_history" => Ok(TagRetention::KeepHistory),
            other => Err(format!(
                "unknown tag retention {other:?} (expected \"while-open\" or \"keep-history\")"
            )),
        }
    }
}

/// One source's contribution to a run. `listings` holds only relevant
/// (classified medium/high) listings; `success: false` means the fetch
/// failed and `listings` is empty by construction.
#[derive(Debug, Clone)]
pub struct SourceScrape {
    pub source: Source,
    pub success: bool,
    pub listings: Vec<Listing>,
}

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub state: SeenState,
    /// Relevant listings not present in the previous seen set, deduplicated
    /// by id, in scrape order.
    pub newly_appeared: Vec<Listing>,
    /// Previously tracked ids dropped because their source scraped cleanly
    /// without them.
    pub expired: usize,
}

/// Pure in-memory reconciliation over already-validated data; cannot fail.
/// Correctness depends on callers supplying accurate per-source success
/// flags.
pub fn reconcile(
    previous: &SeenState,
    scrapes: &[SourceScrape],
    retention: TagRetention,
    now: DateTime<Utc>,
) -> ReconcileOutcome {
    let succeeded: BTreeSet<&str> = scrapes
        .iter()
        .filter(|s| s.success)
        .map(|s| s.source.key())
        .collect();

    let mut seen_ids: BTreeSet<String> = BTreeSet::new();
    let mut newly_appeared: Vec<Listing> = Vec::new();

    for scrape in scrapes.iter().filter(|s| s.success) {
        for listing in &scrape.listings {
            if seen_ids.insert(listing.id.clone()) && !previous.seen_ids.contains(&listing.id) {
                newly_appeared.push(listing.clone());
            }
        }
    }

    // Ids from failed (or no longer configured) sources are carried over
    // unchanged; only a successful scrape may expire its own ids.
    let mut expired = 0usize;
    for id in &previous.seen_ids {
        if succeeded.contains(source_prefix(id)) {
            if !seen_ids.contains(id) {
                expired += 1;
            }
        } else {
            seen_ids.insert(id.clone());
        }
    }

    let (applied_ids, irrelevant_ids) = match retention {
        TagRetention::WhileOpen => (
            intersect(&previous.applied_ids, &seen_ids),
            intersect(&previous.irrelevant_ids, &seen_ids),
        ),
        TagRetention::KeepHistory => (
            previous.applied_ids.clone(),
            previous.irrelevant_ids.clone(),
        ),
    };

    ReconcileOutcome {
        state: SeenState {
            seen_ids,
            applied_ids,
            irrelevant_ids,
            last_updated: Some(now),
        },
        newly_appeared,
        expired,
    }
}

fn source_prefix(id: &str) -> &str {
    id.split(':').next().unwrap_or(id)
}

fn intersect(tags: &BTreeSet<String>, keep: &BTreeSet<String>) -> BTreeSet<String> {
    tags.iter().filter(|id| keep.contains(*id)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(source: Source, key: &str) -> Listing {
        Listing {
            id: format!("{}:{key}", source.key()),
            source,
            title: format!("Listing {key}"),
            url: format!("https://example.org/{key}"),
            deadline: None,
            closing_date: None,
            raw_text: String::new(),
        }
    }

    fn state(ids: &[&str]) -> SeenState {
        SeenState {
            seen_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..SeenState::default()
        }
    }

    fn ok_scrape(source: Source, keys: &[&str]) -> SourceScrape {
        SourceScrape {
            source,
            success: true,
            listings: keys.iter().map(|k| listing(source, k)).collect(),
        }
    }

    fn failed_scrape(source: Source) -> SourceScrape {
        SourceScrape {
            source,
            success: false,
            listings: Vec::new(),
        }
    }

    #[test]
    fn new_listing_appears_and_expired_one_drops() {
        let prev = state(&["ki_varbi:1", "ki_varbi:2"]);
        let scrapes = [ok_scrape(Source::KiVarbi, &["2", "3"])];
        let out = reconcile(&prev, &scrapes, TagRetention::WhileOpen, Utc::now());

        let ids: Vec<&str> = out.newly_appeared.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["ki_varbi:3"]);
        let expected: BTreeSet<String> = ["ki_varbi:2", "ki_varbi:3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(out.state.seen_ids, expected);
        assert_eq!(out.expired, 1);
    }

    #[test]
    fn second_run_is_idempotent() {
        let prev = SeenState::default();
        let scrapes = [ok_scrape(Source::KiDoktorand, &["10", "11"])];
        let first = reconcile(&prev, &scrapes, TagRetention::WhileOpen, Utc::now());
        assert_eq!(first.newly_appeared.len(), 2);

        let second = reconcile(&first.state, &scrapes, TagRetention::WhileOpen, Utc::now());
        assert!(second.newly_appeared.is_empty());
        assert_eq!(second.state.seen_ids, first.state.seen_ids);
    }

    #[test]
    fn failed_source_ids_are_carried_over() {
        let prev = state(&["ki_doktorand:7", "ki_varbi:8"]);
        let scrapes = [
            failed_scrape(Source::KiDoktorand),
            ok_scrape(Source::KiVarbi, &[]),
        ];
        let out = reconcile(&prev, &scrapes, TagRetention::WhileOpen, Utc::now());

        assert!(out.state.seen_ids.contains("ki_doktorand:7"));
        assert!(!out.state.seen_ids.contains("ki_varbi:8"));
        assert!(out.newly_appeared.is_empty());
        assert_eq!(out.expired, 1);
    }

    #[test]
    fn duplicate_ids_within_a_run_appear_once() {
        let prev = SeenState::default();
        let scrapes = [ok_scrape(Source::KiVarbi, &["5", "5"])];
        let out = reconcile(&prev, &scrapes, TagRetention::WhileOpen, Utc::now());
        assert_eq!(out.newly_appeared.len(), 1);
    }

    #[test]
    fn while_open_retention_drops_tags_on_expiry() {
        let mut prev = state(&["ki_varbi:2"]);
        prev.mark_applied("ki_varbi:2");
        let scrapes = [ok_scrape(Source::KiVarbi, &[])];
        let out = reconcile(&prev, &scrapes, TagRetention::WhileOpen, Utc::now());
        assert!(out.state.applied_ids.is_empty());
    }

    #[test]
    fn keep_history_retention_preserves_tags_across_expiry() {
        let mut prev = state(&["ki_varbi:2"]);
        prev.mark_applied("ki_varbi:2");
        prev.mark_irrelevant("ki_varbi:9");
        let scrapes = [ok_scrape(Source::KiVarbi, &[])];
        let out = reconcile(&prev, &scrapes, TagRetention::KeepHistory, Utc::now());
        assert!(out.state.applied_ids.contains("ki_varbi:2"));
        assert!(out.state.irrelevant_ids.contains("ki_varbi:9"));
    }

    #[test]
    fn irrelevant_but_still_open_listing_stays_seen() {
        let mut prev = state(&["ki_varbi:3"]);
        prev.mark_irrelevant("ki_varbi:3");
        let scrapes = [ok_scrape(Source::KiVarbi, &["3"])];
        let out = reconcile(&prev, &scrapes, TagRetention::WhileOpen, Utc::now());
        assert!(out.state.seen_ids.contains("ki_varbi:3"));
        assert!(out.state.irrelevant_ids.contains("ki_varbi:3"));
    }
}
