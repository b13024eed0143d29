// tests/reconcile_state.rs
// Reconciliation scenarios across the public API: expiry, idempotence,
// per-source failure isolation, and the tag-retention policy choice.

use chrono::Utc;
use ki_job_tracker::{reconcile, Listing, SeenState, Source, SourceScrape, TagRetention};

fn listing(source: Source, key: &str, title: &str) -> Listing {
    Listing {
        id: format!("{}:{key}", source.key()),
        source,
        title: title.to_string(),
        url: format!("https://example.org/{key}"),
        deadline: None,
        closing_date: None,
        raw_text: title.to_string(),
    }
}

fn scrape_ok(source: Source, listings: Vec<Listing>) -> SourceScrape {
    SourceScrape {
        source,
        success: true,
        listings,
    }
}

#[test]
fn open_and_relevant_tracking_replaces_the_seen_set() {
    let mut prev = SeenState::default();
    prev.seen_ids.insert("ki_doktorand:1".into());
    prev.seen_ids.insert("ki_doktorand:2".into());

    let scrapes = [scrape_ok(
        Source::KiDoktorand,
        vec![
            listing(Source::KiDoktorand, "2", "Still open"),
            listing(Source::KiDoktorand, "3", "Brand new"),
        ],
    )];
    let out = reconcile(&prev, &scrapes, TagRetention::WhileOpen, Utc::now());

    assert_eq!(out.newly_appeared.len(), 1);
    assert_eq!(out.newly_appeared[0].id, "ki_doktorand:3");
    assert!(out.state.seen_ids.contains("ki_doktorand:2"));
    assert!(out.state.seen_ids.contains("ki_doktorand:3"));
    assert!(!out.state.seen_ids.contains("ki_doktorand:1"));
}

#[test]
fn applying_the_output_again_yields_no_new_arrivals() {
    let scrapes = [scrape_ok(
        Source::AcademicPositions,
        vec![listing(Source::AcademicPositions, "42", "Organoid PhD")],
    )];
    let first = reconcile(
        &SeenState::default(),
        &scrapes,
        TagRetention::WhileOpen,
        Utc::now(),
    );
    let second = reconcile(&first.state, &scrapes, TagRetention::WhileOpen, Utc::now());
    assert!(second.newly_appeared.is_empty());
}

#[test]
fn one_failing_source_never_expires_another() {
    let mut prev = SeenState::default();
    prev.seen_ids.insert("ki_doktorand:7".into());
    prev.seen_ids.insert("ki_varbi:8".into());

    let scrapes = [
        SourceScrape {
            source: Source::KiDoktorand,
            success: false,
            listings: Vec::new(),
        },
        scrape_ok(Source::KiVarbi, Vec::new()),
    ];
    let out = reconcile(&prev, &scrapes, TagRetention::WhileOpen, Utc::now());

    // The failed source keeps its id; the clean-but-empty one expires.
    assert!(out.state.seen_ids.contains("ki_doktorand:7"));
    assert!(!out.state.seen_ids.contains("ki_varbi:8"));
}

#[test]
fn retention_policy_decides_tag_fate_on_expiry() {
    let mut prev = SeenState::default();
    prev.seen_ids.insert("ki_varbi:2".into());
    prev.mark_applied("ki_varbi:2");

    let gone = [scrape_ok(Source::KiVarbi, Vec::new())];

    let dropped = reconcile(&prev, &gone, TagRetention::WhileOpen, Utc::now());
    assert!(dropped.state.applied_ids.is_empty());

    let kept = reconcile(&prev, &gone, TagRetention::KeepHistory, Utc::now());
    assert_eq!(kept.state.applied_ids, prev.applied_ids);
}

#[test]
fn last_updated_is_stamped_by_reconciliation() {
    let now = Utc::now();
    let out = reconcile(&SeenState::default(), &[], TagRetention::WhileOpen, now);
    assert_eq!(out.state.last_updated, Some(now));
}
