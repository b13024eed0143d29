//! KI Job Tracker — Binary Entrypoint
//! One-shot by default (cron friendly); loops when an interval is
//! configured. A few maintenance flags manage the user-curated tags.

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ki_job_tracker::config::AppConfig;
use ki_job_tracker::notify::ntfy::NtfyNotifier;
use ki_job_tracker::scrape::providers::academic_positions::AcademicPositionsProvider;
use ki_job_tracker::scrape::providers::ki_doktorand::KiDoktorandProvider;
use ki_job_tracker::scrape::providers::ki_varbi::KiVarbiProvider;
use ki_job_tracker::scrape::types::SiteProvider;
use ki_job_tracker::{pipeline, scheduler, state};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn build_providers() -> Vec<Box<dyn SiteProvider>> {
    vec![
        Box::new(KiDoktorandProvider::from_url()),
        Box::new(KiVarbiProvider::from_url()),
        Box::new(AcademicPositionsProvider::from_url()),
    ]
}

enum TagAction {
    Applied,
    Irrelevant,
    Clear,
}

fn tag_command(cfg: &AppConfig, id: Option<&String>, action: TagAction) -> Result<()> {
    let id = id.context("missing listing id argument")?;
    let mut st = state::load_state(&cfg.state_path)?;
    if !st.seen_ids.contains(id) {
        tracing::warn!(target: "state", id = %id, "id is not currently tracked");
    }
    match action {
        TagAction::Applied => st.mark_applied(id),
        TagAction::Irrelevant => st.mark_irrelevant(id),
        TagAction::Clear => st.clear_tags(id),
    }
    state::save_state(&cfg.state_path, &st)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut send_summary = false;
    match args.first().map(String::as_str) {
        Some("--test-notify") => {
            NtfyNotifier::new(&cfg.ntfy_topic).notify_test().await?;
            tracing::info!("test notification sent, check your phone");
            return Ok(());
        }
        Some("--mark-applied") => return tag_command(&cfg, args.get(1), TagAction::Applied),
        Some("--mark-irrelevant") => return tag_command(&cfg, args.get(1), TagAction::Irrelevant),
        Some("--clear-tag") => return tag_command(&cfg, args.get(1), TagAction::Clear),
        Some("--summary") => send_summary = true,
        Some(other) => bail!("unknown argument {other:?}"),
        None => {}
    }

    let providers = build_providers();
    let notifier = NtfyNotifier::new(&cfg.ntfy_topic);

    if let Some(secs) = cfg.interval_secs {
        tracing::info!(interval_secs = secs, "running on an interval");
        scheduler::run_interval(&cfg, &providers, &notifier, secs).await;
        return Ok(());
    }

    let summary = pipeline::run_once(&cfg, &providers, &notifier).await?;
    if send_summary {
        use ki_job_tracker::notify::Notifier as _;
        if let Err(e) = notifier
            .notify_summary(summary.newly_appeared, summary.relevant)
            .await
        {
            tracing::warn!(error = ?e, "summary notification failed");
        }
    }
    Ok(())
}
