// src/scheduler.rs
//! Interval mode: re-run the pipeline on a fixed tokio ticker. One failed
//! run is logged and the loop keeps going; only the process supervisor
//! decides when to stop.

use std::time::Duration;

use crate::config::AppConfig;
use crate::notify::Notifier;
use crate::pipeline;
use crate::scrape::types::SiteProvider;

pub async fn run_interval(
    cfg: &AppConfig,
    providers: &[Box<dyn SiteProvider>],
    notifier: &dyn Notifier,
    interval_secs: u64,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        ticker.tick().await;
        match pipeline::run_once(cfg, providers, notifier).await {
            Ok(summary) => {
                tracing::info!(
                    target: "scheduler",
                    new = summary.newly_appeared,
                    notified = summary.notified,
                    "scheduled run finished"
                );
            }
            Err(e) => {
                tracing::error!(target: "scheduler", error = ?e, "scheduled run failed");
            }
        }
    }
}
