// src/notify/mod.rs
pub mod ntfy;

use anyhow::Result;

use crate::classify::Classification;
use crate::listing::Listing;

/// Push-notification transport. Fire-and-forget from the pipeline's point
/// of view: failures are logged by the caller and never block persistence.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_new(&self, listing: &Listing, classification: &Classification) -> Result<()>;

    /// Daily-style summary ("N new, M open").
    async fn notify_summary(&self, new_count: usize, total_open: usize) -> Result<()>;
}
