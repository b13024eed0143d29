// src/scrape/types.rs
use anyhow::Result;

use crate::listing::Source;

/// Raw per-source record as extracted from a site's markup. Fields are
/// optional because extraction is best-effort; the normalizer decides what
/// is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListing {
    /// Source-local key (e.g. a Varbi jobID or a posting slug).
    pub key: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    /// Deadline text as found on the page, unparsed.
    pub deadline: Option<String>,
    pub description: String,
}

#[async_trait::async_trait]
pub trait SiteProvider: Send + Sync {
    /// Fetch and extract the source's current listings. An `Err` means the
    /// whole fetch failed; callers must then leave this source's previously
    /// seen ids untouched.
    async fn fetch_listings(&self) -> Result<Vec<RawListing>>;
    fn source(&self) -> Source;
}

/// Result of one source's fetch attempt, tagged with the success flag the
/// reconciler needs.
#[derive(Debug)]
pub struct SourceBatch {
    pub source: Source,
    pub success: bool,
    pub records: Vec<RawListing>,
}
