//! Crawler module for web page fetching and traversal
//!
//! This module contains the core crawling logic:
//! - HTTP fetching with the hardened anti-bot fallback
//! - Same-host link discovery
//! - The traversal controller driving fetch -> extract -> discover

mod controller;
mod fetcher;
mod links;

pub use controller::{Crawler, MAX_LINKS_PER_PAGE};
pub use fetcher::{
    FetchedPage, HttpFetcher, HttpTransport, PageFetcher, Transport, HARDENED_USER_AGENT,
};
pub use links::discover_links;

use crate::config::CrawlConfig;
use crate::extract::{ExtractionStrategy, FieldMap};
use serde::{Deserialize, Serialize};

/// One record per visited URL, success or failure
///
/// Results are immutable once appended; the ordered result list is the
/// run's sole output artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    /// The URL this record describes
    pub url: String,

    /// HTTP status code; 0 is reserved for "failed before a status
    /// existed"
    pub status_code: u16,

    /// Extracted field map (empty on failure)
    pub data: FieldMap,

    /// Discovered outbound links; `None` when link discovery did not run
    pub links: Option<Vec<String>>,

    /// Error description, present iff `status_code` is 0
    pub error: Option<String>,
}

impl CrawlResult {
    /// A record for a URL whose visit failed before any status existed
    pub fn failed(url: String, error: String) -> Self {
        Self {
            url,
            status_code: 0,
            data: FieldMap::new(),
            links: None,
            error: Some(error),
        }
    }
}

/// Runs a complete crawl over plain HTTP
///
/// Builds the transport from the configuration and drives the controller
/// to completion. Per-URL failures are folded into the result list, so
/// the only error here is transport construction.
pub async fn crawl(
    config: CrawlConfig,
    strategy: ExtractionStrategy,
) -> crate::Result<Vec<CrawlResult>> {
    let transport = HttpTransport::new(&config)?;
    let crawler = Crawler::new(config, strategy, HttpFetcher::new(transport));
    Ok(crawler.run().await)
}
