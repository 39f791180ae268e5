//! Traversal controller - the crawl loop
//!
//! The controller owns the visited set and the ordered result list, and
//! drives fetch -> extract -> discover-links over an explicit work stack
//! of `(url, depth)` entries. Children are pushed in reverse document
//! order, so the pop order is exactly the pre-order sequence of the
//! equivalent depth-first recursion, without recursion-depth limits.
//!
//! Failure is local: any error while visiting one URL becomes a failed
//! result record and the remaining work is unaffected.

use crate::config::CrawlConfig;
use crate::crawler::links::discover_links;
use crate::crawler::{CrawlResult, PageFetcher};
use crate::extract::ExtractionStrategy;
use scraper::Html;
use std::collections::HashSet;
use url::Url;

/// Fixed ceiling on links followed per page, regardless of remaining
/// page budget
pub const MAX_LINKS_PER_PAGE: usize = 5;

/// The crawl engine: visited set, result list, and traversal state
pub struct Crawler<F: PageFetcher> {
    config: CrawlConfig,
    strategy: ExtractionStrategy,
    fetcher: F,
    visited: HashSet<String>,
    results: Vec<CrawlResult>,
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(config: CrawlConfig, strategy: ExtractionStrategy, fetcher: F) -> Self {
        Self {
            config,
            strategy,
            fetcher,
            visited: HashSet::new(),
            results: Vec::new(),
        }
    }

    /// Runs the crawl to completion, returning one result per visited
    /// URL in strict visitation order
    pub async fn run(mut self) -> Vec<CrawlResult> {
        let origin = self.config.url.to_string();
        tracing::info!("Starting crawl from {}", origin);

        let mut stack: Vec<(String, u32)> = vec![(origin, 0)];

        while let Some((url, depth)) = stack.pop() {
            // Budgets are checked before any side-effecting work.
            if depth > self.config.max_depth || self.results.len() >= self.config.max_pages {
                continue;
            }

            // At most one fetch per URL per run, whatever path led here.
            if self.visited.contains(&url) {
                continue;
            }
            self.visited.insert(url.clone());

            tokio::time::sleep(self.config.delay).await;

            match self.visit(&url, depth).await {
                Ok(result) => {
                    let followups: Vec<String> = result
                        .links
                        .as_deref()
                        .unwrap_or_default()
                        .iter()
                        .take(MAX_LINKS_PER_PAGE)
                        .cloned()
                        .collect();

                    self.results.push(result);

                    for link in followups.into_iter().rev() {
                        stack.push((link, depth + 1));
                    }
                }
                Err(error) => {
                    tracing::warn!("Visit failed for {}: {}", url, error);
                    self.results.push(CrawlResult::failed(url, error.to_string()));
                }
            }
        }

        tracing::info!(
            "Crawl finished: {} pages, {} failed",
            self.results.len(),
            self.results.iter().filter(|r| r.error.is_some()).count()
        );

        self.results
    }

    /// Visits a single URL: fetch, parse, extract, discover
    async fn visit(&self, url: &str, depth: u32) -> crate::Result<CrawlResult> {
        tracing::debug!("Fetching {} (depth {})", url, depth);

        let page = self.fetcher.fetch_page(url).await?;
        let document = Html::parse_document(&page.body);

        let data = self.strategy.extract(&document, url);

        let links = if self.config.follow_links && depth < self.config.max_depth {
            let base_url = Url::parse(url)?;
            Some(discover_links(&document, &base_url, &self.visited))
        } else {
            None
        };

        Ok(CrawlResult {
            url: url.to_string(),
            status_code: page.status_code,
            data,
            links,
            error: None,
        })
    }
}
