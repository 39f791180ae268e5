//! Crawl report generation
//!
//! The ordered result list is the run's sole artifact; the report wraps
//! it with a timestamp and success/failure counts and serializes the
//! whole thing as JSON, to a file or stdout.

use crate::crawler::CrawlResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// The serialized output of one crawl run
#[derive(Debug, Serialize)]
pub struct CrawlReport {
    /// When the report was generated
    pub generated_at: DateTime<Utc>,

    /// Number of result records (successes and failures)
    pub pages_crawled: usize,

    /// Number of failed records
    pub failures: usize,

    /// Results in strict visitation order
    pub results: Vec<CrawlResult>,
}

impl CrawlReport {
    pub fn new(results: Vec<CrawlResult>) -> Self {
        let failures = results.iter().filter(|r| r.error.is_some()).count();
        Self {
            generated_at: Utc::now(),
            pages_crawled: results.len(),
            failures,
            results,
        }
    }
}

/// Writes the report as pretty JSON to the given path, or stdout when no
/// path is given
pub fn write_report(report: &CrawlReport, path: Option<&Path>) -> crate::Result<()> {
    match path {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            serde_json::to_writer_pretty(file, report)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, report)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}
