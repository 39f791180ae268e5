use crate::extract::selector::RawInstruction;
use crate::render::RenderConfig;
use crate::ConfigError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use url::Url;

/// A complete crawl job as read from a job file
#[derive(Debug, Clone, Deserialize)]
pub struct JobSpec {
    /// Origin URL the crawl starts from
    pub url: String,

    /// Extraction strategy name: generic, product, article, or selector
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Field -> instruction map for the selector strategy
    #[serde(default)]
    pub selectors: BTreeMap<String, RawInstruction>,

    /// Crawl behavior settings
    #[serde(default)]
    pub config: CrawlSettings,

    /// Render configuration for script-executed pages
    #[serde(default)]
    pub render: Option<RenderConfig>,
}

/// Crawl behavior settings, all defaulted
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// Maximum link depth from the origin URL
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of result records for the run
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Pause before each request, in seconds
    #[serde(default = "default_delay")]
    pub delay: f64,

    /// Whether discovered same-host links are scheduled
    #[serde(default)]
    pub follow_links: bool,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout, in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Extra request headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            delay: default_delay(),
            follow_links: false,
            user_agent: default_user_agent(),
            timeout: default_timeout(),
            headers: HashMap::new(),
        }
    }
}

fn default_strategy() -> String {
    "generic".to_string()
}

fn default_max_depth() -> u32 {
    1
}

fn default_max_pages() -> usize {
    10
}

fn default_delay() -> f64 {
    1.0
}

fn default_user_agent() -> String {
    concat!("pagesift/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_timeout() -> u64 {
    10
}

/// Validated, immutable per-run crawl configuration
///
/// The depth and page ceilings are hard limits: the controller checks them
/// before any side-effecting fetch.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub url: Url,
    pub max_depth: u32,
    pub max_pages: usize,
    pub delay: Duration,
    pub follow_links: bool,
    pub user_agent: String,
    pub timeout: Duration,
    pub headers: HashMap<String, String>,
}

impl JobSpec {
    /// Builds the validated runtime configuration for this job
    pub fn to_crawl_config(&self) -> Result<CrawlConfig, ConfigError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", self.url, e)))?;

        Ok(CrawlConfig {
            url,
            max_depth: self.config.max_depth,
            max_pages: self.config.max_pages,
            delay: Duration::from_secs_f64(self.config.delay),
            follow_links: self.config.follow_links,
            user_agent: self.config.user_agent.clone(),
            timeout: Duration::from_secs(self.config.timeout),
            headers: self.config.headers.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with_settings(settings: CrawlSettings) -> JobSpec {
        JobSpec {
            url: "https://example.com/".to_string(),
            strategy: "generic".to_string(),
            selectors: BTreeMap::new(),
            config: settings,
            render: None,
        }
    }

    #[test]
    fn test_to_crawl_config() {
        let job = job_with_settings(CrawlSettings {
            max_depth: 3,
            delay: 0.25,
            ..CrawlSettings::default()
        });

        let config = job.to_crawl_config().unwrap();
        assert_eq!(config.url.as_str(), "https://example.com/");
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.delay, Duration::from_millis(250));
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut job = job_with_settings(CrawlSettings::default());
        job.url = "not a url".to_string();
        assert!(matches!(
            job.to_crawl_config().unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }
}
