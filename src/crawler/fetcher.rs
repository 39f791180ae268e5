//! HTTP fetcher implementation
//!
//! Two client configurations back every crawl: a primary client carrying
//! the configured identifying headers, and a hardened client with a
//! browser profile and cookie store for hosts that block automated
//! clients. The fetch policy retries through the hardened path once when
//! the primary fetch comes back 403 — exactly 403; other blocking-ish
//! codes (429, 503) are recorded as-is.

use crate::config::CrawlConfig;
use crate::{ConfigError, CrawlError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

/// Status code that triggers the hardened fallback fetch
const BLOCKED_STATUS: u16 = 403;

/// User agent presented by the hardened client
pub const HARDENED_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// Result of a successful page fetch
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// HTTP status code (or the fixed rendered-page status)
    pub status_code: u16,

    /// Response body
    pub body: String,
}

/// Low-level transport: one primary fetch path and one hardened path
///
/// The hardened path must be usable when the primary fetch returns a
/// blocking status code.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> crate::Result<FetchedPage>;

    async fn fetch_hardened(&self, url: &str) -> crate::Result<FetchedPage>;
}

/// Page-level fetch seam used by the controller
///
/// Implementations decide how a URL becomes a body and a status code:
/// plain HTTP with the hardened fallback, or a rendered browser session.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> crate::Result<FetchedPage>;
}

/// Reqwest-backed transport with primary and hardened clients
#[derive(Debug)]
pub struct HttpTransport {
    primary: Client,
    hardened: Client,
}

impl HttpTransport {
    /// Builds both clients from the crawl configuration
    ///
    /// Header-set problems are configuration errors and fatal to the
    /// run.
    pub fn new(config: &CrawlConfig) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::try_from(name.as_str()).map_err(|e| {
                ConfigError::Validation(format!("invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::try_from(value.as_str()).map_err(|e| {
                ConfigError::Validation(format!("invalid header value for '{}': {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let primary = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| CrawlError::Http {
                url: config.url.to_string(),
                source: e,
            })?;

        let mut browser_headers = HeaderMap::new();
        browser_headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        browser_headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let hardened = Client::builder()
            .user_agent(HARDENED_USER_AGENT)
            .default_headers(browser_headers)
            .cookie_store(true)
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| CrawlError::Http {
                url: config.url.to_string(),
                source: e,
            })?;

        Ok(Self { primary, hardened })
    }
}

/// Sends one GET and reads the body, classifying reqwest errors
async fn send(client: &Client, url: &str) -> crate::Result<FetchedPage> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status_code = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| classify_error(url, e))?;

    Ok(FetchedPage { status_code, body })
}

fn classify_error(url: &str, error: reqwest::Error) -> CrawlError {
    if error.is_timeout() {
        CrawlError::Timeout {
            url: url.to_string(),
        }
    } else {
        CrawlError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> crate::Result<FetchedPage> {
        send(&self.primary, url).await
    }

    async fn fetch_hardened(&self, url: &str) -> crate::Result<FetchedPage> {
        send(&self.hardened, url).await
    }
}

/// Plain-HTTP page fetcher with the 403 fallback policy
pub struct HttpFetcher<T: Transport> {
    transport: T,
}

impl<T: Transport> HttpFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: Transport> PageFetcher for HttpFetcher<T> {
    async fn fetch_page(&self, url: &str) -> crate::Result<FetchedPage> {
        let page = self.transport.fetch(url).await?;

        if page.status_code == BLOCKED_STATUS {
            tracing::debug!("Blocked response ({}) for {}, retrying hardened", page.status_code, url);
            return self.transport.fetch_hardened(url).await;
        }

        Ok(page)
    }
}
