//! Render collaborator for script-executed pages
//!
//! Pages that only take shape after JavaScript runs are fetched through a
//! live browser session instead of the plain HTTP transport. The backend
//! itself (WebDriver, CDP, ...) is an external collaborator: this module
//! defines the session contract and the [`RenderFetcher`] adapter that
//! makes a renderer a drop-in replacement for the HTTP fetch step.
//!
//! A successful render reports the fixed status 200 - no real HTTP status
//! is available from a browser session - and the hardened-fetch fallback
//! does not apply on this path.

use crate::crawler::{FetchedPage, PageFetcher};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Status code reported for successfully rendered pages
pub const RENDERED_STATUS: u16 = 200;

/// Render configuration carried by a job
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// How long to let the page settle before the first snapshot
    #[serde(default)]
    pub wait: Option<WaitSpec>,

    /// Actions performed against the live session, in order
    #[serde(default)]
    pub actions: Vec<RenderAction>,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,
}

fn default_headless() -> bool {
    true
}

/// Wait strategy applied after navigation
///
/// Timeout expiry is never an error: the session proceeds with whatever
/// has loaded.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WaitSpec {
    /// Fixed pause in seconds
    Time { value: f64 },

    /// Poll until an element matching the selector exists
    Element {
        value: String,
        #[serde(default = "default_wait_timeout")]
        timeout: f64,
    },

    /// Poll until a script predicate returns true
    Script {
        value: String,
        #[serde(default = "default_wait_timeout")]
        timeout: f64,
    },

    /// Fixed idle pause once navigation settles
    NetworkIdle { value: f64 },
}

fn default_wait_timeout() -> f64 {
    10.0
}

/// One action against the live session
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderAction {
    /// Click the first element matching the selector
    Click { selector: String },

    /// Scroll to the bottom repeatedly, for infinite-scroll pages
    Scroll {
        #[serde(default = "default_pause_time")]
        pause_time: f64,
        #[serde(default = "default_max_scrolls")]
        max_scrolls: u32,
    },

    /// Run a script in the page
    Script { code: String },

    /// Pause between actions
    Wait {
        #[serde(default = "default_wait_seconds")]
        seconds: f64,
    },
}

fn default_pause_time() -> f64 {
    1.0
}

fn default_max_scrolls() -> u32 {
    10
}

fn default_wait_seconds() -> f64 {
    1.0
}

/// Factory for render sessions
///
/// One session is acquired per page visit and released before the
/// controller proceeds to the next candidate, on every path.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn open(&self, headless: bool) -> crate::Result<Box<dyn RenderSession>>;
}

/// A live browser session
#[async_trait]
pub trait RenderSession: Send {
    /// Navigates to the URL, applies the wait strategy, and returns the
    /// page markup as currently loaded
    async fn render(&mut self, url: &str, wait: Option<&WaitSpec>) -> crate::Result<String>;

    /// Runs a script in the page
    async fn run_script(&mut self, code: &str) -> crate::Result<()>;

    /// Clicks the first element matching the selector; backends log a
    /// warning and continue when nothing becomes clickable in time
    async fn click(&mut self, selector: &str) -> crate::Result<()>;

    /// Scrolls to the bottom up to `max_scroll_steps` times, stopping
    /// early once the document height stabilizes between two scrolls
    async fn scroll_to_bottom(
        &mut self,
        pause: Duration,
        max_scroll_steps: u32,
    ) -> crate::Result<()>;

    /// Current page markup
    async fn page_source(&mut self) -> crate::Result<String>;

    /// Releases the session
    async fn close(&mut self) -> crate::Result<()>;
}

/// Page fetcher backed by a renderer
///
/// Drop-in replacement for the HTTP fetch step: one session per visit,
/// render, run the configured actions, take the final page source.
pub struct RenderFetcher<R: Renderer> {
    renderer: R,
    config: RenderConfig,
}

impl<R: Renderer> RenderFetcher<R> {
    pub fn new(renderer: R, config: RenderConfig) -> Self {
        Self { renderer, config }
    }
}

#[async_trait]
impl<R: Renderer> PageFetcher for RenderFetcher<R> {
    async fn fetch_page(&self, url: &str) -> crate::Result<FetchedPage> {
        let mut session = self.renderer.open(self.config.headless).await?;

        let outcome = drive_session(session.as_mut(), url, &self.config).await;

        // The session is released even when the visit failed.
        if let Err(error) = session.close().await {
            tracing::warn!("Failed to close render session for {}: {}", url, error);
        }

        let body = outcome?;
        Ok(FetchedPage {
            status_code: RENDERED_STATUS,
            body,
        })
    }
}

async fn drive_session(
    session: &mut dyn RenderSession,
    url: &str,
    config: &RenderConfig,
) -> crate::Result<String> {
    let rendered = session.render(url, config.wait.as_ref()).await?;

    if config.actions.is_empty() {
        return Ok(rendered);
    }

    for action in &config.actions {
        match action {
            RenderAction::Click { selector } => session.click(selector).await?,
            RenderAction::Scroll {
                pause_time,
                max_scrolls,
            } => {
                session
                    .scroll_to_bottom(Duration::from_secs_f64(*pause_time), *max_scrolls)
                    .await?
            }
            RenderAction::Script { code } => session.run_script(code).await?,
            RenderAction::Wait { seconds } => {
                tokio::time::sleep(Duration::from_secs_f64(*seconds)).await
            }
        }
    }

    session.page_source().await
}
