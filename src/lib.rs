//! Pagesift: a configurable web crawler with pluggable field extraction
//!
//! This crate fetches web pages and converts their markup into structured
//! JSON records under operator-supplied limits on depth, breadth, and rate.
//! Extraction is strategy-driven: fixed strategies for generic pages,
//! products, and articles, plus a selector-expression DSL for custom
//! field maps.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod render;

use thiserror::Error;

/// Main error type for pagesift operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Render error for {url}: {message}")]
    Render { url: String, message: String },

    #[error("No render backend is available for this crawl")]
    RenderUnavailable,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
///
/// Everything in here is raised eagerly, before any fetch occurs, and is
/// fatal to the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read job file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in job: {0}")]
    InvalidUrl(String),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Invalid selector for field '{field}': {selector}")]
    InvalidSelector { field: String, selector: String },

    #[error("Invalid instruction for field '{field}': {message}")]
    InvalidInstruction { field: String, message: String },
}

/// Result type alias for pagesift operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{load_job, load_job_with_hash, CrawlConfig, JobSpec};
pub use crawler::{crawl, CrawlResult, Crawler};
pub use extract::{ExtractionStrategy, FieldMap};
