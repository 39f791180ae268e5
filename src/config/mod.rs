//! Job configuration loading and validation
//!
//! A crawl is described by a job file (TOML or JSON, chosen by file
//! extension) that carries the origin URL, the strategy selection, the
//! selector map for the selector strategy, and the crawl settings.

mod types;
mod validation;

pub use types::{CrawlConfig, CrawlSettings, JobSpec};
pub use validation::validate;

use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a job file from the given path
///
/// The format is selected by file extension: `.json` is parsed as JSON,
/// anything else as TOML. The job is validated before being returned.
///
/// # Arguments
///
/// * `path` - Path to the job file
///
/// # Returns
///
/// * `Ok(JobSpec)` - Successfully loaded and validated job
/// * `Err(ConfigError)` - Failed to load, parse, or validate the job
pub fn load_job(path: &Path) -> Result<JobSpec, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let job: JobSpec = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };

    validate(&job)?;

    Ok(job)
}

/// Computes a SHA-256 hash of the job file content
///
/// Used to identify the exact job definition a result set was produced
/// from.
pub fn compute_job_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a job and returns both the job and its content hash
pub fn load_job_with_hash(path: &Path) -> Result<(JobSpec, String), ConfigError> {
    let job = load_job(path)?;
    let hash = compute_job_hash(path)?;
    Ok((job, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn create_temp_job(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_toml_job() {
        let job_content = r#"
url = "https://example.com/"
strategy = "generic"

[config]
max_depth = 2
max_pages = 25
delay = 0.5
follow_links = true
"#;

        let file = create_temp_job(".toml", job_content);
        let job = load_job(file.path()).unwrap();

        assert_eq!(job.url, "https://example.com/");
        assert_eq!(job.strategy, "generic");
        assert_eq!(job.config.max_depth, 2);
        assert_eq!(job.config.max_pages, 25);
        assert!(job.config.follow_links);
    }

    #[test]
    fn test_load_json_job() {
        let job_content = r#"
{
    "url": "https://example.com/",
    "strategy": "selector",
    "selectors": {
        "title": "h1",
        "link": "a.main@href"
    },
    "config": { "max_pages": 3 }
}
"#;

        let file = create_temp_job(".json", job_content);
        let job = load_job(file.path()).unwrap();

        assert_eq!(job.strategy, "selector");
        assert_eq!(job.selectors.len(), 2);
        assert_eq!(job.config.max_pages, 3);
    }

    #[test]
    fn test_defaults_applied() {
        let file = create_temp_job(".toml", "url = \"https://example.com/\"\n");
        let job = load_job(file.path()).unwrap();

        assert_eq!(job.strategy, "generic");
        assert_eq!(job.config.max_depth, 1);
        assert_eq!(job.config.max_pages, 10);
        assert!(!job.config.follow_links);
        assert_eq!(job.config.timeout, 10);
    }

    #[test]
    fn test_load_job_with_invalid_path() {
        let result = load_job(Path::new("/nonexistent/job.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_job_with_invalid_toml() {
        let file = create_temp_job(".toml", "this is not valid TOML {{{");
        assert!(load_job(file.path()).is_err());
    }

    #[test]
    fn test_load_job_missing_url() {
        let file = create_temp_job(".json", r#"{"strategy": "generic"}"#);
        assert!(load_job(file.path()).is_err());
    }

    #[test]
    fn test_load_job_with_validation_error() {
        let job_content = r#"
url = "https://example.com/"

[config]
max_pages = 0
"#;
        let file = create_temp_job(".toml", job_content);
        let result = load_job(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_job_hash() {
        let file = create_temp_job(".toml", "url = \"https://example.com/\"\n");

        let hash1 = compute_job_hash(file.path()).unwrap();
        let hash2 = compute_job_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_job(".toml", "url = \"https://a.example.com/\"\n");
        let file2 = create_temp_job(".toml", "url = \"https://b.example.com/\"\n");

        let hash1 = compute_job_hash(file1.path()).unwrap();
        let hash2 = compute_job_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
