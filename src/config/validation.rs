use crate::config::types::JobSpec;
use crate::ConfigError;
use url::Url;

/// Validates a job before any fetch occurs
///
/// Validation failures are fatal to the run. Strategy-name and selector
/// problems are reported separately, at strategy construction.
pub fn validate(job: &JobSpec) -> Result<(), ConfigError> {
    validate_url(&job.url)?;
    validate_settings(job)?;
    Ok(())
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
    if url.trim().is_empty() {
        return Err(ConfigError::Validation("url is required".to_string()));
    }

    let parsed =
        Url::parse(url).map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", url, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "url must use http or https, got '{}'",
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none() {
        return Err(ConfigError::Validation(format!(
            "url '{}' has no host",
            url
        )));
    }

    Ok(())
}

fn validate_settings(job: &JobSpec) -> Result<(), ConfigError> {
    let settings = &job.config;

    // max_depth >= 0 is always true for u32, so no check needed

    if settings.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            settings.max_pages
        )));
    }

    if !settings.delay.is_finite() || settings.delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay must be a non-negative number of seconds, got {}",
            settings.delay
        )));
    }

    if settings.timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 1 second, got {}",
            settings.timeout
        )));
    }

    if settings.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}
