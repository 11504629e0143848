use crate::config::types::{AuditConfig, Config, CrawlerConfig, OutputConfig};
use crate::{ConfigError, ConfigResult};
use regex::Regex;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_audit_config(&config.audit)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates per-audit settings
pub fn validate_audit_config(config: &AuditConfig) -> ConfigResult<()> {
    if config.port == 0 {
        return Err(ConfigError::Validation(
            "port must be between 1 and 65535".to_string(),
        ));
    }

    if config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "audit concurrency must be at most 100, got {}",
            config.concurrency
        )));
    }

    for pattern in &config.ignore_patterns {
        validate_ignore_pattern(pattern)?;
    }

    Ok(())
}

/// Validates crawl pool settings
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "crawler concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.navigation_timeout_secs < 1 || config.navigation_timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout_secs must be between 1 and 120, got {}",
            config.navigation_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.audits_dir.is_empty() {
        return Err(ConfigError::Validation(
            "audits_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates an ignore pattern; `/…/` patterns must compile as regexes
fn validate_ignore_pattern(pattern: &str) -> ConfigResult<()> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Ignore pattern cannot be empty".to_string(),
        ));
    }

    if let Some(expr) = crate::url::regex_body(pattern) {
        Regex::new(expr)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
    }

    Ok(())
}
