use crate::config::types::{Config, CrawlSettings, SelectorSpec};
use crate::crawler::build_header_map;
use crate::extract::compile_selector;
use crate::ConfigError;
use regex::Regex;
use std::collections::BTreeMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if let Some(queries) = &config.log_queries {
        validate_selector_table("LogQueries", queries)?;
    }
    if let Some(queries) = &config.log_non_200_queries {
        validate_selector_table("LogNon200Queries", queries)?;
    }
    if let Some(tags) = &config.log_inline {
        validate_inline_tags(tags)?;
    }
    compile_exclusions(&config.excluded_url_regex)?;
    validate_status_codes(&config.excluded_status_codes)?;
    Ok(())
}

/// Validates runtime settings assembled from the command line
pub fn validate_settings(settings: &CrawlSettings) -> Result<(), ConfigError> {
    if settings.threads < 1 {
        return Err(ConfigError::Validation(format!(
            "threads must be >= 1, got {}",
            settings.threads
        )));
    }

    build_header_map(&settings.headers)?;

    Ok(())
}

/// Parses the seed URL
///
/// The target must be an absolute `http` or `https` URL with a host.
pub fn parse_target(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}': only http and https targets can be crawled",
            raw
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!("'{}': missing host", raw)));
    }

    Ok(url)
}

/// Compiles the `ExcludedUrlRegex` patterns
pub fn compile_exclusions(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// Validates an attribute-harvest table
fn validate_selector_table(
    field: &str,
    table: &BTreeMap<String, SelectorSpec>,
) -> Result<(), ConfigError> {
    for (key, spec) in table {
        let (tag, attribute) = match spec {
            SelectorSpec::Attribute(attribute) => (key.as_str(), attribute.as_str()),
            SelectorSpec::Named { tag, attribute } => (tag.as_str(), attribute.as_str()),
        };

        if tag.trim().is_empty() || attribute.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} entry '{}' needs both a tag and an attribute",
                field, key
            )));
        }

        compile_selector(&format!("{}[{}]", tag, attribute))?;
    }

    Ok(())
}

/// Validates the `LogInline` tag list
fn validate_inline_tags(tags: &[String]) -> Result<(), ConfigError> {
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(ConfigError::Validation(
                "LogInline cannot contain an empty tag".to_string(),
            ));
        }
        compile_selector(tag)?;
    }
    Ok(())
}

/// Excluded status codes must be real HTTP status codes
fn validate_status_codes(codes: &[u16]) -> Result<(), ConfigError> {
    if let Some(code) = codes.iter().find(|c| !(100..=599).contains(*c)) {
        return Err(ConfigError::Validation(format!(
            "ExcludedStatusCodes contains invalid status code {}",
            code
        )));
    }
    Ok(())
}
