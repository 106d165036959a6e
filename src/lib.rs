//! Second-Order: a scoped, depth-bounded reconnaissance crawler
//!
//! This crate crawls same-site pages starting from a seed URL, harvests
//! configured HTML attributes and inline text, and probes harvested links for
//! non-200 responses that may point at dangling third-party resources.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Second-Order operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Invalid job transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::JobState,
        to: state::JobState,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode JSON config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid target URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid exclusion pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlSettings};
pub use crawler::{run_crawl, Coordinator, CrawlReport};
pub use state::JobState;
pub use crate::url::{in_scope, resolve};
