//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients that honor the insecure-TLS toggle
//! - Attaching a rotated User-Agent and the configured headers to every request
//! - Classifying page responses (success, rate limited, non-HTML, errors)

use crate::config::CrawlSettings;
use crate::{ConfigError, CrawlError};
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Timeout applied to every NonOkProbe request
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Browser User-Agent strings rotated across requests
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36 Edg/108.0.1462.54",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:108.0) Gecko/20100101 Firefox/108.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.2 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_0_0; rv:87.0) Gecko/20100101 Firefox/87.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:87.0) Gecko/20100101 Firefox/87.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.141 Safari/537.36 Edg/87.0.664.75",
];

/// Picks a User-Agent for the next request
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Result of a page fetch
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// HTTP 429; the job is dropped without retry
    RateLimited,

    /// Any other non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, DNS failure, body read failure)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// HTTP client that decorates every request with the crawl's headers
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    headers: HeaderMap,
}

impl HttpClient {
    /// Builds a client for the given settings
    ///
    /// # Arguments
    ///
    /// * `settings` - Supplies the insecure-TLS toggle and request headers
    /// * `timeout` - Whole-request timeout; `None` for page fetches
    ///
    /// # Example
    ///
    /// ```
    /// use second_order::config::CrawlSettings;
    /// use second_order::crawler::{HttpClient, PROBE_TIMEOUT};
    /// use url::Url;
    ///
    /// let settings = CrawlSettings::new(Url::parse("https://example.com/").unwrap())
    ///     .with_insecure(true);
    /// let client = HttpClient::new(&settings, Some(PROBE_TIMEOUT)).unwrap();
    /// ```
    pub fn new(settings: &CrawlSettings, timeout: Option<Duration>) -> Result<Self, CrawlError> {
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(settings.insecure)
            .gzip(true)
            .brotli(true);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            headers: build_header_map(&settings.headers)?,
        })
    }

    /// Starts a GET request with a rotated User-Agent and the configured headers
    ///
    /// Configured headers are applied last, so a configured `User-Agent`
    /// replaces the rotated one.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .headers(self.headers.clone())
    }
}

/// Converts configured headers into a `HeaderMap`
pub fn build_header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ConfigError> {
    let mut map = HeaderMap::new();

    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::Validation(format!("'{}' is not a valid header name", name)))?;
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("header '{}' has an invalid value", name))
        })?;
        map.insert(header_name, header_value);
    }

    Ok(map)
}

/// Fetches a page and classifies the response
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 429 | RateLimited |
/// | Other non-2xx | HttpError |
/// | Content-Type without `html` | ContentMismatch |
/// | Connection/DNS/body failure | NetworkError |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_url(client: &HttpClient, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                e.to_string()
            };
            return FetchResult::NetworkError { error };
        }
    };

    let status = response.status();
    let final_url = response.url().clone();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return FetchResult::RateLimited;
    }

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.to_ascii_lowercase().contains("html") {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
        },
    }
}
