//! Non-200 probing of harvested links
//!
//! A link is interesting when requesting it fails outright (DNS failure,
//! refused connection, timeout) or returns anything other than 200. Both are
//! signs of a resource that may have been abandoned and could be claimed.

use crate::crawler::HttpClient;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

/// Result of probing one harvested value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The request failed before a response arrived
    Unreachable(String),
    /// The server answered with a status other than 200
    NonOk(u16),
    /// Non-200 status listed in `ExcludedStatusCodes`
    ExcludedStatus(u16),
    /// The server answered 200
    Ok,
}

impl ProbeOutcome {
    /// Returns true if the value should be recorded
    pub fn is_interesting(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::NonOk(_))
    }
}

/// Issues probe requests for NonOkProbe extractors
///
/// Probes share the crawl's fetch permits so that probing never pushes the
/// number of in-flight requests past the configured concurrency.
pub struct Prober {
    client: HttpClient,
    excluded_urls: Vec<Regex>,
    excluded_status_codes: HashSet<u16>,
    permits: Arc<Semaphore>,
}

impl Prober {
    /// Creates a prober
    ///
    /// `client` should carry a short request timeout; a timed-out probe counts
    /// as unreachable.
    pub fn new(
        client: HttpClient,
        excluded_urls: Vec<Regex>,
        excluded_status_codes: &[u16],
        permits: Arc<Semaphore>,
    ) -> Self {
        Self {
            client,
            excluded_urls,
            excluded_status_codes: excluded_status_codes.iter().copied().collect(),
            permits,
        }
    }

    /// Returns true if the value matches an `ExcludedUrlRegex` pattern
    pub fn is_excluded(&self, value: &str) -> bool {
        self.excluded_urls.iter().any(|pattern| pattern.is_match(value))
    }

    /// Probes a single harvested value
    ///
    /// Returns `None` without any network traffic when the value is not an
    /// absolute http(s) URL or is excluded by pattern. Scheme-relative values
    /// take `page_scheme`, the scheme of the page they were harvested from.
    pub async fn probe(&self, value: &str, page_scheme: &str) -> Option<ProbeOutcome> {
        let target = probe_target(value, page_scheme)?;
        if self.is_excluded(value) {
            tracing::debug!("Probe skipped for excluded value {}", value);
            return None;
        }

        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::debug!("Fetch permits closed, skipping probe of {}", value);
                return None;
            }
        };

        let outcome = match self.client.get(target.as_str()).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if status == 200 {
                    ProbeOutcome::Ok
                } else if self.excluded_status_codes.contains(&status) {
                    ProbeOutcome::ExcludedStatus(status)
                } else {
                    ProbeOutcome::NonOk(status)
                }
            }
            Err(e) if e.is_timeout() => ProbeOutcome::Unreachable("request timed out".to_string()),
            Err(e) => ProbeOutcome::Unreachable(e.to_string()),
        };

        tracing::trace!("Probe {} -> {:?}", target, outcome);
        Some(outcome)
    }
}

/// Turns a harvested value into a URL worth probing
///
/// Only absolute `http`/`https` URLs are probed. Scheme-relative values
/// (`//host/path`) borrow `page_scheme`.
pub fn probe_target(value: &str, page_scheme: &str) -> Option<Url> {
    let value = value.trim();
    let url = if value.starts_with("//") {
        Url::parse(&format!("{}:{}", page_scheme, value)).ok()?
    } else {
        Url::parse(value).ok()?
    };

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}
