use super::domain::{extract_host, registrable_domain};
use url::Url;

/// Decides whether a candidate link belongs to the seed's site
///
/// Both URLs are parsed and their hosts compared by registrable domain, so
/// any subdomain of the seed's domain is in scope. Returns `false` if either
/// URL fails to parse or has no host.
///
/// # Examples
///
/// ```
/// use second_order::url::in_scope;
///
/// assert!(in_scope("https://docs.example.com/x", "https://mail.example.com/"));
/// assert!(!in_scope("https://example.org/x", "https://example.com/"));
/// ```
pub fn in_scope(candidate: &str, seed: &str) -> bool {
    match (Url::parse(candidate), Url::parse(seed)) {
        (Ok(candidate), Ok(seed)) => in_scope_url(&candidate, &seed),
        _ => false,
    }
}

/// [`in_scope`] for already parsed URLs
pub fn in_scope_url(candidate: &Url, seed: &Url) -> bool {
    match (extract_host(candidate), extract_host(seed)) {
        (Some(candidate_host), Some(seed_host)) => {
            registrable_domain(&candidate_host) == registrable_domain(&seed_host)
        }
        _ => false,
    }
}
