use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use second_order::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Reduces a hostname to its registrable domain
///
/// The registrable domain is approximated as the last two dot-separated
/// labels, so `mail.example.com` and `docs.example.com` both reduce to
/// `example.com`. Hosts with fewer than two labels are returned unchanged.
///
/// This is not public-suffix aware: `foo.co.uk` and `bar.co.uk` both reduce
/// to `co.uk` and are treated as the same site.
///
/// # Examples
///
/// ```
/// use second_order::url::registrable_domain;
///
/// assert_eq!(registrable_domain("api.v2.example.com"), "example.com");
/// assert_eq!(registrable_domain("localhost"), "localhost");
/// ```
pub fn registrable_domain(host: &str) -> &str {
    let host = host.trim_end_matches('.');
    match host.rmatch_indices('.').nth(1) {
        Some((index, _)) => &host[index + 1..],
        None => host,
    }
}
