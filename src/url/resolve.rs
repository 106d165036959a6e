use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a page-relative link against the page's URL
///
/// Scheme-relative (`//host/path`), path-relative and fragment-only
/// references are resolved per RFC 3986. The reference itself is checked
/// before resolution: control characters, malformed percent escapes and a
/// colon in the first segment of a relative path are rejected. The resolved
/// URL must use `http` or `https`.
///
/// # Examples
///
/// ```
/// use second_order::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/c/d").unwrap();
/// assert_eq!(resolve("/a/b", &base).unwrap().as_str(), "https://example.com/a/b");
/// assert!(resolve("not a url::", &base).is_err());
/// ```
pub fn resolve(href: &str, base: &Url) -> UrlResult<Url> {
    let href = href.trim();
    check_reference(href)?;

    let resolved = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("'{}': {}", href, e)))?;

    match resolved.scheme() {
        "http" | "https" => Ok(resolved),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}

/// Rejects references that are not valid URI references
fn check_reference(href: &str) -> UrlResult<()> {
    if href.chars().any(|c| c.is_control()) {
        return Err(UrlError::Parse(format!(
            "{:?}: contains a control character",
            href
        )));
    }

    check_percent_escapes(href)?;

    // A relative-path reference may not carry a colon in its first segment,
    // otherwise it would be read as a scheme
    if !has_scheme(href) {
        let first_segment = href
            .split(|c| c == '/' || c == '?' || c == '#')
            .next()
            .unwrap_or_default();
        if first_segment.contains(':') {
            return Err(UrlError::Parse(format!(
                "'{}': first path segment contains a colon",
                href
            )));
        }
    }

    Ok(())
}

/// Returns true if the reference starts with `scheme:`
fn has_scheme(href: &str) -> bool {
    let Some(colon) = href.find(':') else {
        return false;
    };
    let scheme = &href[..colon];
    let mut chars = scheme.chars();

    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Every `%` must be followed by two hex digits
fn check_percent_escapes(href: &str) -> UrlResult<()> {
    let bytes = href.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(UrlError::Parse(format!(
                    "'{}': invalid percent escape",
                    href
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/c/d").unwrap()
    }

    fn resolved(href: &str) -> String {
        resolve(href, &base()).unwrap().to_string()
    }

    #[test]
    fn test_absolute_path() {
        assert_eq!(resolved("/a/b"), "https://example.com/a/b");
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(resolved("e"), "https://example.com/c/e");
        assert_eq!(resolved("../x"), "https://example.com/x");
        assert_eq!(resolved("./y?q=1"), "https://example.com/c/y?q=1");
    }

    #[test]
    fn test_scheme_relative() {
        assert_eq!(resolved("//cdn.example.com/lib.js"), "https://cdn.example.com/lib.js");
    }

    #[test]
    fn test_fragment_only() {
        assert_eq!(resolved("#top"), "https://example.com/c/d#top");
    }

    #[test]
    fn test_absolute_url_passes_through() {
        assert_eq!(resolved("http://other.org/p"), "http://other.org/p");
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert_eq!(resolved("  /a  "), "https://example.com/a");
    }

    #[test]
    fn test_colon_in_first_segment_rejected() {
        assert!(matches!(
            resolve("not a url::", &base()),
            Err(UrlError::Parse(_))
        ));
        assert!(resolve("a:b/c", &base()).is_err());
    }

    #[test]
    fn test_colon_after_first_segment_allowed() {
        assert_eq!(resolved("/time/12:30"), "https://example.com/time/12:30");
        assert_eq!(resolved("x/y:z"), "https://example.com/c/x/y:z");
    }

    #[test]
    fn test_non_http_schemes_rejected() {
        for href in [
            "mailto:admin@example.com",
            "javascript:void(0)",
            "tel:+15551234",
            "ftp://example.com/file",
            "data:text/plain,hi",
        ] {
            assert!(
                matches!(resolve(href, &base()), Err(UrlError::InvalidScheme(_))),
                "expected {} to be rejected",
                href
            );
        }
    }

    #[test]
    fn test_bad_percent_escape_rejected() {
        assert!(resolve("/a%zzb", &base()).is_err());
        assert!(resolve("/a%2", &base()).is_err());
        assert!(resolve("/a%20b", &base()).is_ok());
    }

    #[test]
    fn test_control_characters_rejected() {
        assert!(resolve("/a\u{7}b", &base()).is_err());
    }
}
