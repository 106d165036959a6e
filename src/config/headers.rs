use reqwest::header::{HeaderName, HeaderValue};
use std::collections::BTreeMap;

/// Parses a `Name: Value` header flag
///
/// The entry is split on its first colon and both halves are trimmed.
/// Entries without a colon or with an empty name are rejected.
///
/// # Examples
///
/// ```
/// use second_order::config::parse_header_flag;
///
/// assert_eq!(
///     parse_header_flag("X-Api-Key:  secret "),
///     Some(("X-Api-Key".to_string(), "secret".to_string()))
/// );
/// assert_eq!(parse_header_flag("no colon here"), None);
/// ```
pub fn parse_header_flag(raw: &str) -> Option<(String, String)> {
    let (name, value) = raw.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Merges config-file headers with `--header` flags
///
/// Malformed flags are skipped with a debug log, including flags whose name
/// or value cannot be sent as an HTTP header. A flag overrides a config
/// header of the same name.
pub fn merge_headers(
    config_headers: &BTreeMap<String, String>,
    flags: &[String],
) -> BTreeMap<String, String> {
    let mut merged = config_headers.clone();

    for raw in flags {
        match parse_header_flag(raw) {
            Some((name, value)) if is_sendable(&name, &value) => {
                merged.insert(name, value);
            }
            _ => tracing::debug!("Ignoring malformed header flag: {:?}", raw),
        }
    }

    merged
}

fn is_sendable(name: &str, value: &str) -> bool {
    HeaderName::from_bytes(name.as_bytes()).is_ok() && HeaderValue::from_str(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{validate_settings, CrawlSettings};
    use url::Url;

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(
            parse_header_flag("  Cookie :  session=abc  "),
            Some(("Cookie".to_string(), "session=abc".to_string()))
        );
    }

    #[test]
    fn test_parse_keeps_colons_in_value() {
        assert_eq!(
            parse_header_flag("Referer: https://example.com/"),
            Some(("Referer".to_string(), "https://example.com/".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(parse_header_flag("Authorization"), None);
        assert_eq!(parse_header_flag(": value"), None);
        assert_eq!(parse_header_flag(""), None);
    }

    #[test]
    fn test_merge_flag_overrides_config() {
        let mut config_headers = BTreeMap::new();
        config_headers.insert("X-Team".to_string(), "red".to_string());
        config_headers.insert("Accept".to_string(), "text/html".to_string());

        let flags = vec![
            "X-Team: blue".to_string(),
            "garbage".to_string(),
            "X-Extra: 1".to_string(),
        ];
        let merged = merge_headers(&config_headers, &flags);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged["X-Team"], "blue");
        assert_eq!(merged["Accept"], "text/html");
        assert_eq!(merged["X-Extra"], "1");
    }

    #[test]
    fn test_merge_drops_unsendable_flags() {
        let flags = vec![
            "Bad Header: x".to_string(),
            "X-Newline: a\nb".to_string(),
            "X-Good: yes".to_string(),
        ];
        let merged = merge_headers(&BTreeMap::new(), &flags);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged["X-Good"], "yes");

        let settings = CrawlSettings::new(Url::parse("https://example.com/").unwrap())
            .with_headers(merged);
        assert!(validate_settings(&settings).is_ok());
    }
}
