//! URL normalization helpers.
//!
//! Two levels of normalization are used across the pipeline: domain-level
//! (host only, for same-site membership tests) and URL-level (scheme and
//! `www.` stripped but path preserved, for deduplicating finding URL lists).

/// Normalize a URL or bare domain down to its lowercase host.
///
/// Strips scheme, leading `www.`, port suffix, and any path. Empty or
/// whitespace-only input yields an empty string. Idempotent.
pub fn normalize_domain(input: &str) -> String {
    let s = input.trim().to_ascii_lowercase();
    if s.is_empty() {
        return String::new();
    }

    let s = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))
        .unwrap_or(&s);

    let host = s.split('/').next().unwrap_or("");
    let host = host.strip_prefix("www.").unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    host.to_string()
}

/// Normalize a full URL so `www` and non-`www` variants compare equal.
///
/// Keeps scheme casing and path intact apart from a trailing-slash trim;
/// only the `www.` host prefix is dropped.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    trimmed.replace("://www.", "://")
}

/// The `www`/non-`www` pair for a host, the given variant first.
pub fn host_variants(host: &str) -> Vec<String> {
    if let Some(bare) = host.strip_prefix("www.") {
        vec![host.to_string(), bare.to_string()]
    } else {
        vec![host.to_string(), format!("www.{host}")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_strips_scheme_www_port_and_path() {
        assert_eq!(normalize_domain("HTTPS://WWW.Example.com:443/x"), "example.com");
        assert_eq!(normalize_domain("http://example.com/a/b"), "example.com");
        assert_eq!(normalize_domain("www.example.com"), "example.com");
        assert_eq!(normalize_domain("example.com:8080"), "example.com");
    }

    #[test]
    fn domain_is_idempotent() {
        let once = normalize_domain("https://www.Example.com/page");
        assert_eq!(normalize_domain(&once), once);
    }

    #[test]
    fn domain_empty_input() {
        assert_eq!(normalize_domain(""), "");
        assert_eq!(normalize_domain("   "), "");
    }

    #[test]
    fn url_level_drops_www_keeps_path() {
        assert_eq!(
            normalize_url("https://www.example.com/a/b/"),
            "https://example.com/a/b"
        );
        assert_eq!(
            normalize_url("http://example.com/a"),
            "http://example.com/a"
        );
    }

    #[test]
    fn variants_cover_both_hosts() {
        assert_eq!(host_variants("example.com"), vec!["example.com", "www.example.com"]);
        assert_eq!(host_variants("www.example.com"), vec!["www.example.com", "example.com"]);
    }
}
