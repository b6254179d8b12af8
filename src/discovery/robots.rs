//! robots.txt sitemap discovery.

use tracing::debug;

use crate::scrapers::HttpClient;
use crate::utils::host_variants;

/// Collect `Sitemap:` directives from robots.txt.
///
/// Both the `www` and non-`www` hosts are tried; the first one whose
/// robots.txt yields any sitemap URLs wins. Fetch failures yield an empty
/// list and resolution moves on.
pub async fn sitemaps_from_robots(http: &HttpClient, base_url: &str) -> Vec<String> {
    let scheme = if base_url.starts_with("http://") {
        "http"
    } else {
        "https"
    };

    for host in host_variants(&host_of(base_url)) {
        let robots_url = format!("{scheme}://{host}/robots.txt");
        let Some(body) = http.get_text(&robots_url).await else {
            debug!("no robots.txt at {}", robots_url);
            continue;
        };
        let sitemaps = parse_sitemap_directives(&body);
        if !sitemaps.is_empty() {
            debug!("robots.txt at {} listed {} sitemaps", robots_url, sitemaps.len());
            return sitemaps;
        }
    }
    Vec::new()
}

/// Pull `sitemap: <url>` lines out of a robots.txt body, key matched
/// case-insensitively, order preserved, duplicates dropped.
pub fn parse_sitemap_directives(body: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut sitemaps = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        let is_directive = line
            .get(..8)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("sitemap:"));
        if is_directive {
            let value = line[8..].trim();
            if !value.is_empty() && seen.insert(value.to_string()) {
                sitemaps.push(value.to_string());
            }
        }
    }
    sitemaps
}

/// Host part of a scheme+host base URL, `www.` preserved.
fn host_of(base_url: &str) -> String {
    let stripped = base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    stripped.split('/').next().unwrap_or(stripped).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitive_directives_in_order() {
        let body = "User-agent: *\nDisallow: /admin\nSitemap: https://example.com/sitemap.xml\nsitemap: https://example.com/news.xml\nSITEMAP: https://example.com/sitemap.xml\n";
        assert_eq!(
            parse_sitemap_directives(body),
            vec![
                "https://example.com/sitemap.xml",
                "https://example.com/news.xml",
            ]
        );
    }

    #[test]
    fn ignores_unrelated_lines_and_empty_values() {
        let body = "Sitemap:\nAllow: /\nCrawl-delay: 5\n";
        assert!(parse_sitemap_directives(body).is_empty());
    }

    #[test]
    fn host_of_strips_scheme() {
        assert_eq!(host_of("https://www.example.com"), "www.example.com");
        assert_eq!(host_of("http://example.com"), "example.com");
    }
}
