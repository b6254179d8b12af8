//! Sitemap location, parsing, and selection.
//!
//! Sitemap XML is namespace-heavy and frequently malformed in the wild, so
//! tag matching strips namespace prefixes and works over the raw text
//! rather than a strict XML parser. HTML error pages served with a 200 are
//! rejected with a cheap prefix peek before any tag scanning happens.

use tracing::{debug, warn};

use crate::config::DiscoveryConfig;
use crate::discovery::robots;
use crate::scrapers::HttpClient;
use crate::utils::host_variants;

/// Default sitemap filenames probed when robots.txt lists none.
const DEFAULT_SITEMAP_FILES: &[&str] = &[
    "sitemap_index.xml",
    "sitemap.xml",
    "wp-sitemap.xml",
    "sitemap-index.xml",
    "sitemap1.xml",
];

/// A sitemap adopted as the authoritative URL source.
#[derive(Debug, Clone)]
pub struct SitemapResolution {
    pub sitemap_url: String,
    pub urls: Vec<String>,
}

/// Try every candidate sitemap in priority order and pick a source.
///
/// The first candidate yielding at least `min_useful_urls` is adopted
/// immediately; otherwise the best candidate that yielded anything at all
/// is used, on the theory that a small sitemap beats none.
pub async fn resolve(
    http: &HttpClient,
    base_url: &str,
    config: &DiscoveryConfig,
) -> Option<SitemapResolution> {
    let candidates = candidate_list(http, base_url).await;
    debug!("{} sitemap candidates for {}", candidates.len(), base_url);

    let mut fallback: Option<SitemapResolution> = None;
    for candidate in candidates {
        let urls = fetch_sitemap_urls(http, &candidate, config).await;
        if urls.len() >= config.min_useful_urls {
            return Some(SitemapResolution {
                sitemap_url: candidate,
                urls,
            });
        }
        if !urls.is_empty() && fallback.is_none() {
            debug!(
                "keeping {} ({} URLs) as fallback sitemap",
                candidate,
                urls.len()
            );
            fallback = Some(SitemapResolution {
                sitemap_url: candidate,
                urls,
            });
        }
    }
    fallback
}

/// Merge robots-discovered and default candidates for both host variants,
/// deduplicate, and order by the filename priority heuristic.
async fn candidate_list(http: &HttpClient, base_url: &str) -> Vec<String> {
    let scheme = if base_url.starts_with("http://") {
        "http"
    } else {
        "https"
    };
    let host = base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");

    let mut candidates = robots::sitemaps_from_robots(http, base_url).await;

    for variant in host_variants(host) {
        for file in DEFAULT_SITEMAP_FILES {
            candidates.push(format!("{scheme}://{variant}/{file}"));
        }
    }

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.clone()));

    // Stable sort keeps robots-discovered URLs ahead within a class.
    candidates.sort_by_key(|c| candidate_priority(c));
    candidates
}

/// Priority class for a sitemap filename. Lower tries first.
///
/// 0 = index or generic sitemap, 1 = content/paginated, 2 = known non-page
/// sitemaps (news/video/image and taxonomy feeds), 3 = unknown.
pub fn candidate_priority(url: &str) -> u8 {
    let name = url.rsplit('/').next().unwrap_or(url);
    let name = name.split('?').next().unwrap_or(name).to_ascii_lowercase();

    if name.contains("index") || name == "sitemap.xml" || name == "wp-sitemap.xml" {
        return 0;
    }
    if ["news", "video", "image", "category", "tag", "author"]
        .iter()
        .any(|kind| name.contains(kind))
    {
        return 2;
    }
    if name.contains("page") || name.contains("post") || is_numbered_sitemap(&name) {
        return 1;
    }
    3
}

/// `sitemap1.xml`, `sitemap-2.xml`, `sitemap_10.xml` style names.
fn is_numbered_sitemap(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("sitemap") else {
        return false;
    };
    let Some(digits) = rest.trim_start_matches(['-', '_']).strip_suffix(".xml") else {
        return false;
    };
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Fetch one sitemap and every index child under it, bounded by the
/// configured fan-out and total URL ceiling. Traversal is depth-first over
/// an explicit worklist; visited sitemaps are never re-fetched.
async fn fetch_sitemap_urls(
    http: &HttpClient,
    sitemap_url: &str,
    config: &DiscoveryConfig,
) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let mut stack = vec![sitemap_url.to_string()];
    let mut visited = std::collections::HashSet::new();

    while let Some(current) = stack.pop() {
        if urls.len() >= config.max_sitemap_urls {
            break;
        }
        if !visited.insert(current.clone()) {
            continue;
        }

        let Some(body) = http.get_text(&current).await else {
            debug!("sitemap candidate {} yielded nothing", current);
            continue;
        };

        if looks_like_html(&body) {
            debug!("{} served HTML, skipping", current);
            continue;
        }

        if is_sitemap_index(&body) {
            let children = extract_loc_values(&body);
            if children.is_empty() {
                warn!("sitemap index {} listed no children", current);
                continue;
            }
            // Push in reverse so the first child is fetched next.
            for child in children
                .into_iter()
                .take(config.sitemap_index_children)
                .rev()
            {
                if !visited.contains(&child) {
                    stack.push(child);
                }
            }
        } else {
            let found = extract_loc_values(&body);
            debug!("extracted {} URLs from {}", found.len(), current);
            urls.extend(found);
        }
    }

    let mut seen = std::collections::HashSet::new();
    urls.retain(|u| seen.insert(u.clone()));
    urls.truncate(config.max_sitemap_urls);
    urls
}

/// Cheap rejection of HTML error pages returned with a 200 status, so an
/// XML scan is never wasted on them.
pub fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start().get(..64).unwrap_or(body.trim_start());
    let head = head.to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

/// Whether the document's root element is a `sitemapindex`.
pub fn is_sitemap_index(xml: &str) -> bool {
    first_element_name(xml).is_some_and(|name| name.eq_ignore_ascii_case("sitemapindex"))
}

fn first_element_name(xml: &str) -> Option<String> {
    let mut rest = xml;
    while let Some(start) = rest.find('<') {
        rest = &rest[start + 1..];
        let end = rest.find('>')?;
        let tag = &rest[..end];
        rest = &rest[end + 1..];
        if tag.starts_with('?') || tag.starts_with('!') || tag.starts_with('/') {
            continue;
        }
        let name = tag
            .split([' ', '\t', '\n', '\r', '/'])
            .next()
            .unwrap_or(tag);
        return Some(strip_ns_prefix(name).to_string());
    }
    None
}

/// Extract the text of every `<loc>` element, namespace prefixes ignored.
pub fn extract_loc_values(xml: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find('<') {
        rest = &rest[start + 1..];
        let Some(end) = rest.find('>') else { break };
        let tag = &rest[..end];
        rest = &rest[end + 1..];

        if tag.starts_with('/') || tag.starts_with('!') || tag.starts_with('?') || tag.ends_with('/')
        {
            continue;
        }
        let name = tag
            .split([' ', '\t', '\n', '\r'])
            .next()
            .unwrap_or(tag);
        if !strip_ns_prefix(name).eq_ignore_ascii_case("loc") {
            continue;
        }
        if let Some(close) = rest.find('<') {
            let text = unescape_xml(rest[..close].trim());
            if !text.is_empty() {
                values.push(text);
            }
        }
    }
    values
}

fn strip_ns_prefix(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_classes() {
        assert_eq!(candidate_priority("https://x.com/sitemap.xml"), 0);
        assert_eq!(candidate_priority("https://x.com/sitemap_index.xml"), 0);
        assert_eq!(candidate_priority("https://x.com/wp-sitemap.xml"), 0);
        assert_eq!(candidate_priority("https://x.com/page-sitemap.xml"), 1);
        assert_eq!(candidate_priority("https://x.com/sitemap1.xml"), 1);
        assert_eq!(candidate_priority("https://x.com/sitemap-42.xml"), 1);
        assert_eq!(candidate_priority("https://x.com/news-sitemap.xml"), 2);
        assert_eq!(candidate_priority("https://x.com/video-sitemap.xml"), 2);
        assert_eq!(candidate_priority("https://x.com/something-else.xml"), 3);
    }

    #[test]
    fn index_priority_beats_content_priority() {
        let mut candidates = vec![
            "https://x.com/news-sitemap.xml".to_string(),
            "https://x.com/sitemap.xml".to_string(),
        ];
        candidates.sort_by_key(|c| candidate_priority(c));
        assert_eq!(candidates[0], "https://x.com/sitemap.xml");
    }

    #[test]
    fn html_payloads_rejected_cheaply() {
        assert!(looks_like_html("<!DOCTYPE html><html><body>404</body></html>"));
        assert!(looks_like_html("  \n<html lang=\"en\">"));
        assert!(!looks_like_html("<?xml version=\"1.0\"?><urlset></urlset>"));
    }

    #[test]
    fn loc_extraction_is_namespace_agnostic() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/a</loc></url>
  <url>
    <sm:loc>https://example.com/b</sm:loc>
  </url>
</urlset>"#;
        assert_eq!(
            extract_loc_values(xml),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn loc_extraction_unescapes_entities() {
        let xml = "<urlset><url><loc>https://example.com/search?q=test&amp;page=1</loc></url></urlset>";
        assert_eq!(
            extract_loc_values(xml),
            vec!["https://example.com/search?q=test&page=1"]
        );
    }

    #[test]
    fn index_root_detected_through_prolog_and_prefix() {
        let xml = r#"<?xml version="1.0"?>
<!-- generated -->
<sm:sitemapindex xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sm:sitemap><sm:loc>https://example.com/sitemap1.xml</sm:loc></sm:sitemap>
</sm:sitemapindex>"#;
        assert!(is_sitemap_index(xml));
        assert!(!is_sitemap_index("<urlset><url><loc>x</loc></url></urlset>"));
    }

    #[test]
    fn numbered_sitemaps_recognized() {
        assert!(is_numbered_sitemap("sitemap1.xml"));
        assert!(is_numbered_sitemap("sitemap-2.xml"));
        assert!(is_numbered_sitemap("sitemap_10.xml"));
        assert!(!is_numbered_sitemap("sitemap.xml"));
        assert!(!is_numbered_sitemap("sitemap-news.xml"));
    }
}
