//! Internal link validation.
//!
//! Checks a capped pool of internal links for broken status. HEAD is tried
//! first; an error status or a failed HEAD escalates to a full GET, since
//! some servers answer HEAD incorrectly. Checking stops early once the
//! broken-link cap is reached.

use tracing::{debug, info};

use crate::config::LinkCheckConfig;
use crate::models::BrokenLink;
use crate::scrapers::HttpClient;

/// Outcome of validating the link pool.
#[derive(Debug, Clone, Default)]
pub struct LinkCheckReport {
    /// Links confirmed reachable.
    pub ok: usize,
    /// Links confirmed broken, capped.
    pub broken: Vec<BrokenLink>,
}

/// Validate each link in the pool, pacing between checks.
///
/// A link is broken iff its final determined status is >= 400 or no status
/// could be obtained at all.
pub async fn check_links(
    http: &HttpClient,
    links: &[String],
    config: &LinkCheckConfig,
    mut on_checked: impl FnMut(usize, usize),
) -> LinkCheckReport {
    let mut report = LinkCheckReport::default();

    for (index, link) in links.iter().enumerate() {
        let status = determine_status(http, link).await;

        match status {
            Some(code) if code < 400 => report.ok += 1,
            _ => {
                debug!("broken link {} (status {:?})", link, status);
                report.broken.push(BrokenLink {
                    url: link.clone(),
                    status,
                });
            }
        }

        on_checked(index + 1, links.len());

        if report.broken.len() >= config.max_broken {
            info!(
                "broken-link cap reached after {} of {} checks",
                index + 1,
                links.len()
            );
            break;
        }
    }

    report
}

/// HEAD first, then GET when the HEAD status is unusable or an error.
async fn determine_status(http: &HttpClient, link: &str) -> Option<u16> {
    let head_status = match http.head(link).await {
        Ok(response) => Some(response.status().as_u16()),
        Err(_) => None,
    };

    match head_status {
        Some(code) if code < 400 => Some(code),
        _ => match http.get(link).await {
            Ok(response) => Some(response.status().as_u16()),
            Err(_) => None,
        },
    }
}

/// Build the global link pool: deduplicated sample links across pages in
/// page order, capped.
pub fn collect_link_pool(pages: &[crate::models::PageSignals], max_checks: usize) -> Vec<String> {
    let mut pool = Vec::new();
    for page in pages {
        for link in &page.sample_internal_links {
            if pool.len() >= max_checks {
                return pool;
            }
            if !pool.contains(link) {
                pool.push(link.clone());
            }
        }
    }
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageSignals;

    fn page_with_links(url: &str, links: &[&str]) -> PageSignals {
        let mut page = PageSignals::request_failed(url);
        page.error = None;
        page.status = Some(200);
        page.sample_internal_links = links.iter().map(|l| l.to_string()).collect();
        page
    }

    #[test]
    fn pool_deduplicates_in_page_order() {
        let pages = vec![
            page_with_links("https://example.com/a", &["https://example.com/1", "https://example.com/2"]),
            page_with_links("https://example.com/b", &["https://example.com/2", "https://example.com/3"]),
        ];
        let pool = collect_link_pool(&pages, 180);
        assert_eq!(
            pool,
            vec![
                "https://example.com/1",
                "https://example.com/2",
                "https://example.com/3",
            ]
        );
    }

    #[test]
    fn pool_respects_global_cap() {
        let links: Vec<String> = (0..50).map(|i| format!("https://example.com/{i}")).collect();
        let refs: Vec<&str> = links.iter().map(String::as_str).collect();
        let pages = vec![page_with_links("https://example.com/", &refs)];
        assert_eq!(collect_link_pool(&pages, 10).len(), 10);
    }
}
