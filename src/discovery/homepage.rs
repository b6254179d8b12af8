//! Homepage link harvesting, the last-resort discovery source.

use scraper::{Html, Selector};
use tracing::debug;

use crate::scrapers::HttpClient;
use crate::utils::normalize_domain;

/// Harvest same-domain links from the homepage (one hop).
///
/// Used only when no sitemap yields anything. Fetch failures yield an
/// empty list, leaving the homepage-only fallback to the caller.
pub async fn harvest_links(http: &HttpClient, base_url: &str, domain: &str) -> Vec<String> {
    let Some(body) = http.get_text(base_url).await else {
        debug!("homepage fetch failed for {}", base_url);
        return Vec::new();
    };
    links_from_html(&body, base_url, domain)
}

fn links_from_html(html: &str, base_url: &str, domain: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").expect("static selector");

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&anchors) {
        let href = anchor.value().attr("href").map(str::trim).unwrap_or("");
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("javascript:")
        {
            continue;
        }
        let absolute = if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            match url::Url::parse(base_url).and_then(|base| base.join(href)) {
                Ok(joined) => joined.to_string(),
                Err(_) => continue,
            }
        };
        if normalize_domain(&absolute) == domain && seen.insert(absolute.clone()) {
            links.push(absolute);
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harvests_same_domain_links_once() {
        let html = r#"<html><body>
<a href="/about">about</a>
<a href="https://example.com/pricing">pricing</a>
<a href="https://example.com/pricing">pricing again</a>
<a href="https://other.net/x">external</a>
<a href="mailto:hi@example.com">mail</a>
</body></html>"#;
        let links = links_from_html(html, "https://example.com", "example.com");
        assert_eq!(
            links,
            vec!["https://example.com/about", "https://example.com/pricing"]
        );
    }
}
