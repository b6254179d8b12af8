//! Per-page signal extraction.
//!
//! Fetches one sampled URL and pulls the fixed on-page signal set out of
//! the HTML. Transport failures and non-HTML responses degrade to marker
//! records; nothing here raises past the caller.

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::models::PageSignals;
use crate::scrapers::HttpClient;
use crate::utils::normalize_domain;

/// Fetch a URL and extract its on-page signals.
///
/// `base_domain` is the audit's normalized domain, used for the internal
/// link membership test. `max_links` caps the links collected per page.
pub async fn extract_page_signals(
    http: &HttpClient,
    url: &str,
    base_domain: &str,
    max_links: usize,
) -> PageSignals {
    let response = match http.get(url).await {
        Ok(r) => r,
        Err(e) => {
            debug!("request failed for {}: {}", url, e);
            return PageSignals::request_failed(url);
        }
    };

    let final_url = response.url().to_string();
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !content_type.contains("text/html") {
        return PageSignals::non_html(url, final_url, status, content_type);
    }

    let body = match response.text().await {
        Ok(t) => t,
        Err(e) => {
            debug!("failed to read body for {}: {}", url, e);
            return PageSignals::request_failed(url);
        }
    };

    signals_from_html(url, &final_url, status, &content_type, &body, base_domain, max_links)
}

/// Pull the signal set out of already-fetched HTML.
pub fn signals_from_html(
    url: &str,
    final_url: &str,
    status: u16,
    content_type: &str,
    html: &str,
    base_domain: &str,
    max_links: usize,
) -> PageSignals {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector("title"))
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let meta = document
        .select(&selector(r#"meta[name="description"]"#))
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    let canonical = document
        .select(&selector("link"))
        .find(|el| {
            el.value()
                .attr("rel")
                .is_some_and(|rel| rel.to_ascii_lowercase().contains("canonical"))
        })
        .and_then(|el| el.value().attr("href"))
        .map(|h| h.trim().to_string())
        .unwrap_or_default();

    let robots_meta = document
        .select(&selector("meta"))
        .find(|el| {
            el.value()
                .attr("name")
                .is_some_and(|n| n.eq_ignore_ascii_case("robots"))
        })
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let h1_count = document.select(&selector("h1")).count();

    let mut text = String::new();
    collect_visible_text(document.root_element(), &mut text);
    let word_count = text.split_whitespace().count();

    let mut images_total = 0;
    let mut images_missing_alt = 0;
    for img in document.select(&selector("img")) {
        images_total += 1;
        let alt = img.value().attr("alt").map(str::trim).unwrap_or("");
        if alt.is_empty() {
            images_missing_alt += 1;
        }
    }

    let hreflang_count = document
        .select(&selector("link"))
        .filter(|el| {
            el.value()
                .attr("rel")
                .is_some_and(|rel| rel.to_ascii_lowercase().contains("alternate"))
                && el.value().attr("hreflang").is_some()
        })
        .count();

    let jsonld_count = document
        .select(&selector(r#"script[type="application/ld+json"]"#))
        .count();

    let mut sample_internal_links = Vec::new();
    for anchor in document.select(&selector("a[href]")) {
        if sample_internal_links.len() >= max_links {
            break;
        }
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
            match url::Url::parse(final_url).and_then(|base| base.join(href)) {
                Ok(joined) => joined.to_string(),
                Err(_) => continue,
            }
        };
        if normalize_domain(&absolute) == base_domain {
            sample_internal_links.push(absolute);
        }
    }

    PageSignals {
        url: url.to_string(),
        final_url: final_url.to_string(),
        status: Some(status),
        content_type: Some(content_type.to_string()),
        error: None,
        title_len: title.chars().count(),
        title,
        meta_len: meta.chars().count(),
        meta,
        canonical,
        robots_meta,
        h1_count,
        word_count,
        images_total,
        images_missing_alt,
        hreflang_count,
        jsonld_count,
        sample_internal_links,
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Gather text nodes, skipping markup that never renders.
fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    if matches!(
        element.value().name(),
        "script" | "style" | "noscript" | "template"
    ) {
        return;
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_visible_text(child_element, out);
        } else if let Node::Text(text) = child.value() {
            out.push(' ');
            out.push_str(&text.text);
        }
    }
}
