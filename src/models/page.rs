//! Per-page signal records.
//!
//! One `PageSignals` is produced for every sampled URL. Records are built
//! once by the extractor and never mutated afterwards; every detection rule
//! reads the same immutable snapshot.

use serde::{Deserialize, Serialize};

/// Why a page produced no usable content signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageError {
    /// The request itself failed (timeout, DNS, connection refused).
    RequestFailed,
    /// The server answered with something other than HTML.
    NonHtml,
}

/// On-page signals extracted from a single sampled URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSignals {
    /// URL as requested.
    pub url: String,
    /// URL after redirects; equals `url` when no redirect occurred.
    pub final_url: String,
    /// HTTP status. `None` only when the transport failed -- a server
    /// returned 4xx/5xx is still a real status.
    pub status: Option<u16>,
    /// Response content type, lowercased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Set when the page yielded no content signals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
    /// Title tag text, trimmed.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_len: usize,
    /// Meta description content, trimmed.
    #[serde(default)]
    pub meta: String,
    #[serde(default)]
    pub meta_len: usize,
    /// Canonical link target as written in the markup (possibly relative).
    #[serde(default)]
    pub canonical: String,
    /// Robots meta directive, lowercased.
    #[serde(default)]
    pub robots_meta: String,
    #[serde(default)]
    pub h1_count: usize,
    /// Whitespace-tokenized visible text word count.
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub images_total: usize,
    #[serde(default)]
    pub images_missing_alt: usize,
    /// Count of `hreflang` alternate links.
    #[serde(default)]
    pub hreflang_count: usize,
    /// Count of JSON-LD structured-data script blocks.
    #[serde(default)]
    pub jsonld_count: usize,
    /// Same-domain links collected from the page, capped per page.
    #[serde(default)]
    pub sample_internal_links: Vec<String>,
}

impl PageSignals {
    /// Minimal record for a URL whose request never produced a response.
    pub fn request_failed(url: &str) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            status: None,
            content_type: None,
            error: Some(PageError::RequestFailed),
            ..Self::blank()
        }
    }

    /// Minimal record for a non-HTML resource. Counted in discovery but
    /// excluded from content-quality rules.
    pub fn non_html(url: &str, final_url: String, status: u16, content_type: String) -> Self {
        Self {
            url: url.to_string(),
            final_url,
            status: Some(status),
            content_type: Some(content_type),
            error: Some(PageError::NonHtml),
            ..Self::blank()
        }
    }

    /// Whether this page contributes to content-quality rules.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    fn blank() -> Self {
        Self {
            url: String::new(),
            final_url: String::new(),
            status: None,
            content_type: None,
            error: None,
            title: String::new(),
            title_len: 0,
            meta: String::new(),
            meta_len: 0,
            canonical: String::new(),
            robots_meta: String::new(),
            h1_count: 0,
            word_count: 0,
            images_total: 0,
            images_missing_alt: 0,
            hreflang_count: 0,
            jsonld_count: 0,
            sample_internal_links: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_has_no_status() {
        let page = PageSignals::request_failed("https://example.com/x");
        assert_eq!(page.status, None);
        assert_eq!(page.final_url, page.url);
        assert_eq!(page.error, Some(PageError::RequestFailed));
        assert!(!page.is_valid());
    }

    #[test]
    fn non_html_keeps_server_status() {
        let page = PageSignals::non_html(
            "https://example.com/doc",
            "https://example.com/doc.pdf".to_string(),
            200,
            "application/pdf".to_string(),
        );
        assert_eq!(page.status, Some(200));
        assert_eq!(page.content_type.as_deref(), Some("application/pdf"));
        assert!(!page.is_valid());
    }
}
