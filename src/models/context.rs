//! Site-level crawl context.
//!
//! The `CrawlContext` describes one audit run: how URLs were discovered,
//! the per-page signal records, and summary counts derived purely from
//! those records. It is built once after extraction and read-only after.

use serde::{Deserialize, Serialize};

use crate::models::PageSignals;
use crate::utils::normalize_domain;

/// Cap on example entries collected per finding category.
const MAX_EXAMPLES: usize = 10;
/// Cap on duplicate title/meta groups reported.
const MAX_DUPLICATE_GROUPS: usize = 5;
/// Cap on URLs listed per duplicate group.
const MAX_GROUP_URLS: usize = 5;

/// How the audited URL set was discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// A usable sitemap was found and adopted.
    Sitemap { sitemap_url: String },
    /// No usable sitemap; URLs harvested from homepage links (one hop).
    HomepageLinks,
    /// Nothing discovered; the sample is the homepage alone.
    HomepageOnly,
}

impl DiscoveryMethod {
    /// Human-readable description used in reports and LLM grounding.
    pub fn describe(&self) -> String {
        match self {
            Self::Sitemap { sitemap_url } => format!("robots/sitemap ({sitemap_url})"),
            Self::HomepageLinks => "homepage links (no usable sitemap)".to_string(),
            Self::HomepageOnly => "homepage only (no sitemap found)".to_string(),
        }
    }
}

/// A sampled page that returned an error status or no status at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusExample {
    pub url: String,
    pub status: Option<u16>,
}

/// A page carrying a `noindex` robots directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoindexExample {
    pub url: String,
    pub robots: String,
}

/// A page whose canonical points off-domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalExample {
    pub url: String,
    pub canonical: String,
}

/// A page below the thin-content word floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinExample {
    pub url: String,
    pub word_count: usize,
}

/// A group of pages sharing an identical title or meta description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The shared value, truncated for display.
    pub value: String,
    /// Total pages in the group.
    pub count: usize,
    /// Example URLs from the group, capped.
    pub urls: Vec<String>,
}

/// An internal link confirmed broken by the link checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokenLink {
    pub url: String,
    /// `None` when the check itself failed at the transport level.
    pub status: Option<u16>,
}

/// Bounded example lists per finding category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteExamples {
    pub duplicate_titles: Vec<DuplicateGroup>,
    pub duplicate_meta: Vec<DuplicateGroup>,
    pub noindex_examples: Vec<NoindexExample>,
    pub canonical_examples: Vec<CanonicalExample>,
    pub thin_examples: Vec<ThinExample>,
    pub status_examples: Vec<StatusExample>,
    pub broken_links: Vec<BrokenLink>,
}

/// Summary counters folded from the page sequence.
///
/// Recomputable from `CrawlContext::pages` at any time; there is no
/// independent mutation path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub analyzed_pages: usize,
    pub status_4xx_5xx: usize,
    pub redirects: usize,
    pub missing_title: usize,
    pub missing_meta: usize,
    pub missing_h1: usize,
    pub multiple_h1: usize,
    pub noindex_pages: usize,
    pub missing_canonical: usize,
    pub canonical_mismatch: usize,
    pub thin_pages: usize,
    pub total_images_missing_alt: usize,
    pub pages_with_schema: usize,
    pub pages_with_hreflang: usize,
    pub broken_internal_links_checked: usize,
    pub broken_internal_links_found: usize,
}

/// Aggregate description of one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlContext {
    /// Normalized domain under audit.
    pub domain: String,
    /// Month/year stamp for the report.
    pub audit_date: String,
    pub discovery: DiscoveryMethod,
    pub urls_discovered: usize,
    pub urls_analyzed: usize,
    pub summary: CrawlSummary,
    pub examples: SiteExamples,
    pub pages: Vec<PageSignals>,
}

impl CrawlContext {
    /// Fold the page sequence (and link-check output) into a context.
    ///
    /// `thin_threshold` is the detector's thin-content word floor, reused
    /// here so the summary and the detector agree on what "thin" means.
    pub fn build(
        domain: String,
        discovery: DiscoveryMethod,
        urls_discovered: usize,
        pages: Vec<PageSignals>,
        links_checked: usize,
        broken_links: Vec<BrokenLink>,
        thin_threshold: usize,
    ) -> Self {
        let mut summary = CrawlSummary {
            analyzed_pages: pages.len(),
            broken_internal_links_checked: links_checked,
            broken_internal_links_found: broken_links.len(),
            ..CrawlSummary::default()
        };
        let mut examples = SiteExamples {
            broken_links,
            ..SiteExamples::default()
        };

        // Ordered groups keyed by exact title/meta text.
        let mut titles: Vec<(String, Vec<String>)> = Vec::new();
        let mut metas: Vec<(String, Vec<String>)> = Vec::new();

        for page in &pages {
            let url = page.final_url.clone();

            let errored = page.status.is_none() || page.status.is_some_and(|s| s >= 400);
            if errored {
                summary.status_4xx_5xx += 1;
                if examples.status_examples.len() < MAX_EXAMPLES {
                    examples.status_examples.push(StatusExample {
                        url: url.clone(),
                        status: page.status,
                    });
                }
            } else if page.final_url != page.url {
                summary.redirects += 1;
            }

            if page.title.is_empty() {
                summary.missing_title += 1;
            } else {
                push_group(&mut titles, &page.title, &url);
            }

            if page.meta.is_empty() {
                summary.missing_meta += 1;
            } else {
                push_group(&mut metas, &page.meta, &url);
            }

            match page.h1_count {
                0 => summary.missing_h1 += 1,
                1 => {}
                _ => summary.multiple_h1 += 1,
            }

            if page.robots_meta.contains("noindex") {
                summary.noindex_pages += 1;
                if examples.noindex_examples.len() < MAX_EXAMPLES {
                    examples.noindex_examples.push(NoindexExample {
                        url: url.clone(),
                        robots: page.robots_meta.clone(),
                    });
                }
            }

            if page.canonical.is_empty() {
                summary.missing_canonical += 1;
            } else {
                let canonical_abs = resolve_canonical(&url, &page.canonical);
                if normalize_domain(&canonical_abs) != domain {
                    summary.canonical_mismatch += 1;
                    if examples.canonical_examples.len() < MAX_EXAMPLES {
                        examples.canonical_examples.push(CanonicalExample {
                            url: url.clone(),
                            canonical: page.canonical.clone(),
                        });
                    }
                }
            }

            if page.word_count > 0 && page.word_count < thin_threshold {
                summary.thin_pages += 1;
                if examples.thin_examples.len() < MAX_EXAMPLES {
                    examples.thin_examples.push(ThinExample {
                        url: url.clone(),
                        word_count: page.word_count,
                    });
                }
            }

            summary.total_images_missing_alt += page.images_missing_alt;
            if page.jsonld_count > 0 {
                summary.pages_with_schema += 1;
            }
            if page.hreflang_count > 0 {
                summary.pages_with_hreflang += 1;
            }
        }

        examples.duplicate_titles = top_duplicate_groups(titles, 140);
        examples.duplicate_meta = top_duplicate_groups(metas, 160);

        Self {
            domain,
            audit_date: chrono::Utc::now().format("%B %Y").to_string(),
            discovery,
            urls_discovered,
            urls_analyzed: pages.len(),
            summary,
            examples,
            pages,
        }
    }
}

fn push_group(groups: &mut Vec<(String, Vec<String>)>, value: &str, url: &str) {
    if let Some((_, urls)) = groups.iter_mut().find(|(v, _)| v == value) {
        urls.push(url.to_string());
    } else {
        groups.push((value.to_string(), vec![url.to_string()]));
    }
}

/// Keep the largest duplicate groups, biggest first, insertion order on ties.
fn top_duplicate_groups(
    groups: Vec<(String, Vec<String>)>,
    value_chars: usize,
) -> Vec<DuplicateGroup> {
    let mut duplicated: Vec<(String, Vec<String>)> =
        groups.into_iter().filter(|(_, urls)| urls.len() > 1).collect();
    duplicated.sort_by_key(|(_, urls)| std::cmp::Reverse(urls.len()));

    duplicated
        .into_iter()
        .take(MAX_DUPLICATE_GROUPS)
        .map(|(value, mut urls)| {
            let count = urls.len();
            urls.truncate(MAX_GROUP_URLS);
            DuplicateGroup {
                value: value.chars().take(value_chars).collect(),
                count,
                urls,
            }
        })
        .collect()
}

/// Resolve a root-relative canonical against its page URL; anything else is
/// compared as written.
fn resolve_canonical(page_url: &str, canonical: &str) -> String {
    if canonical.starts_with('/') {
        if let Ok(base) = url::Url::parse(page_url) {
            if let Ok(joined) = base.join(canonical) {
                return joined.to_string();
            }
        }
    }
    canonical.to_string()
}
