//! Individual detection rules.
//!
//! Every rule consumes the immutable crawl snapshot and returns either one
//! `Problem` or nothing. Impact and effort are fixed calibration constants
//! per rule, not computed. Pages flagged with an extraction error are
//! skipped by all content rules; the error-status rule handles them.

use crate::config::DetectorConfig;
use crate::models::{BrokenLink, PageSignals, Problem, Severity};
use crate::utils::normalize_url;

/// Normalize and deduplicate a URL list, dropping empties.
fn norm_urls<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for url in urls {
        let normalized = normalize_url(url.as_ref());
        if !normalized.is_empty() && seen.insert(normalized.clone()) {
            result.push(normalized);
        }
    }
    result
}

/// Pages eligible for content-quality rules.
fn valid_pages(pages: &[PageSignals]) -> impl Iterator<Item = &PageSignals> {
    pages.iter().filter(|p| p.is_valid())
}

pub fn detect_missing_title(pages: &[PageSignals]) -> Option<Problem> {
    let urls = norm_urls(
        valid_pages(pages)
            .filter(|p| p.title.is_empty())
            .map(|p| p.final_url.as_str()),
    );
    if urls.is_empty() {
        return None;
    }
    Some(Problem {
        title: "Missing Title Tags".to_string(),
        severity: Severity::Critical,
        description: format!(
            "{} pages have no title tag. The title tag is the single most important on-page SEO element.",
            urls.len()
        ),
        why_it_matters: "The title tag is what Google displays as the clickable headline in search results. Without one, Google must fabricate a title, often producing a poor or irrelevant result that hurts click-through rates.".to_string(),
        how_to_fix: "Add a unique, descriptive title tag (50-60 characters) to every page. Include the primary keyword near the beginning of the title.".to_string(),
        urls,
        impact_score: 9,
        effort_hours: 1.0,
    })
}

pub fn detect_missing_h1(pages: &[PageSignals]) -> Option<Problem> {
    let urls = norm_urls(
        valid_pages(pages)
            .filter(|p| p.h1_count == 0)
            .map(|p| p.final_url.as_str()),
    );
    if urls.is_empty() {
        return None;
    }
    Some(Problem {
        title: "Missing H1 Tags".to_string(),
        severity: Severity::Critical,
        description: format!(
            "{} pages have no H1 heading tag. The H1 is the most important on-page heading signal for search engines.",
            urls.len()
        ),
        why_it_matters: "Google uses the H1 as a primary signal to understand a page's main topic. Pages without an H1 are harder to rank because search engines must guess the topic from other content.".to_string(),
        how_to_fix: "Add a single, descriptive H1 tag to each page that clearly states the page's main topic. Ensure it contains the primary keyword for that page.".to_string(),
        urls,
        impact_score: 9,
        effort_hours: 2.0,
    })
}

pub fn detect_duplicate_titles(pages: &[PageSignals]) -> Option<Problem> {
    let dup_urls = duplicate_group_urls(pages, |p| &p.title);
    let urls = norm_urls(dup_urls);
    if urls.is_empty() {
        return None;
    }
    Some(Problem {
        title: "Duplicate Title Tags".to_string(),
        severity: Severity::Critical,
        description: format!(
            "{} pages share a title tag with at least one other page. Each page needs a unique title for Google to distinguish them.",
            urls.len()
        ),
        why_it_matters: "Duplicate titles cause keyword cannibalization - Google doesn't know which page to rank for a given query, so both pages rank worse. It also confuses users who see identical titles in search results.".to_string(),
        how_to_fix: "Write a unique title for each page that reflects its specific content. Use the primary keyword for that page and differentiate from similar pages.".to_string(),
        urls,
        impact_score: 8,
        effort_hours: 1.0,
    })
}

pub fn detect_duplicate_meta(pages: &[PageSignals]) -> Option<Problem> {
    let dup_urls = duplicate_group_urls(pages, |p| &p.meta);
    let urls = norm_urls(dup_urls);
    if urls.is_empty() {
        return None;
    }
    Some(Problem {
        title: "Duplicate Meta Descriptions".to_string(),
        severity: Severity::Critical,
        description: format!(
            "{} pages share a meta description with at least one other page. Each page should have a unique meta description.",
            urls.len()
        ),
        why_it_matters: "Duplicate meta descriptions mean Google sees the same snippet for multiple pages, reducing click-through rates and making it harder for search engines to differentiate pages.".to_string(),
        how_to_fix: "Write a unique, compelling meta description (120-155 characters) for each page that accurately describes its specific content and includes relevant keywords.".to_string(),
        urls,
        impact_score: 8,
        effort_hours: 1.0,
    })
}

/// URLs of every page whose field value is shared with at least one other
/// page. Grouping is exact string equality on the extracted value; no case
/// folding or extra trimming is applied.
fn duplicate_group_urls<'a, F>(pages: &'a [PageSignals], field: F) -> Vec<&'a str>
where
    F: Fn(&PageSignals) -> &String,
{
    let mut order: Vec<&str> = Vec::new();
    let mut groups: std::collections::HashMap<&str, Vec<&str>> = std::collections::HashMap::new();
    for page in valid_pages(pages) {
        let value = field(page).as_str();
        if value.is_empty() {
            continue;
        }
        let entry = groups.entry(value).or_default();
        if entry.is_empty() {
            order.push(value);
        }
        entry.push(page.final_url.as_str());
    }

    let mut dup_urls = Vec::new();
    for value in order {
        if let Some(urls) = groups.get(value) {
            if urls.len() > 1 {
                dup_urls.extend(urls.iter().copied());
            }
        }
    }
    dup_urls
}

pub fn detect_thin_content(pages: &[PageSignals], threshold: usize) -> Option<Problem> {
    let urls = norm_urls(
        valid_pages(pages)
            .filter(|p| p.word_count > 0 && p.word_count < threshold)
            .map(|p| p.final_url.as_str()),
    );
    if urls.is_empty() {
        return None;
    }
    Some(Problem {
        title: "Thin Content".to_string(),
        severity: Severity::Critical,
        description: format!(
            "{} pages have fewer than {} words. Pages with very little content are harder to rank and may be seen as low-quality by Google.",
            urls.len(),
            threshold
        ),
        why_it_matters: "Google's Helpful Content system penalises pages that don't provide enough value. Thin pages also have fewer keyword opportunities and are less likely to satisfy search intent.".to_string(),
        how_to_fix: "Expand each thin page with relevant, useful content - aim for at least 300-500 words. If a page truly has nothing to add, consider consolidating it with a related page or setting it to noindex.".to_string(),
        urls,
        impact_score: 8,
        effort_hours: 4.0,
    })
}

pub fn detect_broken_links(broken: &[BrokenLink]) -> Option<Problem> {
    let urls = norm_urls(broken.iter().map(|b| b.url.as_str()));
    if urls.is_empty() {
        return None;
    }
    Some(Problem {
        title: "Broken Internal Links".to_string(),
        severity: Severity::Critical,
        description: format!(
            "{} internal links point to pages that return errors (4xx/5xx). Visitors and search engine crawlers hit dead ends.",
            urls.len()
        ),
        why_it_matters: "Broken links waste crawl budget, create poor user experience, and leak link equity into nowhere. Google may also see excessive broken links as a sign of poor site maintenance.".to_string(),
        how_to_fix: "For each broken link: update the href to point to the correct page, redirect the broken URL to a relevant replacement, or remove the link entirely if the content no longer exists.".to_string(),
        urls,
        impact_score: 9,
        effort_hours: 0.5,
    })
}

pub fn detect_pages_with_errors(pages: &[PageSignals]) -> Option<Problem> {
    let urls = norm_urls(
        pages
            .iter()
            .filter(|p| p.status.is_none() || p.status.is_some_and(|s| s >= 400))
            .map(|p| p.url.as_str()),
    );
    if urls.is_empty() {
        return None;
    }
    Some(Problem {
        title: "Pages Returning Error Status".to_string(),
        severity: Severity::Critical,
        description: format!(
            "{} URLs from the sitemap return 4xx or 5xx errors. These are dead pages that Google is being told to crawl.",
            urls.len()
        ),
        why_it_matters: "Having error pages in the sitemap wastes crawl budget and sends negative quality signals. Google expects every URL in a sitemap to return a 200 status. Stale sitemap entries degrade overall crawl efficiency.".to_string(),
        how_to_fix: "Remove the dead URLs from the sitemap. If the content has moved, add 301 redirects to the new locations. If the content is permanently gone, let the 404 or 410 stand but remove from sitemap.".to_string(),
        urls,
        impact_score: 8,
        effort_hours: 1.0,
    })
}

pub fn detect_multiple_h1(pages: &[PageSignals]) -> Option<Problem> {
    let urls = norm_urls(
        valid_pages(pages)
            .filter(|p| p.h1_count > 1)
            .map(|p| p.final_url.as_str()),
    );
    if urls.is_empty() {
        return None;
    }
    Some(Problem {
        title: "Multiple H1 Tags".to_string(),
        severity: Severity::Warning,
        description: format!(
            "{} pages have more than one H1 tag. While not a fatal error, having a single H1 gives a clearer topical signal.",
            urls.len()
        ),
        why_it_matters: "Multiple H1s dilute the main heading signal. Google can handle them, but a single H1 provides a stronger, unambiguous indication of the page's primary topic.".to_string(),
        how_to_fix: "Keep one H1 per page for the main topic. Demote additional H1 tags to H2 or H3 as appropriate for sub-sections.".to_string(),
        urls,
        impact_score: 6,
        effort_hours: 1.0,
    })
}

pub fn detect_title_too_long(pages: &[PageSignals], max_chars: usize) -> Option<Problem> {
    let urls = norm_urls(
        valid_pages(pages)
            .filter(|p| !p.title.is_empty() && p.title.chars().count() > max_chars)
            .map(|p| p.final_url.as_str()),
    );
    if urls.is_empty() {
        return None;
    }
    Some(Problem {
        title: "Title Tags Too Long".to_string(),
        severity: Severity::Warning,
        description: format!(
            "{} pages have title tags longer than {} characters. Google typically truncates titles beyond this length in search results.",
            urls.len(),
            max_chars
        ),
        why_it_matters: "Truncated titles lose their full message in search results, which can lower click-through rates. Users may not understand what the page is about.".to_string(),
        how_to_fix: "Rewrite titles to 50-60 characters, front-loading the most important keywords. Move secondary information to the meta description.".to_string(),
        urls,
        impact_score: 5,
        effort_hours: 2.0,
    })
}

pub fn detect_missing_meta(pages: &[PageSignals]) -> Option<Problem> {
    let urls = norm_urls(
        valid_pages(pages)
            .filter(|p| p.meta.is_empty())
            .map(|p| p.final_url.as_str()),
    );
    if urls.is_empty() {
        return None;
    }
    Some(Problem {
        title: "Missing Meta Descriptions".to_string(),
        severity: Severity::Warning,
        description: format!(
            "{} pages have no meta description. Google will auto-generate a snippet, which may not represent the page well.",
            urls.len()
        ),
        why_it_matters: "Without a meta description, Google picks a random passage from the page as the search snippet. A well-crafted meta description improves click-through rates by giving searchers a clear reason to click.".to_string(),
        how_to_fix: "Add a unique meta description (120-155 characters) to each page. Summarise the page's value proposition and include the primary keyword naturally.".to_string(),
        urls,
        impact_score: 7,
        effort_hours: 1.5,
    })
}

/// Site-wide structured-data rule. A single page lacking JSON-LD is not a
/// finding; only a site-wide pattern (high ratio and an absolute floor) is.
pub fn detect_missing_schema(pages: &[PageSignals], config: &DetectorConfig) -> Option<Problem> {
    let mut total_valid = 0usize;
    let mut without: Vec<&str> = Vec::new();
    for page in valid_pages(pages) {
        total_valid += 1;
        if page.jsonld_count == 0 {
            without.push(page.final_url.as_str());
        }
    }
    if total_valid == 0 {
        return None;
    }

    let ratio = without.len() as f64 / total_valid as f64;
    if ratio < config.schema_missing_ratio || without.len() < config.schema_min_pages {
        return None;
    }

    let missing_count = without.len();
    without.truncate(config.schema_url_cap);
    let urls = norm_urls(without);
    Some(Problem {
        title: "Missing Structured Data".to_string(),
        severity: Severity::Warning,
        description: format!(
            "{} of {} analyzed pages ({:.0}%) have no JSON-LD structured data. The site is missing rich snippet opportunities.",
            missing_count,
            total_valid,
            ratio * 100.0
        ),
        why_it_matters: "Structured data (JSON-LD) enables rich results in Google - star ratings, FAQ accordions, breadcrumbs, and more. Sites with rich snippets get significantly higher click-through rates.".to_string(),
        how_to_fix: "Add JSON-LD schema markup to your pages. Start with the most impactful types: Article for blog posts, Product for e-commerce, LocalBusiness for local sites, or Organization for the homepage.".to_string(),
        urls,
        impact_score: 5,
        effort_hours: 3.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, title: &str, meta: &str) -> PageSignals {
        PageSignals {
            url: url.to_string(),
            final_url: url.to_string(),
            status: Some(200),
            content_type: Some("text/html".to_string()),
            error: None,
            title: title.to_string(),
            title_len: title.chars().count(),
            meta: meta.to_string(),
            meta_len: meta.chars().count(),
            canonical: String::new(),
            robots_meta: String::new(),
            h1_count: 1,
            word_count: 500,
            images_total: 0,
            images_missing_alt: 0,
            hreflang_count: 0,
            jsonld_count: 1,
            sample_internal_links: Vec::new(),
        }
    }

    #[test]
    fn no_missing_titles_means_no_problem() {
        let pages = vec![
            page("https://example.com/a", "A", "ma"),
            page("https://example.com/b", "B", "mb"),
        ];
        assert!(detect_missing_title(&pages).is_none());
    }

    #[test]
    fn duplicate_titles_groups_exact_matches_only() {
        let pages = vec![
            page("https://example.com/a", "X", "ma"),
            page("https://example.com/b", "X", "mb"),
            page("https://example.com/c", "Y", "mc"),
        ];
        let problem = detect_duplicate_titles(&pages).expect("problem");
        assert_eq!(problem.severity, Severity::Critical);
        let urls: std::collections::HashSet<&str> =
            problem.urls.iter().map(String::as_str).collect();
        assert_eq!(
            urls,
            ["https://example.com/a", "https://example.com/b"].into_iter().collect()
        );
    }

    #[test]
    fn duplicate_titles_are_case_sensitive() {
        let pages = vec![
            page("https://example.com/a", "Widgets", "ma"),
            page("https://example.com/b", "widgets", "mb"),
        ];
        assert!(detect_duplicate_titles(&pages).is_none());
    }

    #[test]
    fn www_variants_deduplicate_in_finding_urls() {
        let pages = vec![
            page("https://www.example.com/a", "", "m"),
            page("https://example.com/a", "", "m2"),
        ];
        let problem = detect_missing_title(&pages).expect("problem");
        assert_eq!(problem.urls, vec!["https://example.com/a"]);
    }

    #[test]
    fn error_pages_excluded_from_content_rules() {
        let failed = PageSignals::request_failed("https://example.com/down");
        assert!(detect_missing_title(&[failed.clone()]).is_none());
        assert!(detect_missing_h1(&[failed.clone()]).is_none());
        assert!(detect_missing_meta(&[failed]).is_none());
    }

    #[test]
    fn thin_content_requires_nonzero_word_count() {
        let mut thin = page("https://example.com/thin", "T", "m");
        thin.word_count = 120;
        let mut empty = page("https://example.com/empty", "T2", "m2");
        empty.word_count = 0;

        let problem = detect_thin_content(&[thin, empty], 300).expect("problem");
        assert_eq!(problem.urls, vec!["https://example.com/thin"]);
    }

    #[test]
    fn schema_rule_needs_site_wide_pattern() {
        let mut pages: Vec<PageSignals> = (0..10)
            .map(|i| page(&format!("https://example.com/p{i}"), "T", "m"))
            .collect();

        // 2 of 10 lacking: below both the ratio and the floor.
        for p in pages.iter_mut().take(2) {
            p.jsonld_count = 0;
        }
        assert!(detect_missing_schema(&pages, &DetectorConfig::default()).is_none());

        // 8 of 10 lacking: fires.
        for p in pages.iter_mut().take(8) {
            p.jsonld_count = 0;
        }
        let problem =
            detect_missing_schema(&pages, &DetectorConfig::default()).expect("problem");
        assert_eq!(problem.urls.len(), 8);
        assert!(problem.description.contains("8 of 10"));
    }

    #[test]
    fn error_status_rule_reports_requested_urls() {
        let mut redirected_error = page("https://example.com/old", "T", "m");
        redirected_error.final_url = "https://example.com/new".to_string();
        redirected_error.status = Some(404);
        let failed = PageSignals::request_failed("https://example.com/down");

        let problem =
            detect_pages_with_errors(&[redirected_error, failed]).expect("problem");
        assert_eq!(
            problem.urls,
            vec!["https://example.com/old", "https://example.com/down"]
        );
    }

    #[test]
    fn broken_links_rule_requires_entries() {
        assert!(detect_broken_links(&[]).is_none());
        let broken = vec![
            BrokenLink {
                url: "https://www.example.com/x".to_string(),
                status: Some(404),
            },
            BrokenLink {
                url: "https://example.com/x".to_string(),
                status: Some(410),
            },
        ];
        let problem = detect_broken_links(&broken).expect("problem");
        assert_eq!(problem.urls, vec!["https://example.com/x"]);
        assert_eq!(problem.priority_score(), 18.0);
    }

    #[test]
    fn title_length_measured_in_chars() {
        let mut long = page("https://example.com/l", &"x".repeat(61), "m");
        long.title_len = 61;
        let ok = page("https://example.com/ok", &"x".repeat(60), "m2");
        let problem = detect_title_too_long(&[long, ok], 60).expect("problem");
        assert_eq!(problem.urls, vec!["https://example.com/l"]);
    }
}
