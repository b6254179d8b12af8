//! Deterministic SEO problem detection.
//!
//! A fixed, closed set of rules runs over the crawl snapshot. Each rule
//! either finds affected URLs and emits exactly one `Problem`, or emits
//! nothing at all. Quick wins are the top findings ranked by
//! impact-to-effort, drawn from the same set the severity partitions use.

mod rules;

use tracing::info;

use crate::config::DetectorConfig;
use crate::models::{BrokenLink, DetectionResult, PageSignals, Problem, Severity};

/// Number of findings surfaced as quick wins.
const QUICK_WIN_COUNT: usize = 5;

/// Run every detection rule and assemble the result triple.
pub fn detect_problems(
    pages: &[PageSignals],
    broken_links: &[BrokenLink],
    config: &DetectorConfig,
) -> DetectionResult {
    let candidates = [
        rules::detect_missing_h1(pages),
        rules::detect_duplicate_meta(pages),
        rules::detect_thin_content(pages, config.thin_content_threshold),
        rules::detect_multiple_h1(pages),
        rules::detect_title_too_long(pages, config.title_max_chars),
        rules::detect_missing_meta(pages),
        rules::detect_broken_links(broken_links),
        rules::detect_missing_title(pages),
        rules::detect_duplicate_titles(pages),
        rules::detect_missing_schema(pages, config),
        rules::detect_pages_with_errors(pages),
    ];

    let mut problems: Vec<Problem> = Vec::new();
    for problem in candidates.into_iter().flatten() {
        // Rules uphold this themselves; a zero-URL finding is a bug.
        debug_assert!(!problem.urls.is_empty());
        info!("detected: {} ({} URLs)", problem.title, problem.urls.len());
        problems.push(problem);
    }

    let critical_errors: Vec<Problem> = problems
        .iter()
        .filter(|p| p.severity == Severity::Critical)
        .cloned()
        .collect();
    let warnings: Vec<Problem> = problems
        .iter()
        .filter(|p| p.severity == Severity::Warning)
        .cloned()
        .collect();

    // Stable sort: ties keep rule evaluation order.
    let mut ranked = problems;
    ranked.sort_by(|a, b| {
        b.priority_score()
            .partial_cmp(&a.priority_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let quick_wins: Vec<Problem> = ranked.into_iter().take(QUICK_WIN_COUNT).collect();

    info!(
        "detection complete: {} critical, {} warnings, {} quick wins",
        critical_errors.len(),
        warnings.len(),
        quick_wins.len()
    );

    DetectionResult {
        quick_wins,
        critical_errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, title: &str, meta: &str, h1: usize, wc: usize) -> PageSignals {
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
            h1_count: h1,
            word_count: wc,
            images_total: 0,
            images_missing_alt: 0,
            hreflang_count: 0,
            jsonld_count: 1,
            sample_internal_links: Vec::new(),
        }
    }

    #[test]
    fn healthy_pages_produce_no_problems() {
        let pages = vec![
            page("https://example.com/", "Home", "The homepage.", 1, 600),
            page("https://example.com/a", "Page A", "About A.", 1, 700),
        ];
        let result = detect_problems(&pages, &[], &DetectorConfig::default());
        assert!(result.quick_wins.is_empty());
        assert!(result.critical_errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn quick_wins_ranked_by_priority_score() {
        // Broken links: 9/0.5 = 18, thin content: 8/4 = 2,
        // title too long: 5/2 = 2.5, missing meta: 7/1.5 ~= 4.7.
        let long_title = "T".repeat(70);
        let pages = vec![
            page("https://example.com/a", &long_title, "", 1, 100),
            page("https://example.com/b", "B", "x", 1, 800),
        ];
        let broken = vec![BrokenLink {
            url: "https://example.com/dead".to_string(),
            status: Some(404),
        }];
        let result = detect_problems(&pages, &broken, &DetectorConfig::default());

        let scores: Vec<f64> = result.quick_wins.iter().map(Problem::priority_score).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        assert_eq!(scores, sorted);
        assert_eq!(result.quick_wins[0].title, "Broken Internal Links");
        assert_eq!(result.quick_wins[0].priority_score(), 18.0);
    }

    #[test]
    fn quick_wins_capped_at_five() {
        let long_title = "T".repeat(70);
        let pages = vec![
            page("https://example.com/a", "", "", 0, 100),
            page("https://example.com/b", "", "", 0, 50),
            page("https://example.com/c", &long_title, "", 3, 40),
        ];
        let broken = vec![BrokenLink {
            url: "https://example.com/dead".to_string(),
            status: None,
        }];
        let result = detect_problems(&pages, &broken, &DetectorConfig::default());
        assert!(result.quick_wins.len() <= 5);
        assert!(result.critical_errors.len() + result.warnings.len() >= 5);
    }
}
