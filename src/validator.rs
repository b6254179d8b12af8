//! Result validation.
//!
//! Runs after detection and before any rendering or export. Catches HTML
//! leaks, quick-win/detail mismatches, duplicate URLs, and placeholder
//! text. Every violation is accumulated so the whole failure set is
//! visible at once; any violation makes the run fatal.

use std::collections::HashSet;

use tracing::{error, info};

use crate::models::{DetectionResult, Problem};

/// Known filler phrases that must never reach a report. A plain substring
/// scan is deliberate: this guards specific observed failure modes of the
/// narrative collaborator, nothing more general.
const FORBIDDEN_PHRASES: &[&str] = &[
    "Not explicitly listed",
    "identified in crawl_summary",
    "see sample",
    "<p class=",
    "<div class=",
    "Not collected in this audit",
];

/// A non-empty set of structural violations. Fatal for the audit run.
#[derive(Debug, thiserror::Error)]
#[error("result validation failed:\n{}", bullet_list(.violations))]
pub struct ValidationError {
    pub violations: Vec<String>,
}

fn bullet_list(violations: &[String]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check the detection result's structural invariants.
///
/// These hold by construction when quick wins are drawn unmodified from
/// the detailed partitions; the validator re-checks them as a safety net
/// against regressions and against collaborator output leaking in.
pub fn validate_results(result: &DetectionResult) -> Result<(), ValidationError> {
    let mut violations: Vec<String> = Vec::new();

    // 1. Every quick win must match a detailed entry with the same URL set.
    let detailed: Vec<&Problem> = result
        .critical_errors
        .iter()
        .chain(result.warnings.iter())
        .collect();
    for quick_win in &result.quick_wins {
        match detailed.iter().find(|p| p.title == quick_win.title) {
            None => violations.push(format!(
                "quick win '{}' has no matching entry in critical_errors or warnings",
                quick_win.title
            )),
            Some(matched) => {
                let qw_urls: HashSet<&str> = quick_win.urls.iter().map(String::as_str).collect();
                let detail_urls: HashSet<&str> = matched.urls.iter().map(String::as_str).collect();
                if qw_urls != detail_urls {
                    violations.push(format!(
                        "quick win '{}' URL list differs from its detail entry ({} vs {} URLs)",
                        quick_win.title,
                        quick_win.urls.len(),
                        matched.urls.len()
                    ));
                }
            }
        }
    }

    let all_problems: Vec<&Problem> = result
        .quick_wins
        .iter()
        .chain(result.critical_errors.iter())
        .chain(result.warnings.iter())
        .collect();

    // 2. No markup anywhere in the free-text fields.
    for problem in &all_problems {
        for (field_name, value) in text_fields(problem) {
            if value.is_empty() {
                continue;
            }
            if value.contains('<') && value.contains('>') {
                violations.push(format!(
                    "possible HTML in '{}'.{}: {:?}",
                    problem.title,
                    field_name,
                    truncate(value, 80)
                ));
            }
            if value.contains("&lt;") || value.contains("&gt;") || value.contains("&amp;") {
                violations.push(format!(
                    "HTML entity in '{}'.{}: {:?}",
                    problem.title,
                    field_name,
                    truncate(value, 80)
                ));
            }
        }
    }

    // 3. No duplicate URLs within a single problem.
    for problem in &all_problems {
        let unique: HashSet<&str> = problem.urls.iter().map(String::as_str).collect();
        if unique.len() != problem.urls.len() {
            violations.push(format!(
                "duplicate URLs in '{}' (check www normalization)",
                problem.title
            ));
        }
    }

    // 4. No placeholder or hallucinated filler text.
    for problem in &all_problems {
        let full_text = format!(
            "{} {} {}",
            problem.description, problem.why_it_matters, problem.how_to_fix
        );
        for phrase in FORBIDDEN_PHRASES {
            if full_text.contains(phrase) {
                violations.push(format!(
                    "forbidden text in '{}': contains '{}'",
                    problem.title, phrase
                ));
            }
        }
    }

    if !violations.is_empty() {
        let failure = ValidationError { violations };
        error!("{}", failure);
        return Err(failure);
    }

    info!("validation passed ({} problems checked)", all_problems.len());
    Ok(())
}

fn text_fields(problem: &Problem) -> [(&'static str, &str); 4] {
    [
        ("title", problem.title.as_str()),
        ("description", problem.description.as_str()),
        ("why_it_matters", problem.why_it_matters.as_str()),
        ("how_to_fix", problem.how_to_fix.as_str()),
    ]
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn problem(title: &str, urls: &[&str]) -> Problem {
        Problem {
            title: title.to_string(),
            severity: Severity::Critical,
            description: "Pages are affected.".to_string(),
            why_it_matters: "It matters.".to_string(),
            how_to_fix: "Fix it.".to_string(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
            impact_score: 8,
            effort_hours: 1.0,
        }
    }

    fn result_with(quick_wins: Vec<Problem>, critical: Vec<Problem>) -> DetectionResult {
        DetectionResult {
            quick_wins,
            critical_errors: critical,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn consistent_results_pass() {
        let p = problem("Missing Title Tags", &["https://example.com/a"]);
        let result = result_with(vec![p.clone()], vec![p]);
        assert!(validate_results(&result).is_ok());
    }

    #[test]
    fn quick_win_without_detail_entry_fails() {
        let result = result_with(
            vec![problem("Missing Title Tags", &["https://example.com/a"])],
            Vec::new(),
        );
        let err = validate_results(&result).expect_err("must fail");
        assert!(err.violations[0].contains("no matching entry"));
    }

    #[test]
    fn url_set_mismatch_fails_even_by_one_element() {
        let detail = problem(
            "Missing Title Tags",
            &["https://example.com/a", "https://example.com/b"],
        );
        let quick_win = problem("Missing Title Tags", &["https://example.com/a"]);
        let err = validate_results(&result_with(vec![quick_win], vec![detail]))
            .expect_err("must fail");
        assert!(err.violations[0].contains("URL list differs"));
    }

    #[test]
    fn url_order_does_not_matter() {
        let detail = problem(
            "Missing Title Tags",
            &["https://example.com/a", "https://example.com/b"],
        );
        let quick_win = problem(
            "Missing Title Tags",
            &["https://example.com/b", "https://example.com/a"],
        );
        assert!(validate_results(&result_with(vec![quick_win], vec![detail])).is_ok());
    }

    #[test]
    fn html_markup_in_description_fails() {
        let mut p = problem("Thin Content", &["https://example.com/a"]);
        p.description = "Broken markup <div class=\"x\"> leaked in.".to_string();
        let err = validate_results(&result_with(vec![p.clone()], vec![p])).expect_err("must fail");
        assert!(err.violations.iter().any(|v| v.contains("possible HTML")));
        // The same text also trips the forbidden-phrase scan.
        assert!(err.violations.iter().any(|v| v.contains("<div class=")));
    }

    #[test]
    fn html_entities_fail() {
        let mut p = problem("Thin Content", &["https://example.com/a"]);
        p.why_it_matters = "Escaped &lt;markup&gt; leaked.".to_string();
        let err = validate_results(&result_with(vec![p.clone()], vec![p])).expect_err("must fail");
        assert!(err.violations.iter().any(|v| v.contains("HTML entity")));
    }

    #[test]
    fn duplicate_urls_within_problem_fail() {
        let p = problem(
            "Missing Title Tags",
            &["https://example.com/a", "https://example.com/a"],
        );
        let err = validate_results(&result_with(vec![p.clone()], vec![p])).expect_err("must fail");
        assert!(err.violations.iter().any(|v| v.contains("duplicate URLs")));
    }

    #[test]
    fn placeholder_text_fails() {
        let mut p = problem("Thin Content", &["https://example.com/a"]);
        p.how_to_fix = "Not explicitly listed".to_string();
        let err = validate_results(&result_with(vec![p.clone()], vec![p])).expect_err("must fail");
        assert!(err.violations.iter().any(|v| v.contains("forbidden text")));
    }

    #[test]
    fn all_violations_reported_together() {
        let mut bad = problem("Thin Content", &["https://example.com/a", "https://example.com/a"]);
        bad.description = "see sample".to_string();
        let orphan = problem("Missing H1 Tags", &["https://example.com/b"]);
        let err = validate_results(&result_with(vec![bad.clone(), orphan], vec![bad]))
            .expect_err("must fail");
        assert!(err.violations.len() >= 3);
        let rendered = err.to_string();
        assert!(rendered.contains("no matching entry"));
        assert!(rendered.contains("duplicate URLs"));
        assert!(rendered.contains("forbidden text"));
    }
}
