//! Audit report assembly and rendering.
//!
//! The report is the sole export surface: quick wins, the severity
//! partitions, suggested next checks, and the site name, plus the crawl
//! context they were derived from. Renderers iterate problems and their
//! URL lists and need nothing else.

use serde::{Deserialize, Serialize};

use crate::llm::AuditNarrative;
use crate::models::{CrawlContext, DetectionResult, Problem};

/// Everything a renderer or exporter may consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub site_name: String,
    pub context: CrawlContext,
    pub quick_wins: Vec<Problem>,
    pub critical_errors: Vec<Problem>,
    pub warnings: Vec<Problem>,
    pub narrative: AuditNarrative,
}

impl AuditReport {
    pub fn new(
        site_name: String,
        context: CrawlContext,
        detection: DetectionResult,
        narrative: AuditNarrative,
    ) -> Self {
        Self {
            site_name,
            context,
            quick_wins: detection.quick_wins,
            critical_errors: detection.critical_errors,
            warnings: detection.warnings,
            narrative,
        }
    }

    /// Plain-text rendering for the terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "SEO Audit - {} ({})\n",
            self.site_name, self.context.audit_date
        ));
        out.push_str(&format!(
            "Discovery: {} | analyzed {} of {} URLs\n\n",
            self.context.discovery.describe(),
            self.context.urls_analyzed,
            self.context.urls_discovered
        ));

        out.push_str("EXECUTIVE SUMMARY\n");
        out.push_str(&self.narrative.executive_summary);
        out.push_str("\n\n");

        out.push_str(&format!("QUICK WINS ({})\n", self.quick_wins.len()));
        for (index, problem) in self.quick_wins.iter().enumerate() {
            out.push_str(&format!(
                "  {}. {} [score {:.1}, {} URLs]\n",
                index + 1,
                problem.title,
                problem.priority_score(),
                problem.urls.len()
            ));
        }
        out.push('\n');

        render_problem_section(&mut out, "CRITICAL ERRORS", &self.critical_errors);
        render_problem_section(&mut out, "WARNINGS", &self.warnings);

        if !self.narrative.next_checks.is_empty() {
            out.push_str("NEXT CHECKS\n");
            for check in &self.narrative.next_checks {
                out.push_str(&format!("  - {}: {}\n", check.title, check.description));
            }
            out.push('\n');
        }

        out
    }
}

fn render_problem_section(out: &mut String, heading: &str, problems: &[Problem]) {
    out.push_str(&format!("{} ({})\n", heading, problems.len()));
    for problem in problems {
        out.push_str(&format!(
            "  * {} - {}\n",
            problem.title, problem.description
        ));
        out.push_str(&format!("    Why: {}\n", problem.why_it_matters));
        out.push_str(&format!("    Fix: {}\n", problem.how_to_fix));
        for url in problem.urls.iter().take(5) {
            out.push_str(&format!("      {url}\n"));
        }
        if problem.urls.len() > 5 {
            out.push_str(&format!("      ... and {} more\n", problem.urls.len() - 5));
        }
    }
    out.push('\n');
}
