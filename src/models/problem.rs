//! Detected problems and the detection result triple.

use serde::{Deserialize, Serialize};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
        }
    }
}

/// One finding produced by a single detection rule.
///
/// Created from a crawl snapshot and never mutated. A rule that matches
/// zero URLs emits no `Problem` at all rather than an empty one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    /// Stable identifier for the finding category.
    pub title: String,
    pub severity: Severity,
    /// Human-readable description of what was found.
    pub description: String,
    /// Why the finding matters for search performance.
    pub why_it_matters: String,
    /// Concrete remediation guidance.
    pub how_to_fix: String,
    /// Affected URLs, normalized and deduplicated.
    pub urls: Vec<String>,
    /// Fixed calibration constant, 1-10.
    pub impact_score: u8,
    /// Fixed calibration constant, in hours.
    pub effort_hours: f64,
}

impl Problem {
    /// Impact per hour of effort. Higher = better quick win. Degenerates to
    /// the raw impact when effort is zero or negative.
    pub fn priority_score(&self) -> f64 {
        if self.effort_hours <= 0.0 {
            f64::from(self.impact_score)
        } else {
            f64::from(self.impact_score) / self.effort_hours
        }
    }
}

/// The severity partitions plus the ranked quick-win shortlist.
///
/// Quick wins are the top entries by priority score across both partitions;
/// each quick win is the same finding as its detailed-category entry, so the
/// URL lists always agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub quick_wins: Vec<Problem>,
    pub critical_errors: Vec<Problem>,
    pub warnings: Vec<Problem>,
}
