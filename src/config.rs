//! Audit configuration.
//!
//! One `AuditConfig` value object is constructed at process entry
//! (defaults, then an optional TOML file, then environment overrides) and
//! passed by parameter into every component that needs it. Nothing reads
//! ambient configuration after construction.

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use crate::llm::NarrativeConfig;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// HTTP fetch behavior shared by discovery, extraction, and link checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Politeness delay between consecutive page fetches, in milliseconds.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Politeness delay between sitemap fetches, in milliseconds.
    #[serde(default = "default_sitemap_delay_ms")]
    pub sitemap_delay_ms: u64,
    /// Politeness delay between link checks, in milliseconds.
    #[serde(default = "default_link_delay_ms")]
    pub link_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    12
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_page_delay_ms() -> u64 {
    120
}

fn default_sitemap_delay_ms() -> u64 {
    150
}

fn default_link_delay_ms() -> u64 {
    50
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            page_delay_ms: default_page_delay_ms(),
            sitemap_delay_ms: default_sitemap_delay_ms(),
            link_delay_ms: default_link_delay_ms(),
        }
    }
}

/// Sitemap resolution bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Ceiling on URLs accumulated across all sitemap files.
    #[serde(default = "default_max_sitemap_urls")]
    pub max_sitemap_urls: usize,
    /// Children followed per sitemap index.
    #[serde(default = "default_index_children")]
    pub sitemap_index_children: usize,
    /// A sitemap with at least this many URLs is adopted immediately.
    #[serde(default = "default_min_useful_urls")]
    pub min_useful_urls: usize,
}

fn default_max_sitemap_urls() -> usize {
    6000
}

fn default_index_children() -> usize {
    20
}

fn default_min_useful_urls() -> usize {
    20
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_sitemap_urls: default_max_sitemap_urls(),
            sitemap_index_children: default_index_children(),
            min_useful_urls: default_min_useful_urls(),
        }
    }
}

/// Sampling bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Maximum pages fetched per audit.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Internal links collected per page.
    #[serde(default = "default_max_links_per_page")]
    pub max_links_per_page: usize,
}

fn default_max_pages() -> usize {
    40
}

fn default_max_links_per_page() -> usize {
    10
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_links_per_page: default_max_links_per_page(),
        }
    }
}

/// Link checker bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCheckConfig {
    /// Total links validated across the whole sample.
    #[serde(default = "default_max_checks")]
    pub max_checks: usize,
    /// Stop once this many broken links have been collected.
    #[serde(default = "default_max_broken")]
    pub max_broken: usize,
}

fn default_max_checks() -> usize {
    180
}

fn default_max_broken() -> usize {
    25
}

impl Default for LinkCheckConfig {
    fn default() -> Self {
        Self {
            max_checks: default_max_checks(),
            max_broken: default_max_broken(),
        }
    }
}

/// Detection rule thresholds.
///
/// The structured-data thresholds are fixed calibration constants carried
/// over unchanged; they are configurable but no further semantics should be
/// read into their exact values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Pages with fewer visible words than this (but more than zero) are thin.
    #[serde(default = "default_thin_threshold")]
    pub thin_content_threshold: usize,
    /// Titles longer than this many characters are flagged.
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,
    /// Fraction of valid pages lacking JSON-LD before the site-wide rule fires.
    #[serde(default = "default_schema_ratio")]
    pub schema_missing_ratio: f64,
    /// Minimum absolute count of pages lacking JSON-LD before the rule fires.
    #[serde(default = "default_schema_min_pages")]
    pub schema_min_pages: usize,
    /// Cap on URLs attached to the structured-data finding.
    #[serde(default = "default_schema_url_cap")]
    pub schema_url_cap: usize,
}

fn default_thin_threshold() -> usize {
    300
}

fn default_title_max_chars() -> usize {
    60
}

fn default_schema_ratio() -> f64 {
    0.7
}

fn default_schema_min_pages() -> usize {
    3
}

fn default_schema_url_cap() -> usize {
    40
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            thin_content_threshold: default_thin_threshold(),
            title_max_chars: default_title_max_chars(),
            schema_missing_ratio: default_schema_ratio(),
            schema_min_pages: default_schema_min_pages(),
            schema_url_cap: default_schema_url_cap(),
        }
    }
}

/// Complete audit configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub links: LinkCheckConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub narrative: NarrativeConfig,
}

impl AuditConfig {
    /// Load configuration: defaults, then the given TOML file if any, then
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw)?
            }
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Apply environment variable overrides.
    ///
    /// Supported: `QUICKWINS_MAX_PAGES`, `QUICKWINS_TIMEOUT_SECS`,
    /// `QUICKWINS_USER_AGENT`, `QUICKWINS_THIN_CONTENT_THRESHOLD`, plus the
    /// `LLM_*` variables handled by [`NarrativeConfig`].
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("QUICKWINS_MAX_PAGES") {
            if let Ok(n) = val.parse() {
                self.sampling.max_pages = n;
            }
        }
        if let Ok(val) = std::env::var("QUICKWINS_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.crawl.timeout_secs = n;
            }
        }
        if let Ok(val) = std::env::var("QUICKWINS_USER_AGENT") {
            self.crawl.user_agent = val;
        }
        if let Ok(val) = std::env::var("QUICKWINS_THIN_CONTENT_THRESHOLD") {
            if let Ok(n) = val.parse() {
                self.detector.thin_content_threshold = n;
            }
        }
        self.narrative = self.narrative.with_env_overrides();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_calibration_constants() {
        let config = AuditConfig::default();
        assert_eq!(config.sampling.max_pages, 40);
        assert_eq!(config.sampling.max_links_per_page, 10);
        assert_eq!(config.links.max_checks, 180);
        assert_eq!(config.links.max_broken, 25);
        assert_eq!(config.discovery.max_sitemap_urls, 6000);
        assert_eq!(config.discovery.sitemap_index_children, 20);
        assert_eq!(config.detector.thin_content_threshold, 300);
        assert_eq!(config.detector.schema_min_pages, 3);
    }

    #[test]
    fn partial_toml_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[sampling]\nmax_pages = 12").expect("write");

        let config = AuditConfig::load(Some(file.path())).expect("load");
        assert_eq!(config.sampling.max_pages, 12);
        assert_eq!(config.links.max_checks, 180);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "not valid toml [").expect("write");
        assert!(AuditConfig::load(Some(file.path())).is_err());
    }
}
