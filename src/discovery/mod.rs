//! URL discovery.
//!
//! Locates candidate page URLs for a target domain: robots.txt sitemap
//! directives first, then default sitemap locations, then homepage link
//! harvesting, and finally the homepage alone. Every fetch or parse
//! failure along the way is treated as "this candidate has no URLs";
//! only an invalid target aborts discovery.

mod homepage;
mod robots;
mod sampler;
mod sitemap;

pub use sampler::pick_sample;
pub use sitemap::{candidate_priority, extract_loc_values, is_sitemap_index, looks_like_html};

use tracing::info;

use crate::config::DiscoveryConfig;
use crate::models::DiscoveryMethod;
use crate::scrapers::HttpClient;
use crate::utils::normalize_domain;

/// Error type for discovery operations.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("invalid audit target: {0:?} does not normalize to a host")]
    InvalidTarget(String),
}

/// The discovered URL set for one audit run.
#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    /// Normalized domain under audit.
    pub domain: String,
    /// Scheme + host base URL (also the homepage URL).
    pub base_url: String,
    pub method: DiscoveryMethod,
    /// Deduplicated candidate page URLs. Empty only for homepage-only runs.
    pub urls: Vec<String>,
}

/// Discover candidate URLs for a raw target (URL or bare domain).
pub async fn discover(
    http: &HttpClient,
    target: &str,
    config: &DiscoveryConfig,
) -> Result<DiscoveryOutcome, DiscoveryError> {
    let domain = normalize_domain(target);
    if domain.is_empty() {
        return Err(DiscoveryError::InvalidTarget(target.to_string()));
    }

    let base_url = base_url_for(target, &domain);

    if let Some(resolution) = sitemap::resolve(http, &base_url, config).await {
        info!(
            "adopted sitemap {} with {} URLs",
            resolution.sitemap_url,
            resolution.urls.len()
        );
        return Ok(DiscoveryOutcome {
            domain,
            base_url,
            method: DiscoveryMethod::Sitemap {
                sitemap_url: resolution.sitemap_url,
            },
            urls: resolution.urls,
        });
    }

    let harvested = homepage::harvest_links(http, &base_url, &domain).await;
    if !harvested.is_empty() {
        info!("no usable sitemap; harvested {} homepage links", harvested.len());
        return Ok(DiscoveryOutcome {
            domain,
            base_url,
            method: DiscoveryMethod::HomepageLinks,
            urls: harvested,
        });
    }

    info!("no sitemap and no homepage links; auditing homepage only");
    Ok(DiscoveryOutcome {
        domain,
        base_url,
        method: DiscoveryMethod::HomepageOnly,
        urls: Vec::new(),
    })
}

/// Scheme + host of the target. A bare domain gets `https://`; an explicit
/// scheme on the input is preserved.
fn base_url_for(target: &str, domain: &str) -> String {
    let trimmed = target.trim();
    if trimmed.starts_with("http://") {
        // Keep the host exactly as given (www or not), path dropped.
        let host = trimmed.trim_start_matches("http://");
        let host = host.split('/').next().unwrap_or(domain);
        format!("http://{host}")
    } else if trimmed.starts_with("https://") {
        let host = trimmed.trim_start_matches("https://");
        let host = host.split('/').next().unwrap_or(domain);
        format!("https://{host}")
    } else {
        let host = trimmed.split('/').next().unwrap_or(domain);
        format!("https://{host}")
    }
}
