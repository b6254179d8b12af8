//! Audit pipeline orchestration.
//!
//! Sequential, bounded, and stateless: discover, sample, extract, check
//! links, detect, validate, narrate. Every network stage degrades to
//! partial data; only an invalid target and a failed result validation
//! abort the run.

use std::time::Duration;

use tracing::info;

use crate::config::AuditConfig;
use crate::detector::detect_problems;
use crate::discovery::{self, pick_sample, DiscoveryError};
use crate::llm::{fallback_narrative, NarrativeClient, ProblemDigest};
use crate::models::CrawlContext;
use crate::report::AuditReport;
use crate::scrapers::link_checker::collect_link_pool;
use crate::scrapers::{check_links, extract_page_signals, HttpClient};
use crate::validator::{validate_results, ValidationError};

/// Fatal audit failures. Everything else degrades to partial results.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error(transparent)]
    InvalidTarget(#[from] DiscoveryError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Progress callbacks for a UI layer. All methods default to no-ops.
pub trait AuditProgress {
    fn stage(&self, _name: &str) {}
    fn page_done(&self, _done: usize, _total: usize) {}
    fn link_done(&self, _done: usize, _total: usize) {}
}

/// Silent progress sink.
pub struct NoProgress;

impl AuditProgress for NoProgress {}

/// Run one complete audit against a raw target (URL or bare domain).
pub async fn run_audit(
    config: &AuditConfig,
    target: &str,
    progress: &dyn AuditProgress,
) -> Result<AuditReport, AuditError> {
    let http = HttpClient::new(&config.crawl)?;
    let sitemap_http =
        http.with_request_delay(Duration::from_millis(config.crawl.sitemap_delay_ms));
    let link_http = http.with_request_delay(Duration::from_millis(config.crawl.link_delay_ms));

    progress.stage("discovering URLs");
    let discovered = discovery::discover(&sitemap_http, target, &config.discovery).await?;
    info!(
        "discovered {} URLs for {} via {}",
        discovered.urls.len(),
        discovered.domain,
        discovered.method.describe()
    );

    progress.stage("sampling pages");
    let sample = pick_sample(
        &discovered.urls,
        &discovered.base_url,
        config.sampling.max_pages,
    );
    // The homepage is audited even when discovery never listed it, so the
    // discovered count is floored at the sample size.
    let urls_discovered = discovered.urls.len().max(sample.len());

    progress.stage("extracting page signals");
    let mut pages = Vec::with_capacity(sample.len());
    for (index, url) in sample.iter().enumerate() {
        let page = extract_page_signals(
            &http,
            url,
            &discovered.domain,
            config.sampling.max_links_per_page,
        )
        .await;
        pages.push(page);
        progress.page_done(index + 1, sample.len());
    }

    progress.stage("checking internal links");
    let pool = collect_link_pool(&pages, config.links.max_checks);
    let link_report = check_links(&link_http, &pool, &config.links, |done, total| {
        progress.link_done(done, total)
    })
    .await;
    info!(
        "link check: {} ok, {} broken of {} checked",
        link_report.ok,
        link_report.broken.len(),
        pool.len()
    );

    let context = CrawlContext::build(
        discovered.domain.clone(),
        discovered.method.clone(),
        urls_discovered,
        pages,
        pool.len(),
        link_report.broken,
        config.detector.thin_content_threshold,
    );

    progress.stage("detecting problems");
    let detection = detect_problems(
        &context.pages,
        &context.examples.broken_links,
        &config.detector,
    );

    validate_results(&detection)?;

    progress.stage("generating narrative");
    let narrative = if config.narrative.enabled {
        let digests: Vec<ProblemDigest> = detection
            .critical_errors
            .iter()
            .chain(detection.warnings.iter())
            .map(ProblemDigest::from_problem)
            .collect();
        match NarrativeClient::new(config.narrative.clone()) {
            Ok(client) => match client.generate(&context, &digests).await {
                Ok(narrative) => narrative,
                Err(e) => {
                    info!("narrative collaborator unavailable ({}), using fallback", e);
                    fallback_narrative(&context, &detection)
                }
            },
            Err(e) => {
                info!("narrative client setup failed ({}), using fallback", e);
                fallback_narrative(&context, &detection)
            }
        }
    } else {
        fallback_narrative(&context, &detection)
    };

    Ok(AuditReport::new(
        discovered.domain,
        context,
        detection,
        narrative,
    ))
}
