//! quickwins - on-page SEO audit tool.
//!
//! Crawls a bounded sample of a website, detects on-page SEO problems with
//! deterministic rules, and ranks the findings by impact-to-effort.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quickwins::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "quickwins=debug"
    } else {
        "quickwins=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
