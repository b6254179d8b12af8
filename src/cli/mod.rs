//! CLI entry points.

use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::audit::{self, AuditProgress};
use crate::config::AuditConfig;

#[derive(Parser)]
#[command(name = "quickwins")]
#[command(about = "On-page SEO audit tool")]
#[command(version)]
pub struct Cli {
    /// Config file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a site and print the ranked findings
    Audit {
        /// Target URL or bare domain (e.g. example.com)
        target: String,

        /// Override the sampled-page cap
        #[arg(long)]
        max_pages: Option<usize>,

        /// Write the full report as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,

        /// Skip the narrative collaborator and use the deterministic summary
        #[arg(long)]
        no_narrative: bool,
    },
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Audit {
            target,
            max_pages,
            json,
            no_narrative,
        } => {
            let mut config = AuditConfig::load(cli.config.as_deref())?;
            if let Some(n) = max_pages {
                config.sampling.max_pages = n;
            }
            if no_narrative {
                config.narrative.enabled = false;
            }

            let progress = CliProgress::default();
            let report = audit::run_audit(&config, &target, &progress).await?;
            progress.clear();

            print!("{}", report.render_text());

            if let Some(path) = json {
                let file = std::fs::File::create(&path)?;
                serde_json::to_writer_pretty(file, &report)?;
                println!("JSON report written to {}", path.display());
            }
            Ok(())
        }
    }
}

/// Terminal progress rendering over the audit pipeline.
#[derive(Default)]
struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    fn clear(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }

    fn counted(&self, done: usize, total: usize, label: &str) {
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };
        // Replace a stage spinner with a sized bar on the first tick.
        if guard.as_ref().is_none_or(|bar| bar.length().is_none()) {
            if let Some(spinner) = guard.take() {
                spinner.finish_and_clear();
            }
            let bar = ProgressBar::new(total as u64);
            bar.set_style(
                ProgressStyle::with_template("{msg:24} {bar:30} {pos}/{len}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            *guard = Some(bar);
        }
        if let Some(bar) = guard.as_ref() {
            bar.set_message(label.to_string());
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        }
    }
}

impl AuditProgress for CliProgress {
    fn stage(&self, name: &str) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
            let spinner = ProgressBar::new_spinner();
            spinner.set_message(name.to_string());
            spinner.tick();
            *guard = Some(spinner);
        }
    }

    fn page_done(&self, done: usize, total: usize) {
        self.counted(done, total, "fetching pages");
    }

    fn link_done(&self, done: usize, total: usize) {
        self.counted(done, total, "checking links");
    }
}
