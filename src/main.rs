//! Pagesift main entry point
//!
//! Command-line interface for running crawl jobs defined in TOML or JSON
//! job files.

use anyhow::Context;
use clap::Parser;
use pagesift::config::{load_job_with_hash, CrawlConfig, JobSpec};
use pagesift::crawler::crawl;
use pagesift::extract::ExtractionStrategy;
use pagesift::output::{write_report, CrawlReport};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pagesift: configurable crawling with pluggable field extraction
///
/// Pagesift fetches pages starting from a job's origin URL, extracts a
/// field map per page with the configured strategy, and optionally
/// follows same-host links under depth and page budgets.
#[derive(Parser, Debug)]
#[command(name = "pagesift")]
#[command(version)]
#[command(about = "Crawl pages into structured JSON records", long_about = None)]
struct Cli {
    /// Path to the job file (TOML or JSON)
    #[arg(value_name = "JOB")]
    job: PathBuf,

    /// Write the JSON report here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the job and show what would be crawled without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading job from: {}", cli.job.display());
    let (job, job_hash) =
        load_job_with_hash(&cli.job).context("Failed to load job file")?;
    tracing::info!("Job loaded (hash: {})", job_hash);

    // Strategy and config problems are fatal before any fetch.
    let strategy = ExtractionStrategy::from_spec(&job.strategy, &job.selectors)
        .context("Failed to build extraction strategy")?;
    let config = job.to_crawl_config().context("Invalid crawl settings")?;

    if cli.dry_run {
        print_dry_run(&job, &config);
        return Ok(());
    }

    if job.render.is_some() {
        return Err(pagesift::CrawlError::RenderUnavailable).context(
            "this binary has no render backend; use the library's RenderFetcher \
             with a Renderer implementation for script-executed pages",
        );
    }

    let results = crawl(config, strategy).await?;

    let report = CrawlReport::new(results);
    tracing::info!(
        "Crawl complete: {} pages, {} failed",
        report.pages_crawled,
        report.failures
    );

    write_report(&report, cli.output.as_deref())?;

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagesift=info,warn"),
            1 => EnvFilter::new("pagesift=debug,info"),
            2 => EnvFilter::new("pagesift=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: shows the validated job without fetching anything
fn print_dry_run(job: &JobSpec, config: &CrawlConfig) {
    println!("=== Pagesift Dry Run ===\n");

    println!("Origin URL: {}", config.url);
    println!("Strategy: {}", job.strategy);
    if !job.selectors.is_empty() {
        println!("Selector fields ({}):", job.selectors.len());
        for field in job.selectors.keys() {
            println!("  - {}", field);
        }
    }

    println!("\nCrawl settings:");
    println!("  Max depth: {}", config.max_depth);
    println!("  Max pages: {}", config.max_pages);
    println!("  Delay: {:?}", config.delay);
    println!("  Follow links: {}", config.follow_links);
    println!("  Timeout: {:?}", config.timeout);
    println!("  User agent: {}", config.user_agent);
    if !config.headers.is_empty() {
        println!("  Extra headers: {}", config.headers.len());
    }
    if job.render.is_some() {
        println!("  Render: configured (requires an embedding with a render backend)");
    }

    println!("\n✓ Job is valid");
}
