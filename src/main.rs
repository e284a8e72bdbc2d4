//! Weft main entry point
//!
//! This is the command-line interface for the Weft web crawler.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use weft::config::{load_config_with_hash, Config};
use weft::crawler::{crawl, CrawlReport, DEFAULT_USER_AGENT};
use weft::url::ScopeSet;

/// Weft: a bounded-tab web crawler
///
/// Weft fetches pages starting from a set of seed URLs, follows links
/// that stay inside the configured domains, and appends every fetched
/// page to a JSON Lines file. Concurrency is bounded by a fixed pool of
/// reusable fetch tabs.
#[derive(Parser, Debug)]
#[command(name = "weft")]
#[command(version = "0.1.0")]
#[command(about = "A bounded-tab web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("weft=info,warn"),
            1 => EnvFilter::new("weft=debug,info"),
            2 => EnvFilter::new("weft=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Weft Dry Run ===\n");

    println!("Crawl Configuration:");
    println!("  Start URLs ({}):", config.crawl.start_urls.len());
    for seed in &config.crawl.start_urls {
        println!("    * {}", seed);
    }

    let scope = ScopeSet::from_allowed(&config.crawl.allowed_domains)?;
    let mut netlocs: Vec<&str> = scope.netlocs().collect();
    netlocs.sort_unstable();
    println!("  Allowed domains ({}):", netlocs.len());
    for netloc in netlocs {
        println!("    * {}", netloc);
    }

    println!("  Concurrency: {} tab(s)", config.crawl.concurrency);
    println!("  Request timeout: {}s", config.crawl.request_timeout_secs);
    println!("  Post-load delay: {}s", config.crawl.post_load_delay_secs);
    println!(
        "  User agent: {}",
        config.crawl.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    );

    println!("\nOutput:");
    match &config.output.pages_path {
        Some(path) => println!("  Pages file: {}", path),
        None => println!("  Pages file: (none, fetched pages are discarded)"),
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URL(s) in {} domain(s)",
        config.crawl.start_urls.len(),
        scope.len()
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling from {} seed URL(s) within {} allowed domain(s)",
        config.crawl.start_urls.len(),
        config.crawl.allowed_domains.len()
    );

    match crawl(config).await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Prints the end-of-crawl report
fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===");
    println!(
        "  Started: {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Elapsed: {:.2?}", report.elapsed);
    println!("  Pages fetched: {}", report.pages_fetched);
    println!("  Fetch failures: {}", report.fetch_failures);
    println!("  Extraction failures: {}", report.extract_failures);
    println!("  Persistence failures: {}", report.persist_failures);
    println!("  Links discovered: {}", report.links_discovered);
    println!("  Links enqueued: {}", report.links_enqueued);
    println!("  URLs seen: {}", report.urls_seen);
}
