//! Linkscope main entry point
//!
//! This is the command-line interface for the Linkscope batch link census.

use anyhow::Context;
use clap::Parser;
use linkscope::config::{load_config_with_hash, Config};
use linkscope::crawler::build_coordinator;
use linkscope::storage::open_repository;
use linkscope::{server, BatchOrchestrator, Repository};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Linkscope: count internal and external links across batches of pages
///
/// Linkscope fetches every submitted page concurrently, counts the links on
/// each one, and keeps the per-page results under a batch identifier.
#[derive(Parser, Debug)]
#[command(name = "linkscope")]
#[command(version)]
#[command(about = "Batch link census for web pages", long_about = None)]
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

    /// Validate config and print it without serving
    #[arg(long, conflicts_with_all = ["scrape", "list"])]
    dry_run: bool,

    /// Scrape the newline-delimited addresses in FILE once and print the batch
    #[arg(long, value_name = "FILE", conflicts_with_all = ["dry_run", "list"])]
    scrape: Option<PathBuf>,

    /// Print every stored batch and exit
    #[arg(long, conflicts_with_all = ["dry_run", "scrape"])]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.list {
        handle_list(&config)?;
    } else if let Some(path) = &cli.scrape {
        handle_scrape(&config, path).await?;
    } else {
        handle_serve(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkscope=info,warn"),
            1 => EnvFilter::new("linkscope=debug,info"),
            2 => EnvFilter::new("linkscope=trace,tower_http=debug,info"),
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

fn build_orchestrator(config: &Config) -> anyhow::Result<BatchOrchestrator> {
    let repository = open_repository(&config.storage).context("failed to open result storage")?;
    let coordinator = build_coordinator(config).context("failed to build HTTP client")?;

    Ok(BatchOrchestrator::new(Arc::new(coordinator), repository)
        .with_batch_timeout(config.scraper.batch_timeout()))
}

/// Handles the --dry-run mode: validates config and prints it
fn handle_dry_run(config: &Config) {
    println!("=== Linkscope Dry Run ===\n");

    println!("Server:");
    println!("  Bind address: {}", config.server.bind_address);

    println!("\nScraper:");
    println!(
        "  Max concurrent fetches: {}",
        config.scraper.max_concurrent_fetches
    );
    println!("  Request timeout: {}s", config.scraper.request_timeout_secs);
    println!("  Connect timeout: {}s", config.scraper.connect_timeout_secs);
    match config.scraper.batch_timeout_secs {
        Some(secs) => println!("  Batch timeout: {}s", secs),
        None => println!("  Batch timeout: none"),
    }

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nStorage:");
    println!("  Backend: {:?}", config.storage.backend);
    if let Some(path) = &config.storage.database_path {
        println!("  Database: {}", path);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --list mode: prints stored batches as JSON
fn handle_list(config: &Config) -> anyhow::Result<()> {
    let repository = open_repository(&config.storage).context("failed to open result storage")?;
    let batches = repository.list_results()?;

    tracing::info!("Found {} stored batches", batches.len());
    println!("{}", serde_json::to_string_pretty(&batches)?);

    Ok(())
}

/// Handles the --scrape mode: runs one batch from a file
async fn handle_scrape(config: &Config, path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let orchestrator = build_orchestrator(config)?;
    let results = orchestrator.process_text(&text).await?;

    let failed = results.iter().filter(|r| !r.success).count();
    tracing::info!(
        "Batch {} finished: {} pages, {} failed",
        results.first().map(|r| r.batch_id.as_str()).unwrap_or("-"),
        results.len(),
        failed
    );
    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}

/// Handles the default mode: serves the batch API
async fn handle_serve(config: &Config) -> anyhow::Result<()> {
    let orchestrator = Arc::new(build_orchestrator(config)?);
    let app = server::router(orchestrator);

    server::serve(&config.server.bind_address, app)
        .await
        .with_context(|| format!("server on {} failed", config.server.bind_address))?;

    tracing::info!("Server stopped");
    Ok(())
}
