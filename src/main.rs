//! Marquee main entry point
//!
//! This is the command-line interface for the Marquee chart scraper.

use anyhow::Context;
use clap::Parser;
use marquee::config::{compute_config_hash, read_config, validate, Config};
use marquee::crawler::Coordinator;
use marquee::RunSummary;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Exit status when the configuration or log file cannot be set up
const EXIT_SETUP_ERROR: u8 = 2;

/// Marquee: a concurrent movie chart scraper
///
/// Marquee fetches a ranked listing page, visits every item's detail page
/// with a bounded pool of workers, and appends complete records to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "marquee")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent movie chart scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Maximum number of concurrent detail workers
    #[arg(long, value_name = "N")]
    max_workers: Option<u32>,

    /// CSV file to append records to
    #[arg(long, value_name = "PATH")]
    output: Option<String>,

    /// User-Agent header sent with every request
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Listing page to scrape
    #[arg(long, value_name = "URL")]
    listing_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration errors are reported before logging exists
    let (config, config_hash) = match load_effective_config(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    };

    let _guard = match setup_logging(Path::new(&config.output.log_path), cli.verbose, cli.quiet)
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging: {:#}", e);
            return ExitCode::from(EXIT_SETUP_ERROR);
        }
    };

    match &config_hash {
        Some(hash) => tracing::info!("Configuration loaded successfully (hash: {})", hash),
        None => tracing::info!("No configuration file given, using defaults"),
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return ExitCode::SUCCESS;
    }

    let result = handle_scrape(config).await;
    match &result {
        Ok(summary) => {
            if !cli.quiet {
                summary.print_summary();
            }
            if summary.saved == 0 {
                tracing::error!("No records were saved");
            }
        }
        Err(e) => tracing::error!("Scrape failed: {:#}", e),
    }

    ExitCode::from(exit_code(&result))
}

/// Maps a finished run to the process exit status
///
/// A run only succeeds if it saved at least one record.
fn exit_code(result: &anyhow::Result<RunSummary>) -> u8 {
    match result {
        Ok(summary) if summary.saved > 0 => 0,
        _ => 1,
    }
}

/// Loads the config file (if any), applies command-line overrides and validates
fn load_effective_config(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            let config = read_config(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let hash = compute_config_hash(path)?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(max_workers) = cli.max_workers {
        config.scraper.max_workers = max_workers;
    }
    if let Some(output) = &cli.output {
        config.output.csv_path = output.clone();
    }
    if let Some(user_agent) = &cli.user_agent {
        config.user_agent.value = user_agent.clone();
    }
    if let Some(listing_url) = &cli.listing_url {
        config.scraper.listing_url = listing_url.clone();
    }

    validate(&config)?;
    Ok((config, hash))
}

/// Sets up console and log file output based on verbosity level
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the program.
fn setup_logging(log_path: &Path, verbose: u8, quiet: bool) -> anyhow::Result<WorkerGuard> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("opening log file {}", log_path.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_filter(EnvFilter::new(console_directives(verbose, quiet))),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(EnvFilter::new(file_directives(verbose))),
        )
        .init();

    Ok(guard)
}

/// Console filter directives for the chosen verbosity
fn console_directives(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "marquee=info,warn",
        1 => "marquee=debug,info",
        2 => "marquee=trace,debug",
        _ => "trace",
    }
}

/// Log file filter directives
///
/// `--quiet` only silences the console; the file always keeps the per-item
/// lines.
fn file_directives(verbose: u8) -> &'static str {
    console_directives(verbose, false)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Marquee Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Listing URL: {}", config.scraper.listing_url);
    println!("  Origin: {}", config.scraper.origin);
    println!("  Max workers: {}", config.scraper.max_workers);
    println!("  Max jitter: {}ms", config.scraper.max_jitter_ms);
    println!("  Fetch timeout: {}s", config.scraper.fetch_timeout_secs);
    println!("  Max sink failures: {}", config.scraper.max_sink_failures);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.value);

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    println!("  Log: {}", config.output.log_path);

    println!("\nSelectors:");
    for (name, rule) in config.selectors.entries() {
        println!("  {}: {}", name, rule);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main scrape operation
async fn handle_scrape(config: Config) -> anyhow::Result<RunSummary> {
    let listing_url = config.scraper.listing_url.clone();
    let coordinator = Coordinator::new(config).context("initializing scraper")?;

    // Ctrl-C lets in-flight writes finish; pending items are dropped
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling run");
            cancel.cancel();
        }
    });

    let summary = coordinator.run(&listing_url).await?;
    Ok(summary)
}
