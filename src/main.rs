//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest listing crawler.

use catalog_harvest::config::{load_config_with_hash, validate, Config, Renderer};
use catalog_harvest::crawler::harvest;
use catalog_harvest::output::print_report;
use catalog_harvest::url::listing_page_url;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a two-phase product listing crawler
///
/// Catalog-Harvest walks the pages of a product listing, collects the item
/// links it finds, then fetches every item page with a bounded worker pool and
/// keeps a CSV snapshot of the extracted records up to date.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A two-phase product listing crawler", long_about = None)]
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

    /// Override the number of listing pages to visit
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Override the CSV snapshot path
    #[arg(long, value_name = "PATH")]
    output: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if apply_overrides(&mut config, &cli) {
        if let Err(e) = validate(&config) {
            tracing::error!("Invalid command-line override: {}", e);
            return Err(e.into());
        }
    }

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_harvest(config).await?;
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
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

/// Applies command-line overrides; returns true if anything changed
fn apply_overrides(config: &mut Config, cli: &Cli) -> bool {
    let mut changed = false;
    if let Some(max_pages) = cli.max_pages {
        tracing::info!("Overriding max-pages: {}", max_pages);
        config.listing.max_pages = max_pages;
        changed = true;
    }
    if let Some(output) = &cli.output {
        tracing::info!("Overriding output path: {}", output);
        config.output.path = output.clone();
        changed = true;
    }
    changed
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Listing:");
    println!("  URL template: {}", config.listing.url_template);
    println!("  Max pages: {}", config.listing.max_pages);
    println!("  Link selector: {}", config.listing.link_selector);
    if let Some(overlay) = &config.listing.overlay_selector {
        println!("  Overlay selector: {}", overlay);
    }
    println!(
        "  Content timeout: {}ms",
        config.listing.content_timeout_ms
    );
    println!(
        "  On missing content: {:?} (after {} misses)",
        config.listing.on_missing, config.listing.max_consecutive_misses
    );
    match config.listing.renderer {
        Renderer::Http => println!("  Renderer: http"),
        Renderer::Browserless => println!(
            "  Renderer: browserless ({})",
            config.listing.browserless_url.as_deref().unwrap_or("unset")
        ),
    }

    println!("\nFetch:");
    println!("  Workers: {}", config.fetch.concurrency);
    println!("  Request timeout: {}s", config.fetch.request_timeout_secs);
    println!(
        "  Pause between items: {}-{}ms",
        config.fetch.delay_min_ms, config.fetch.delay_max_ms
    );
    println!("  Currency markers: {}", config.fetch.currency_markers.join(" "));

    println!("\nHeaders:");
    println!("  User-Agent: {}", config.headers.user_agent);
    println!("  Accept-Language: {}", config.headers.accept_language);

    println!("\nOutput:");
    println!("  Snapshot: {}", config.output.path);
    println!(
        "  Checkpoint every {} items",
        config.output.checkpoint_interval
    );

    println!("\nListing Pages ({}):", config.listing.max_pages);
    for page in 1..=config.listing.max_pages {
        println!("  - {}", listing_page_url(&config.listing.url_template, page)?);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Listing: {} ({} pages), {} workers, snapshot: {}",
        config.listing.url_template,
        config.listing.max_pages,
        config.fetch.concurrency,
        config.output.path
    );

    let report = match harvest(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    print_report(&report);

    if let Some(err) = &report.final_flush_error {
        return Err(format!("final snapshot was not written: {}", err).into());
    }

    tracing::info!("Harvest completed");
    Ok(())
}
