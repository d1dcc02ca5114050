//! yp-harvest main entry point
//!
//! This is the command-line interface for the yellow-pages harvester.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use yp_harvest::config::{load_config_with_hash, Config};
use yp_harvest::crawler::{harvest, plan_from_config, run_scan};
use yp_harvest::metadata::load_metadata;
use yp_harvest::output::{export_partitions, load_statistics, print_statistics};
use yp_harvest::storage::SqliteStorage;

/// yp-harvest: a resumable business-directory harvester
///
/// yp-harvest walks the category tree of a yellow-pages directory, captures
/// every company detail page once, and resumes where it stopped after an
/// interruption.
#[derive(Parser, Debug)]
#[command(name = "yp-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable business-directory harvester", long_about = None)]
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

    /// Show where the harvest would resume without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "export", "scan"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export", "scan"])]
    stats: bool,

    /// Export every category to CSV and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "scan"])]
    export: bool,

    /// Scan the directory's categories and write the metadata file
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "export"])]
    scan: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.export {
        handle_export(&config)
    } else if cli.scan {
        handle_scan(&config).await
    } else {
        handle_harvest(config, config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("yp_harvest=info,warn"),
            1 => EnvFilter::new("yp_harvest=debug,info"),
            2 => EnvFilter::new("yp_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the resume position and pending pairs
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== yp-harvest Dry Run ===\n");

    println!("Site: {}", config.site.base_url);
    println!("  Page size: {}", config.site.page_size);
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Max empty pages: {}", config.crawler.max_empty_pages);
    println!("  Probe-ahead pages: {}", config.crawler.probe_ahead_pages);
    println!();

    let (metadata, plan) =
        plan_from_config(config).context("Failed to load metadata or progress")?;

    println!(
        "Metadata: {} ({} category pairs)",
        config.input.metadata_path,
        metadata.len()
    );
    println!("Database: {}", config.output.database_path);
    println!();

    if plan.pairs.is_empty() {
        println!("✓ Every category pair is complete, nothing to harvest");
        return Ok(());
    }

    println!(
        "Would resume at pair {} of {}:",
        plan.resume_index + 1,
        metadata.len()
    );
    let mut pending = 0;
    for pair in &plan.pairs {
        if pair.is_satisfied() {
            println!("  - {} (complete, skipped)", pair.target.label());
            continue;
        }
        pending += 1;
        println!(
            "  * {} from {}/{}",
            pair.target.label(),
            pair.start_offset,
            pair.target.target_count
        );
    }

    println!("\n✓ Would harvest {} category pairs", pending);
    Ok(())
}

/// Handles the --stats mode: shows progress and partition statistics
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    let metadata = match load_metadata(Path::new(&config.input.metadata_path)) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!("Targets unavailable, showing raw progress: {}", e);
            Vec::new()
        }
    };

    let stats = load_statistics(&storage, &metadata)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export mode: writes one CSV per main category
fn handle_export(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Companies ===\n");

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let dir = Path::new(&config.output.export_dir);

    let written = export_partitions(&storage, dir)
        .with_context(|| format!("Failed to export to {}", dir.display()))?;

    for path in &written {
        println!("✓ {}", path.display());
    }
    println!("\nExported {} files", written.len());

    Ok(())
}

/// Handles the --scan mode: rebuilds the category metadata
async fn handle_scan(config: &Config) -> anyhow::Result<()> {
    let count = run_scan(config).await.context("Category scan failed")?;
    println!(
        "✓ Wrote {} category pairs to {}",
        count, config.input.metadata_path
    );
    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, config_hash: String) -> anyhow::Result<()> {
    tracing::info!("Starting harvest (resumes from stored progress)");

    match harvest(config, config_hash).await {
        Ok(summary) => {
            tracing::info!(
                "Harvest completed: {} companies captured in run {}",
                summary.captured,
                summary.run_id
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
