//! Second-Order main entry point
//!
//! This is the command-line interface for the Second-Order crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use second_order::config::{
    load_config_with_hash, merge_headers, parse_target, validate_settings, Config, CrawlSettings,
    DEFAULT_DEPTH, DEFAULT_OUTPUT_DIR, DEFAULT_THREADS,
};
use second_order::crawler::run_crawl;
use second_order::extract::ExtractorSet;
use second_order::output::{print_statistics, JsonOutput};
use tracing_subscriber::EnvFilter;

/// Second-Order: scoped reconnaissance crawler
///
/// Crawls same-site pages from a seed URL, records configured attributes and
/// inline text, and flags linked resources that answer with anything other
/// than 200 (or do not answer at all).
#[derive(Parser, Debug)]
#[command(name = "second-order")]
#[command(version = "1.0.0")]
#[command(about = "Scoped crawler for second-order takeover reconnaissance", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(long, value_name = "URL")]
    target: Option<String>,

    /// Path to JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory to write result files to
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Accept invalid TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Crawl depth; overrides the config's Depth
    #[arg(long)]
    depth: Option<u32>,

    /// Maximum number of concurrent requests
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    threads: usize,

    /// Extra request header as "Name: Value" (repeatable)
    #[arg(long = "header", value_name = "HEADER")]
    headers: Vec<String>,

    /// Validate inputs and show the extractor set without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (settings, config) = load_inputs(&cli)?;

    if cli.dry_run {
        return handle_dry_run(&settings, &config);
    }

    handle_crawl(settings, config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("second_order=info,warn"),
            1 => EnvFilter::new("second_order=debug,info"),
            2 => EnvFilter::new("second_order=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file and resolves the crawl settings
///
/// Every failure here is an input error: nothing has been crawled yet.
fn load_inputs(cli: &Cli) -> anyhow::Result<(CrawlSettings, Config)> {
    let Some(raw_target) = cli.target.as_deref() else {
        bail!("no target given, pass --target <URL>");
    };
    let Some(config_path) = cli.config.as_deref() else {
        bail!("no configuration given, pass --config <FILE>");
    };

    let target = parse_target(raw_target)?;

    tracing::info!("Loading configuration from: {}", config_path.display());
    let (config, hash) = load_config_with_hash(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let settings = CrawlSettings::new(target)
        .with_output_dir(&cli.output)
        .with_insecure(cli.insecure)
        .with_depth(cli.depth.or(config.depth).unwrap_or(DEFAULT_DEPTH))
        .with_threads(cli.threads)
        .with_headers(merge_headers(&config.headers, &cli.headers));
    validate_settings(&settings)?;

    Ok((settings, config))
}

/// Handles the --dry-run mode: shows what would be crawled and extracted
fn handle_dry_run(settings: &CrawlSettings, config: &Config) -> anyhow::Result<()> {
    let extractors = ExtractorSet::from_config(config)?;

    println!("=== Second-Order Dry Run ===\n");

    println!("Crawl:");
    println!("  Target: {}", settings.target);
    println!("  Depth: {}", settings.depth);
    println!("  Threads: {}", settings.threads);
    println!("  Insecure TLS: {}", settings.insecure);
    println!("  Output: {}", settings.output_dir.display());

    println!("\nHeaders ({}):", settings.headers.len());
    for (name, value) in &settings.headers {
        println!("  - {}: {}", name, value);
    }

    println!("\nExtractors ({}):", extractors.len());
    for extractor in extractors.iter() {
        match &extractor.attribute {
            Some(attribute) => println!(
                "  - {} [{:?}] {}@{}",
                extractor.key, extractor.kind, extractor.tag, attribute
            ),
            None => println!("  - {} [{:?}] {}", extractor.key, extractor.kind, extractor.tag),
        }
    }

    println!("\nOutput files:");
    for kind in extractors.enabled_kinds() {
        println!("  - {}", kind.output_file());
    }
    if config.log_crawled_urls {
        println!("  - {}", second_order::output::URLS_FILE);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(settings: CrawlSettings, config: Config) -> anyhow::Result<()> {
    let sink = JsonOutput::new(&settings.output_dir, config.log_crawled_urls);

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::warn!("Interrupt received, writing results"),
            Err(e) => {
                // Without a signal handler the crawl simply runs to completion
                tracing::error!("Failed to listen for interrupt: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    let report = run_crawl(&settings, &config, &sink, shutdown)
        .await
        .context("crawl failed")?;

    print_statistics(&report.stats, report.visited.len());
    tracing::info!("Results written to {}", sink.dir().display());

    Ok(())
}
