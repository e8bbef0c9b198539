//! Scrapyer main entry point
//!
//! This is the command-line interface for the Scrapyer web page archiver.

use anyhow::Context;
use clap::Parser;
use scrapyer::config::{load_config_with_hash, validate, validate_seed_url, Config};
use scrapyer::crawler::Coordinator;
use scrapyer::output::print_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Scrapyer: a quality-filtering web page archiver
///
/// Scrapyer fetches a page (optionally following same-domain links), keeps
/// the text blocks and media worth archiving, and writes one directory per
/// page under SAVE_PATH.
#[derive(Parser, Debug)]
#[command(name = "scrapyer")]
#[command(version)]
#[command(about = "A quality-filtering web page archiver", long_about = None)]
struct Cli {
    /// URL of the page to archive
    #[arg(value_name = "URL")]
    url: String,

    /// Directory the archive is written to
    #[arg(value_name = "SAVE_PATH")]
    save_path: PathBuf,

    /// Path to TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Disable TLS certificate verification
    #[arg(long)]
    no_verify_ssl: bool,

    /// PEM file with an additional trusted CA certificate
    #[arg(long, value_name = "PATH")]
    ssl_cert: Option<PathBuf>,

    /// Media types to download (images, videos, audio)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    media_types: Option<Vec<String>>,

    /// Extract text only, skip media
    #[arg(long)]
    text_only: bool,

    /// Keep heading, paragraph and list structure
    #[arg(long)]
    preserve_structure: bool,

    /// Follow same-domain links from the seed page
    #[arg(long)]
    crawl: bool,

    /// Maximum number of pages to process when crawling
    #[arg(long, value_name = "N")]
    crawl_limit: Option<u32>,

    /// Maximum link depth from the seed page
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Number of concurrent page workers
    #[arg(long, value_name = "N")]
    workers: Option<u32>,

    /// Stop the whole crawl after this many seconds
    #[arg(long, value_name = "SECS")]
    crawl_timeout: Option<u64>,

    /// Drop low-quality text blocks
    #[arg(long)]
    quality_filter: bool,

    /// Minimum block quality score (0.0 - 1.0)
    #[arg(long, value_name = "F")]
    quality_threshold: Option<f64>,

    /// Blend semantic similarity into quality scores (implies --quality-filter)
    #[arg(long)]
    nlp: bool,

    /// OpenAI-compatible embeddings endpoint
    #[arg(long, value_name = "URL")]
    embedding_endpoint: Option<String>,

    /// Embedding model name
    #[arg(long, value_name = "NAME")]
    embedding_model: Option<String>,

    /// Validate configuration and show what would be archived, then exit
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Layers command-line flags over the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(timeout) = self.timeout {
            config.fetch.timeout_secs = timeout;
        }
        if self.no_verify_ssl {
            config.fetch.verify_tls = false;
        }
        if let Some(path) = &self.ssl_cert {
            config.fetch.ca_cert_path = Some(path.clone());
        }

        if let Some(types) = &self.media_types {
            config.extract.media_types = types.iter().map(|t| t.trim().to_lowercase()).collect();
        }
        if self.text_only {
            config.extract.text_only = true;
        }
        if self.preserve_structure {
            config.extract.preserve_structure = true;
        }

        if self.crawl {
            config.crawl.enabled = true;
        }
        if let Some(limit) = self.crawl_limit {
            config.crawl.limit = Some(limit);
        }
        if let Some(depth) = self.max_depth {
            config.crawl.max_depth = Some(depth);
        }
        if let Some(workers) = self.workers {
            config.crawl.workers = workers;
        }
        if let Some(secs) = self.crawl_timeout {
            config.crawl.timeout_secs = Some(secs);
        }

        if self.quality_filter || self.nlp {
            config.quality.enabled = true;
        }
        if let Some(threshold) = self.quality_threshold {
            config.quality.threshold = threshold;
        }
        if self.nlp {
            config.quality.nlp_enabled = true;
        }
        if let Some(endpoint) = &self.embedding_endpoint {
            config.embedding.endpoint = Some(endpoint.clone());
        }
        if let Some(model) = &self.embedding_model {
            config.embedding.model = model.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("invalid configuration")?;
    validate_seed_url(&cli.url).context("invalid seed URL")?;

    if cli.dry_run {
        print_dry_run(&cli, &config);
        return Ok(());
    }

    let mut coordinator = Coordinator::new(config, &cli.url, &cli.save_path)
        .context("failed to start archiver")?;
    if let Some(hash) = config_hash {
        coordinator = coordinator.with_config_hash(hash);
    }

    let summary = coordinator.run().await?;
    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scrapyer=info,warn"),
            1 => EnvFilter::new("scrapyer=debug,info"),
            2 => EnvFilter::new("scrapyer=trace,debug"),
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

/// Handles --dry-run: prints the effective settings
fn print_dry_run(cli: &Cli, config: &Config) {
    println!("=== Scrapyer Dry Run ===\n");

    println!("Seed: {}", cli.url);
    println!("Output: {}", cli.save_path.display());

    println!("\nCrawl:");
    if config.crawl.enabled {
        println!(
            "  Limit: {}",
            config
                .crawl
                .limit
                .map_or_else(|| "unbounded".to_string(), |l| l.to_string())
        );
        if let Some(depth) = config.crawl.max_depth {
            println!("  Max depth: {}", depth);
        }
        println!("  Workers: {}", config.crawl.workers);
    } else {
        println!("  Single page");
    }
    if let Some(secs) = config.crawl.timeout_secs {
        println!("  Timeout: {}s", secs);
    }

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!("  Verify TLS: {}", config.fetch.verify_tls);

    println!("\nExtract:");
    if config.extract.text_only {
        println!("  Text only");
    } else {
        println!("  Media: {}", config.extract.media_types.join(", "));
    }
    println!("  Preserve structure: {}", config.extract.preserve_structure);

    println!("\nQuality:");
    if config.quality.enabled {
        println!("  Threshold: {}", config.quality.threshold);
        println!("  Semantic scoring: {}", config.quality.nlp_enabled);
    } else {
        println!("  Filter disabled");
    }

    println!("\n✓ Configuration is valid");
}
