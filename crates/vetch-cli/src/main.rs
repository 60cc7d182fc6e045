//! # vetch
//!
//! Bulk downloader for the most-depended-upon npm packages.
//!
//! This is the CLI entry point: it parses arguments, layers them over the
//! environment configuration, sets up logging, and drives the harvest
//! pipeline.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use vetch_config::Config;
use vetch_core::error::{VetchError, VetchResult};
use vetch_harvest::Harvester;

mod output;

use output::OutputHandler;

/// Download the most-depended-upon npm packages into a local directory
#[derive(Parser)]
#[command(
    name = "vetch",
    version,
    about = "Bulk downloader for the most-depended-upon npm packages"
)]
pub struct Cli {
    /// How many top packages to fetch
    #[arg(value_name = "COUNT")]
    count: usize,

    /// Base listing URL, ending in an `offset=` query suffix
    #[arg(long, value_name = "URL")]
    package_url: Option<String>,

    /// Registry endpoint for metadata lookups
    #[arg(long, value_name = "URL")]
    registry_url: Option<String>,

    /// Directory packages are unpacked into
    #[arg(long, value_name = "DIR")]
    target_directory: Option<PathBuf>,

    /// Concurrency cap for metadata resolution and downloads
    #[arg(long, value_name = "N")]
    async_limit: Option<usize>,

    /// Concurrency cap for listing-page scrapes
    #[arg(long, value_name = "N")]
    scrape_limit: Option<usize>,

    /// Verbosity: 0 silent, 1 info, 2 verbose
    #[arg(short, long, value_name = "LEVEL")]
    debug: Option<u8>,

    /// Print the discovered package names instead of downloading them
    #[arg(long)]
    list_only: bool,
}

fn main() {
    let cli = Cli::parse();
    let output = OutputHandler::new();

    if let Err(err) = run_cli(cli, &output) {
        output.error(&err.to_string());
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli, output: &OutputHandler) -> VetchResult<()> {
    let config = apply_overrides(&cli, Config::from_env()?);
    setup_logging(config.verbosity);

    info!("Starting vetch v{}", env!("CARGO_PKG_VERSION"));

    let rt = tokio::runtime::Runtime::new().map_err(|e| VetchError::Io {
        message: "Failed to create async runtime".to_string(),
        source: e,
    })?;

    rt.block_on(async {
        let harvester = Harvester::new(&config)?;

        output.step("🔍", &format!("Discovering top {} packages", cli.count));

        if cli.list_only {
            let names = harvester.discover(cli.count).await?;
            for name in &names {
                println!("{}", name);
            }
            output.success(&format!("Found {} packages", names.len()));
            return Ok(());
        }

        output.step(
            "📥",
            &format!("Downloading into {}", config.target_directory.display()),
        );
        let summary = harvester.run(cli.count).await?;
        output.success(&format!(
            "Downloaded {} packages in {:.2}s",
            summary.downloaded,
            summary.elapsed.as_secs_f64()
        ));
        Ok(())
    })
}

/// Layer CLI flags over the environment-derived configuration
fn apply_overrides(cli: &Cli, mut config: Config) -> Config {
    if let Some(url) = &cli.package_url {
        config.package_url = url.clone();
    }
    if let Some(url) = &cli.registry_url {
        config.registry_url = url.clone();
    }
    if let Some(dir) = &cli.target_directory {
        config.target_directory = dir.clone();
    }
    if let Some(limit) = cli.async_limit {
        config.async_limit = limit;
    }
    if let Some(limit) = cli.scrape_limit {
        config.scrape_limit = limit;
    }
    if let Some(level) = cli.debug {
        config.verbosity = level;
    }
    config
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let directives = [
        "vetch",
        "vetch_core",
        "vetch_config",
        "vetch_registry",
        "vetch_harvest",
    ]
    .map(|target| format!("{}={}", target, level))
    .join(",");

    tracing_subscriber::fmt()
        .with_env_filter(directives)
        .with_target(false)
        .init();
}
