//! Pipeline orchestration
//!
//! Wires the three stages together: listing aggregation, metadata
//! resolution, tarball download. The first error at any stage
//! short-circuits the stages after it; partitioned per-item failures are
//! logged in full before the first one is propagated.

use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use vetch_config::Config;
use vetch_registry::{resolve_packages, BrowseClient, RegistryClient};

use crate::download::Downloader;
use crate::HarvestResult;

/// Result of a completed harvest run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Number of packages asked for
    pub requested: usize,
    /// Number of packages fetched and unpacked
    pub downloaded: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Orchestrates listing aggregation, resolution and download
pub struct Harvester {
    browse: BrowseClient,
    registry: RegistryClient,
    downloader: Downloader,
    async_limit: usize,
}

impl Harvester {
    /// Build a harvester from a validated configuration
    pub fn new(config: &Config) -> HarvestResult<Self> {
        config.validate()?;

        let browse =
            BrowseClient::new(config.package_url.clone())?.with_scrape_limit(config.scrape_limit);
        let registry = RegistryClient::new(config.registry_url.clone())?;
        let downloader =
            Downloader::new(config.target_directory.clone())?.with_limit(config.async_limit);

        Ok(Self {
            browse,
            registry,
            downloader,
            async_limit: config.async_limit,
        })
    }

    /// Discover the top `count` package names without resolving or
    /// downloading anything
    pub async fn discover(&self, count: usize) -> HarvestResult<Vec<String>> {
        let names = self.browse.aggregate(count).await?;
        debug!(total = names.len(), "aggregated package names");
        for (index, name) in names.iter().enumerate() {
            debug!("{}: {}", index, name);
        }
        Ok(names)
    }

    /// Run the full pipeline for the top `count` packages
    pub async fn run(&self, count: usize) -> HarvestResult<HarvestSummary> {
        let started = Instant::now();

        let names = self.discover(count).await?;
        if names.is_empty() {
            return Ok(HarvestSummary {
                requested: count,
                downloaded: 0,
                elapsed: started.elapsed(),
            });
        }

        info!(total = names.len(), "resolving package metadata");
        let mut resolution = resolve_packages(&self.registry, &names, self.async_limit).await;
        if !resolution.is_complete() {
            for (name, err) in &resolution.failures {
                error!(package = %name, "metadata resolution failed: {}", err);
            }
            let (_, first) = resolution.failures.remove(0);
            return Err(first);
        }

        info!(total = resolution.records.len(), "downloading tarballs");
        let mut outcome = self.downloader.download_all(&resolution.records).await?;
        if !outcome.is_complete() {
            // Each failure was already logged with its package identity
            let (_, first) = outcome.failures.remove(0);
            return Err(first);
        }

        Ok(HarvestSummary {
            requested: count,
            downloaded: outcome.downloaded,
            elapsed: started.elapsed(),
        })
    }
}
