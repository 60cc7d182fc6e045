//! Configuration for the vetch pipeline.
//!
//! Provides an explicit [`Config`] struct with named fields and defaults,
//! layered from environment variables. The environment is read once at
//! startup; everything downstream receives the struct, never the
//! environment.

use std::path::PathBuf;

use vetch_core::error::VetchError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, VetchError>;

/// Default "most depended upon" browse listing; a numeric offset is
/// appended directly to this URL.
pub const DEFAULT_PACKAGE_URL: &str = "https://www.npmjs.com/browse/depended?offset=";

/// Default npm registry endpoint for metadata lookups
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Default download destination
pub const DEFAULT_TARGET_DIRECTORY: &str = "./packages";

/// Default metadata/download concurrency
pub const DEFAULT_ASYNC_LIMIT: usize = 10;

/// Default listing-page scrape concurrency. The browse site is unreliable
/// under concurrent load, so pages are fetched one at a time unless the
/// caller raises this.
pub const DEFAULT_SCRAPE_LIMIT: usize = 1;

/// Runtime configuration for a harvest run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base listing URL, ending in an `offset=` query suffix
    pub package_url: String,
    /// Registry endpoint for metadata lookups
    pub registry_url: String,
    /// Directory tarballs are unpacked into
    pub target_directory: PathBuf,
    /// Concurrency cap for metadata resolution and downloads
    pub async_limit: usize,
    /// Concurrency cap for listing-page scrapes
    pub scrape_limit: usize,
    /// Verbosity: 0 = silent, 1 = info, 2 = verbose
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package_url: DEFAULT_PACKAGE_URL.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            target_directory: PathBuf::from(DEFAULT_TARGET_DIRECTORY),
            async_limit: DEFAULT_ASYNC_LIMIT,
            scrape_limit: DEFAULT_SCRAPE_LIMIT,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Build a configuration from the process environment.
    ///
    /// Recognized variables: `PACKAGE_URL`, `REGISTRY_URL`,
    /// `TARGET_DIRECTORY`, `ASYNC_LIMIT`, `SCRAPE_LIMIT`, `DEBUG`.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests inject their own lookup so they
    /// never touch (or race on) the process environment.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("PACKAGE_URL") {
            config.package_url = url;
        }
        if let Some(url) = lookup("REGISTRY_URL") {
            config.registry_url = url;
        }
        if let Some(dir) = lookup("TARGET_DIRECTORY") {
            config.target_directory = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("ASYNC_LIMIT") {
            config.async_limit = parse_limit("ASYNC_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("SCRAPE_LIMIT") {
            config.scrape_limit = parse_limit("SCRAPE_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("DEBUG") {
            config.verbosity = raw.trim().parse::<u8>().map_err(|_| {
                VetchError::ConfigValidation {
                    field: "DEBUG".to_string(),
                    reason: format!("expected 0, 1 or 2, got '{}'", raw),
                }
            })?;
        }

        Ok(config)
    }

    /// Validate field invariants before handing the config to the pipeline
    pub fn validate(&self) -> ConfigResult<()> {
        validate_http_url("package_url", &self.package_url)?;
        validate_http_url("registry_url", &self.registry_url)?;

        if self.async_limit == 0 {
            return Err(VetchError::ConfigValidation {
                field: "async_limit".to_string(),
                reason: "concurrency limit must be at least 1".to_string(),
            });
        }
        if self.scrape_limit == 0 {
            return Err(VetchError::ConfigValidation {
                field: "scrape_limit".to_string(),
                reason: "concurrency limit must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_limit(field: &str, raw: &str) -> ConfigResult<usize> {
    let value = raw
        .trim()
        .parse::<usize>()
        .map_err(|_| VetchError::ConfigValidation {
            field: field.to_string(),
            reason: format!("expected a positive integer, got '{}'", raw),
        })?;

    if value == 0 {
        return Err(VetchError::ConfigValidation {
            field: field.to_string(),
            reason: "concurrency limit must be at least 1".to_string(),
        });
    }

    Ok(value)
}

fn validate_http_url(field: &str, raw: &str) -> ConfigResult<()> {
    let parsed = url::Url::parse(raw).map_err(|e| VetchError::ConfigValidation {
        field: field.to_string(),
        reason: format!("invalid URL '{}': {}", raw, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(VetchError::ConfigValidation {
            field: field.to_string(),
            reason: format!("unsupported URL scheme '{}'", scheme),
        }),
    }
}
