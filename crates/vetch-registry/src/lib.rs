//! npm listing scraper and registry client for vetch
//!
//! This crate covers the discovery half of the pipeline: scraping the
//! "most depended upon" browse listing into an ordered list of package
//! names, and resolving each name against the registry to a downloadable
//! [`vetch_core::PackageRecord`].

pub mod api;
pub mod browse;
pub mod client;
pub mod resolve;

// Re-export main types
pub use api::{DistInfo, Packument, VersionMetadata};
pub use browse::{BrowseClient, EmptyPageRetry};
pub use client::RegistryClient;
pub use resolve::{resolve_packages, ResolveOutcome};

use vetch_core::error::VetchError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, VetchError>;
