//! Tarball download pipeline and orchestration for vetch
//!
//! This crate consumes the records produced by `vetch-registry`: it
//! downloads every package tarball with bounded concurrency, verifies the
//! registry checksum when one exists, and unpacks each archive into its
//! package subdirectory. [`Harvester`] wires discovery, resolution and
//! download into the single entry point the CLI calls.

pub mod download;
pub mod harvester;
pub mod tarball;

// Re-export main types
pub use download::{DownloadOutcome, Downloader};
pub use harvester::{HarvestSummary, Harvester};

use vetch_core::error::VetchError;

/// Result type for harvest operations
pub type HarvestResult<T> = Result<T, VetchError>;
