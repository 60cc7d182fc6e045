//! Bounded-concurrency tarball download
//!
//! Each record is fetched and unpacked independently under a shared
//! concurrency cap. Item failures never cancel in-flight siblings: every
//! item settles, failures are logged with the failing package's identity,
//! and the partitioned outcome lets the orchestrator decide what a partial
//! batch means.

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, ClientBuilder};
use sha1::{Digest, Sha1};
use tracing::{debug, error};

use vetch_core::error::VetchError;
use vetch_core::{types, PackageRecord};

use crate::tarball;
use crate::HarvestResult;

/// Bounded-concurrency downloader writing into one target directory
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    target_dir: PathBuf,
    limit: usize,
}

/// Outcome of a download batch, partitioned into successes and failures
#[derive(Debug)]
pub struct DownloadOutcome {
    /// Number of packages fetched and unpacked
    pub downloaded: usize,
    /// Per-package failures, in completion order
    pub failures: Vec<(String, VetchError)>,
}

impl DownloadOutcome {
    /// Whether every record downloaded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Downloader {
    /// Create a downloader targeting a directory
    pub fn new(target_dir: impl Into<PathBuf>) -> HarvestResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(50)
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .user_agent(concat!("vetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VetchError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            target_dir: target_dir.into(),
            limit: 10,
        })
    }

    /// Set the download concurrency cap (minimum 1)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Download and unpack every record with at most `limit` in flight
    pub async fn download_all(&self, records: &[PackageRecord]) -> HarvestResult<DownloadOutcome> {
        std::fs::create_dir_all(&self.target_dir).map_err(|e| {
            VetchError::io(format!("Failed to create {}", self.target_dir.display()), e)
        })?;

        let results: Vec<(String, Result<(), VetchError>)> = stream::iter(records)
            .map(|record| async move { (record.name.clone(), self.download_one(record).await) })
            .buffer_unordered(self.limit)
            .collect()
            .await;

        let mut downloaded = 0;
        let mut failures = Vec::new();
        for (name, result) in results {
            match result {
                Ok(()) => downloaded += 1,
                Err(err) => {
                    error!(package = %name, "download failed: {}", err);
                    failures.push((name, err));
                }
            }
        }

        Ok(DownloadOutcome {
            downloaded,
            failures,
        })
    }

    async fn download_one(&self, record: &PackageRecord) -> Result<(), VetchError> {
        let subdir = types::package_subdir(&record.name).ok_or_else(|| VetchError::Archive {
            reason: format!("package name '{}' does not map to a directory", record.name),
        })?;

        let response = self
            .client
            .get(&record.tarball_url)
            .send()
            .await
            .map_err(|e| {
                VetchError::network(format!("Failed to download {}", record.tarball_url), e)
            })?;

        if !response.status().is_success() {
            return Err(VetchError::network_msg(format!(
                "Tarball fetch returned status {} for {}",
                response.status(),
                record.name
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            VetchError::network(format!("Failed to read tarball for {}", record.name), e)
        })?;

        if let Some(expected) = &record.shasum {
            verify_shasum(&record.name, &bytes, expected)?;
        }

        let dest_dir = self.target_dir.join(subdir);
        tarball::unpack_archive(Cursor::new(bytes.as_ref()), &dest_dir)?;

        debug!(
            package = %record.name,
            version = %record.version,
            dest = %dest_dir.display(),
            "unpacked package"
        );
        Ok(())
    }
}

/// Check downloaded bytes against the registry's SHA-1 shasum
fn verify_shasum(package: &str, bytes: &[u8], expected: &str) -> Result<(), VetchError> {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let actual = hex::encode(hasher.finalize());

    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(VetchError::ChecksumMismatch {
            package: package.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_shasum_accepts_matching_digest() {
        let bytes = b"tarball bytes";
        let mut hasher = Sha1::new();
        hasher.update(bytes);
        let digest = hex::encode(hasher.finalize());

        assert!(verify_shasum("demo", bytes, &digest).is_ok());
        assert!(verify_shasum("demo", bytes, &digest.to_uppercase()).is_ok());
    }

    #[test]
    fn test_verify_shasum_rejects_mismatch() {
        let result = verify_shasum("demo", b"tarball bytes", "deadbeef");
        match result.unwrap_err() {
            VetchError::ChecksumMismatch { package, .. } => assert_eq!(package, "demo"),
            other => panic!("Expected ChecksumMismatch, got {:?}", other),
        }
    }
}
