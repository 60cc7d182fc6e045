//! Batch metadata resolution with bounded concurrency
//!
//! Every name gets an independent registry lookup; results are collected
//! into a partitioned outcome instead of aborting on the first failure, so
//! the caller can report everything that went wrong and still decide the
//! batch's fate. In-flight lookups always run to completion.

use futures::stream::{self, StreamExt};
use tracing::debug;

use vetch_core::error::VetchError;
use vetch_core::PackageRecord;

use crate::client::RegistryClient;

/// Outcome of a batch resolution, partitioned into successes and failures
#[derive(Debug)]
pub struct ResolveOutcome {
    /// Resolved records, in the order the names were given
    pub records: Vec<PackageRecord>,
    /// Per-name failures, in the order the names were given
    pub failures: Vec<(String, VetchError)>,
}

impl ResolveOutcome {
    /// Whether every name resolved
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolve a batch of package names with at most `limit` lookups in flight
pub async fn resolve_packages(
    client: &RegistryClient,
    names: &[String],
    limit: usize,
) -> ResolveOutcome {
    debug!(total = names.len(), limit, "resolving package metadata");

    let results: Vec<(String, Result<PackageRecord, VetchError>)> =
        stream::iter(names.iter().cloned())
            .map(|name| async move {
                let result = client.resolve(&name).await;
                (name, result)
            })
            .buffered(limit.max(1))
            .collect()
            .await;

    let mut records = Vec::with_capacity(names.len());
    let mut failures = Vec::new();
    for (name, result) in results {
        match result {
            Ok(record) => records.push(record),
            Err(error) => failures.push((name, error)),
        }
    }

    ResolveOutcome { records, failures }
}
