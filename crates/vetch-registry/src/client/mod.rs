//! HTTP client for registry metadata lookups

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use vetch_core::error::VetchError;
use vetch_core::PackageRecord;

use crate::api::Packument;
use crate::RegistryResult;

/// Registry responses are requested in the abbreviated install format,
/// which omits readmes and other fields vetch never looks at.
const ABBREVIATED_METADATA: &str = "application/vnd.npm.install-v1+json";

/// HTTP client for npm registry metadata operations
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Base registry URL
    base_url: String,
}

impl RegistryClient {
    /// Create a registry client against the given base URL
    pub fn new(base_url: impl Into<String>) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .user_agent(concat!("vetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VetchError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the packument for a package name
    pub async fn fetch_packument(&self, package_name: &str) -> RegistryResult<Packument> {
        let encoded_name = encode_package_name(package_name);
        let url = format!("{}/{}", self.base_url, encoded_name);

        let response = self
            .client
            .get(&url)
            .header("Accept", ABBREVIATED_METADATA)
            .send()
            .await
            .map_err(|e| {
                VetchError::network(format!("Failed to fetch metadata for {}", package_name), e)
            })?;

        match response.status() {
            reqwest::StatusCode::OK => response.json::<Packument>().await.map_err(|e| {
                VetchError::network(format!("Failed to parse metadata for {}", package_name), e)
            }),
            reqwest::StatusCode::NOT_FOUND => Err(VetchError::PackageNotFound {
                name: package_name.to_string(),
            }),
            status => Err(VetchError::network_msg(format!(
                "Registry returned status {} for {}",
                status, package_name
            ))),
        }
    }

    /// Resolve a package name to its latest published artifact
    pub async fn resolve(&self, package_name: &str) -> RegistryResult<PackageRecord> {
        let packument = self.fetch_packument(package_name).await?;

        let latest = packument
            .dist_tags
            .get("latest")
            .ok_or_else(|| VetchError::Metadata {
                package: package_name.to_string(),
                reason: "no 'latest' dist-tag".to_string(),
            })?;

        let version = packument
            .versions
            .get(latest)
            .ok_or_else(|| VetchError::Metadata {
                package: package_name.to_string(),
                reason: format!("latest tag points at missing version '{}'", latest),
            })?;

        tracing::debug!(
            package = %package_name,
            version = %version.version,
            "resolved latest version"
        );

        Ok(PackageRecord {
            name: packument.name,
            version: version.version.clone(),
            tarball_url: version.dist.tarball.clone(),
            shasum: version.dist.shasum.clone(),
        })
    }
}

/// Encode a package name for the registry URL path.
///
/// Scoped packages keep their `@` but the separating slash must be
/// percent-encoded: `@org/pkg` becomes `@org%2fpkg`.
fn encode_package_name(name: &str) -> String {
    if name.starts_with('@') {
        name.replace('/', "%2f")
    } else {
        name.to_string()
    }
}
