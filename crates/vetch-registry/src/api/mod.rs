//! npm registry API response types
//!
//! Only the subset of the packument needed to pick the latest version and
//! find its tarball is modeled; the abbreviated-metadata Accept header
//! keeps the payload close to this shape.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Package metadata response from the registry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Packument {
    /// Package name
    pub name: String,
    /// Tag-to-version mapping; `latest` is the one vetch follows
    #[serde(rename = "dist-tags")]
    pub dist_tags: HashMap<String, String>,
    /// All published versions
    pub versions: HashMap<String, VersionMetadata>,
}

/// Metadata for a specific package version
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionMetadata {
    /// Version string
    pub version: String,
    /// Distribution information
    pub dist: DistInfo,
}

/// Distribution information for a package tarball
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DistInfo {
    /// Tarball download URL
    pub tarball: String,
    /// SHA-1 checksum, when the registry publishes one
    pub shasum: Option<String>,
}
