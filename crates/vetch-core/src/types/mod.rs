//! Package record types and name handling.
//!
//! A package name is an opaque `String` taken from the listing page; scoped
//! names (`@scope/name`) are the only structure vetch cares about, and only
//! for mapping a package onto its install subdirectory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A package resolved to its downloadable artifact.
///
/// Produced once by metadata resolution and consumed once by the
/// downloader; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    pub tarball_url: String,
    /// SHA-1 checksum published by the registry, when present
    pub shasum: Option<String>,
}

impl PackageRecord {
    /// Create a record with no checksum
    pub fn new(name: String, version: String, tarball_url: String) -> Self {
        Self {
            name,
            version,
            tarball_url,
            shasum: None,
        }
    }

    /// Whether this package belongs to an npm scope
    pub fn is_scoped(&self) -> bool {
        is_scoped(&self.name)
    }
}

/// Whether a package name is scoped (`@scope/name`)
pub fn is_scoped(name: &str) -> bool {
    name.starts_with('@') && name.contains('/')
}

/// Map a package name onto its subdirectory below the target directory.
///
/// Unscoped names map to a single component, scoped names to
/// `@scope/<name>`. Returns `None` for names that cannot be used as a
/// directory path (empty, absolute, or containing `.`/`..` components).
pub fn package_subdir(name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.starts_with('/') {
        return None;
    }

    let mut path = PathBuf::new();
    for component in name.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return None;
        }
        path.push(component);
    }

    // A scoped name has exactly two components; anything deeper is not a
    // valid npm name and would nest unpredictably.
    if name.matches('/').count() > 1 {
        return None;
    }

    Some(path)
}
