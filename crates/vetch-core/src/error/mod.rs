//! Error types and result aliases for vetch operations.
//!
//! Provides a unified error type that covers all error conditions across
//! the vetch pipeline with actionable error messages.

use thiserror::Error;

/// Unified error type for all vetch operations
#[derive(Error, Debug)]
pub enum VetchError {
    // Config errors
    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Transport errors: never retried, abort the calling stage
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Listing errors
    #[error("No package names found on {url} after {attempts} attempts")]
    EmptyListing { url: String, attempts: u32 },

    // Registry errors
    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    #[error("Metadata for '{package}' is unusable: {reason}")]
    Metadata { package: String, reason: String },

    // Download errors
    #[error("Checksum mismatch for {package}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        package: String,
        expected: String,
        actual: String,
    },

    #[error("Malformed archive entry: {reason}")]
    Archive { reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for vetch operations
pub type VetchResult<T> = Result<T, VetchError>;

impl VetchError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create a network error with no underlying cause
    pub fn network_msg(message: String) -> Self {
        Self::Network {
            message,
            source: None,
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable by retrying the run
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VetchError::Network { .. } | VetchError::EmptyListing { .. } | VetchError::Io { .. }
        )
    }
}
