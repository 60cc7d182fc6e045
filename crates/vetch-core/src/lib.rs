//! # vetch-core
//!
//! Core types and utilities shared across all vetch crates.
//!
//! This crate provides:
//! - `PackageRecord` and package-name path mapping
//! - `VetchError` for unified error handling
//!
//! Everything HTTP-facing lives in `vetch-registry` and `vetch-harvest`;
//! this crate stays dependency-light so every other crate can use it.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{VetchError, VetchResult};
pub use types::PackageRecord;
