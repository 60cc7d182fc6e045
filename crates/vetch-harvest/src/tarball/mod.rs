//! Tarball unpacking
//!
//! npm tarballs wrap their contents in a single root directory (almost
//! always `package/`). Unpacking strips that root component and validates
//! every entry path so a hostile archive cannot write outside the
//! destination directory.

use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;

use vetch_core::error::VetchError;

use crate::HarvestResult;

/// Unpack a gzipped tarball into a destination directory
pub fn unpack_archive<R: Read>(reader: R, dest_dir: &Path) -> HarvestResult<()> {
    let gz_decoder = GzDecoder::new(reader);
    let mut archive = Archive::new(gz_decoder);

    fs::create_dir_all(dest_dir)
        .map_err(|e| VetchError::io(format!("Failed to create {}", dest_dir.display()), e))?;

    let entries = archive
        .entries()
        .map_err(|e| VetchError::io("Failed to read archive".to_string(), e))?;

    for entry_result in entries {
        let mut entry =
            entry_result.map_err(|e| VetchError::io("Failed to read archive entry".to_string(), e))?;

        let entry_path = entry
            .path()
            .map_err(|e| VetchError::io("Failed to read archive entry path".to_string(), e))?
            .into_owned();

        let Some(dest_path) = entry_destination(&entry_path, dest_dir)? else {
            // The root wrapper directory itself
            continue;
        };

        let entry_type = entry.header().entry_type();
        let mode = entry.header().mode().ok();

        match entry_type {
            tar::EntryType::Regular => {
                if let Some(parent) = dest_path.parent() {
                    fs::create_dir_all(parent).map_err(|e| {
                        VetchError::io(format!("Failed to create {}", parent.display()), e)
                    })?;
                }
                let mut file = fs::File::create(&dest_path).map_err(|e| {
                    VetchError::io(format!("Failed to create {}", dest_path.display()), e)
                })?;
                std::io::copy(&mut entry, &mut file).map_err(|e| {
                    VetchError::io(format!("Failed to write {}", dest_path.display()), e)
                })?;
            }
            tar::EntryType::Directory => {
                fs::create_dir_all(&dest_path).map_err(|e| {
                    VetchError::io(format!("Failed to create {}", dest_path.display()), e)
                })?;
            }
            other => {
                // Published npm archives only carry files and directories
                debug!(entry = %entry_path.display(), kind = ?other, "skipping archive entry");
                continue;
            }
        }

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode));
        }
        #[cfg(not(unix))]
        let _ = mode;
    }

    Ok(())
}

/// Map an archive entry path onto its destination below `dest_dir`.
///
/// The entry's first component (the archive root wrapper) is dropped.
/// Returns `Ok(None)` for the wrapper itself; rejects parent-dir and
/// absolute components anywhere in the path.
fn entry_destination(entry_path: &Path, dest_dir: &Path) -> HarvestResult<Option<PathBuf>> {
    let mut parts = Vec::new();
    for component in entry_path.components() {
        match component {
            Component::Normal(name) => parts.push(name),
            Component::CurDir => continue,
            Component::ParentDir => {
                return Err(VetchError::Archive {
                    reason: format!("directory traversal: {}", entry_path.display()),
                });
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(VetchError::Archive {
                    reason: format!("absolute path: {}", entry_path.display()),
                });
            }
        }
    }

    if parts.len() < 2 {
        return Ok(None);
    }

    let mut dest_path = dest_dir.to_path_buf();
    for part in &parts[1..] {
        dest_path.push(part);
    }
    Ok(Some(dest_path))
}
