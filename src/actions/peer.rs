//! Storage-volume identity check.
//!
//! Moving within one volume can use an atomic rename; moving across volumes
//! needs copy+delete. The distinction is made by comparing device ids: the
//! source's containing directory against the destination directory itself.

use super::ActionError;
use std::path::Path;

/// Whether `source` and the destination directory reside on the same
/// storage volume. Fails if either side cannot be inspected.
#[cfg(unix)]
pub fn same_volume(source: &Path, dest_dir: &Path) -> Result<bool, ActionError> {
    use std::os::unix::fs::MetadataExt;

    let source_dir = source.parent().unwrap_or_else(|| Path::new("."));
    let src_meta = std::fs::metadata(source_dir).map_err(ActionError::FilesystemCheck)?;
    let dest_meta = std::fs::metadata(dest_dir).map_err(ActionError::FilesystemCheck)?;
    Ok(src_meta.dev() == dest_meta.dev())
}

/// Without a device id to compare, report distinct volumes so the relocator
/// takes the copy+verify+delete path, which is always safe.
#[cfg(not(unix))]
pub fn same_volume(source: &Path, dest_dir: &Path) -> Result<bool, ActionError> {
    let source_dir = source.parent().unwrap_or_else(|| Path::new("."));
    std::fs::metadata(source_dir).map_err(ActionError::FilesystemCheck)?;
    std::fs::metadata(dest_dir).map_err(ActionError::FilesystemCheck)?;
    Ok(false)
}
