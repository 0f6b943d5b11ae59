//! Byte-preserving file copy.
//!
//! Used only when a fast rename is not available (cross-volume moves). The
//! copy carries the source's permission bits and its original modification
//! time, so provenance survives the transfer. On failure a partial
//! destination may remain; the relocator is responsible for cleaning it up.

use super::ActionError;
use filetime::FileTime;
use std::fs::File;
use std::io;
use std::path::Path;

/// Copy `src` to `dst`, truncating any existing content at `dst`.
///
/// Preserves permission bits and sets the destination's modification time
/// to the source's original one. Verification is the caller's job.
pub fn copy_file(src: &Path, dst: &Path) -> Result<(), ActionError> {
    let mut source = File::open(src).map_err(|source| ActionError::Open {
        path: src.to_path_buf(),
        source,
    })?;
    let meta = source.metadata().map_err(|source| ActionError::Open {
        path: src.to_path_buf(),
        source,
    })?;

    let mut dest = File::create(dst).map_err(ActionError::Copy)?;
    dest.set_permissions(meta.permissions())
        .map_err(ActionError::Copy)?;
    io::copy(&mut source, &mut dest).map_err(ActionError::Copy)?;

    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_mtime(dst, mtime).map_err(ActionError::Copy)?;
    Ok(())
}
