//! Filesystem utilities for writing outputs without partial files.
//!
//! Encoders and tag writers produce their result in a temporary file next to
//! the final path, then rename it into place. A failed write leaves the
//! destination (which may be the source file itself) untouched.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Create the parent directory of `path` if it does not exist yet.
pub async fn ensure_parent_dir(path: impl AsRef<Path>) -> MediaResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Create an empty temporary file in the same directory as `path`.
///
/// The file keeps `path`'s extension so tools that sniff extensions behave,
/// and is deleted when the returned [`TempPath`] is dropped.
pub fn temp_sibling(path: &Path) -> MediaResult<TempPath> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let suffix = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let file = tempfile::Builder::new()
        .prefix(".strim-")
        .suffix(&suffix)
        .tempfile_in(&dir)?;

    Ok(file.into_temp_path())
}

/// Rename a finished temporary file over `dst`.
///
/// Both paths live in the same directory, so the rename is atomic.
pub fn persist(tmp: TempPath, dst: &Path) -> MediaResult<()> {
    tmp.persist(dst).map_err(|e| {
        tracing::error!(
            "Failed to move temp file into place: {} -> {}: {}",
            e.path.display(),
            dst.display(),
            e.error
        );
        MediaError::from(e.error)
    })
}
