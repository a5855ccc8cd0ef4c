//! Write-to-temp-then-rename file replacement
//!
//! The temporary file always lives in the target's directory so the final
//! rename stays on one filesystem and readers observe either the previous
//! complete file or the new one.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{RepositoryError, RepositoryResult};
use crate::fs::FileSystem;

/// Returns the temporary path used while replacing `target`
#[must_use]
pub fn temp_path_for(target: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.tmp.{}.{nanos}", std::process::id()))
}

/// Atomically replaces `target` with `contents`
///
/// Parent directories are created when missing. On failure the temporary
/// file is removed and `target` is left as it was.
///
/// # Errors
///
/// Returns `RepositoryError::Io` if the directory cannot be created, or the
/// temporary file cannot be written or renamed over `target`.
pub fn atomic_write(
    fs: &dyn FileSystem,
    target: &Path,
    contents: &[u8],
    mode: u32,
) -> RepositoryResult<()> {
    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs.create_dir_all(dir)
            .map_err(|e| RepositoryError::io("create directory", dir, e))?;
    }

    let temp = temp_path_for(target);
    if let Err(e) = fs.write(&temp, contents, mode) {
        discard(fs, &temp);
        return Err(RepositoryError::io("write temporary file", &temp, e));
    }

    if let Err(e) = fs.rename(&temp, target) {
        discard(fs, &temp);
        return Err(RepositoryError::io("replace", target, e));
    }

    tracing::trace!(path = %target.display(), bytes = contents.len(), "File replaced");
    Ok(())
}

fn discard(fs: &dyn FileSystem, temp: &Path) {
    if matches!(fs.exists(temp), Ok(true)) {
        if let Err(e) = fs.remove_file(temp) {
            tracing::warn!(path = %temp.display(), error = %e, "Failed to remove temporary file");
        }
    }
}
