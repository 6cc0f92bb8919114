//! Write-temp-then-rename file replacement

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `data` to a uniquely named temp file next to `path`
///
/// The returned file is not visible under `path` until it is persisted.
pub fn stage(path: &Path, data: &[u8]) -> std::io::Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    Ok(file)
}

/// Atomically replace `path` with `data`
///
/// Readers observe either the previous content or the new content, never a
/// partial write. Concurrent writers each use their own temp file, so the
/// last rename wins.
pub fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let staged = stage(path, data)?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}
