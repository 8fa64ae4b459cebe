use crate::error::{Result, ToolError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `contents` to `path` through a temp file in the same directory, so
/// readers never observe a partially written file.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(|e| ToolError::io(dir, e))?;
    staged
        .write_all(contents)
        .and_then(|_| staged.flush())
        .map_err(|e| ToolError::io(path, e))?;
    staged.persist(path)?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(())
}
