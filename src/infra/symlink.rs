use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveLinkError {
    #[error("failed to resolve {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves `path` to its final target when it is a symbolic link; other paths
/// are returned as-is.
pub fn resolve_symbolic_link(path: &Path) -> Result<PathBuf, ResolveLinkError> {
    let io_error = |source| ResolveLinkError::Io {
        path: path.display().to_string(),
        source,
    };
    let metadata = fs::symlink_metadata(path).map_err(io_error)?;
    if !metadata.file_type().is_symlink() {
        return Ok(path.to_path_buf());
    }
    fs::canonicalize(path).map_err(io_error)
}
