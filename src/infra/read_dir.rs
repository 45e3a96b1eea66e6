use crate::domain::{Entry, extension_of};
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::trace;
use walkdir::WalkDir;

const MODIFIED_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]/[month]/[day] [hour]:[minute]:[second]");

#[derive(Debug, Error)]
pub enum ReadDirError {
    #[error("directory does not exist: {0}")]
    Missing(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
}

#[derive(Clone, Copy, Debug)]
pub struct ReadDirOptions {
    pub show_hidden: bool,
    /// Offset used to render modification times. Resolve it once at startup:
    /// the local offset is not reliably available from worker threads.
    pub offset: UtcOffset,
}

impl Default for ReadDirOptions {
    fn default() -> Self {
        Self {
            show_hidden: false,
            offset: UtcOffset::UTC,
        }
    }
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Reads the direct children of `dir` into a snapshot. Entries that vanish or
/// cannot be inspected mid-read are skipped; failing to open `dir` itself is an
/// error, never an empty snapshot.
pub fn read_dir_entries(dir: &Path, options: ReadDirOptions) -> Result<Vec<Entry>, ReadDirError> {
    if !dir.exists() {
        return Err(ReadDirError::Missing(dir.display().to_string()));
    }
    if !dir.is_dir() {
        return Err(ReadDirError::NotADirectory(dir.display().to_string()));
    }

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for item in walker {
        let item = match item {
            Ok(item) => item,
            Err(error) if error.depth() == 0 => {
                return Err(ReadDirError::Read {
                    path: dir.display().to_string(),
                    message: error.to_string(),
                });
            }
            Err(_error) => {
                skipped += 1;
                continue;
            }
        };

        let name = item.file_name().to_string_lossy().to_string();
        if !options.show_hidden && name.starts_with('.') {
            continue;
        }

        let Ok(metadata) = item.metadata() else {
            skipped += 1;
            continue;
        };
        let is_dir =
            item.file_type().is_dir() || (item.path_is_symlink() && item.path().is_dir());
        let modified = metadata
            .modified()
            .map(|time| format_modified(time, options.offset))
            .unwrap_or_default();

        entries.push(Entry {
            extension: if is_dir {
                String::new()
            } else {
                extension_of(&name)
            },
            size: if is_dir { 0 } else { metadata.len() },
            name,
            is_dir,
            modified,
        });
    }

    trace!(dir = %dir.display(), entries = entries.len(), skipped, "directory read");
    Ok(entries)
}

pub fn format_modified(time: SystemTime, offset: UtcOffset) -> String {
    OffsetDateTime::from(time)
        .to_offset(offset)
        .format(MODIFIED_FORMAT)
        .unwrap_or_default()
}
