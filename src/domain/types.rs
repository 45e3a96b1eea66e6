use serde::{Deserialize, Serialize};

/// One directory entry as supplied by a snapshot. `name` is the only identity
/// that survives across snapshots.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    pub extension: String,
    pub size: u64,
    pub modified: String,
}

impl Entry {
    pub fn file(name: &str, size: u64, modified: &str) -> Self {
        Self {
            name: name.to_string(),
            is_dir: false,
            extension: extension_of(name),
            size,
            modified: modified.to_string(),
        }
    }

    pub fn dir(name: &str, modified: &str) -> Self {
        Self {
            name: name.to_string(),
            is_dir: true,
            extension: String::new(),
            size: 0,
            modified: modified.to_string(),
        }
    }

    /// `folder` for directories, `-` when there is no extension.
    pub fn type_label(&self) -> &str {
        if self.is_dir {
            return "folder";
        }
        if self.extension.is_empty() {
            return "-";
        }
        &self.extension
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

pub fn extension_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Type,
    Size,
    Date,
}

pub const SORT_KEYS: [SortKey; 4] = [SortKey::Name, SortKey::Type, SortKey::Size, SortKey::Date];

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Type => "Type",
            Self::Size => "Size",
            Self::Date => "Date",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "type" => Some(Self::Type),
            "size" => Some(Self::Size),
            "date" => Some(Self::Date),
            _ => None,
        }
    }
}

/// Coarse visual class of an entry, resolved from `(name, is_dir)` only.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StyleToken {
    Directory,
    Hidden,
    Archive,
    Image,
    Source,
    Document,
    Plain,
}

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "tgz", "xz", "bz2", "7z", "rar", "zst"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "svg", "webp", "ico"];
const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "c", "h", "cpp", "hpp", "py", "js", "ts", "tsx", "go", "java", "sh", "toml", "json",
];
const DOCUMENT_EXTENSIONS: &[&str] = &["md", "txt", "pdf", "rst", "html", "csv"];

pub fn style_token(name: &str, is_dir: bool) -> StyleToken {
    if is_dir {
        return StyleToken::Directory;
    }
    if name.starts_with('.') {
        return StyleToken::Hidden;
    }

    let extension = extension_of(name).to_ascii_lowercase();
    let is_in = |list: &[&str]| list.iter().any(|candidate| *candidate == extension);
    if is_in(ARCHIVE_EXTENSIONS) {
        StyleToken::Archive
    } else if is_in(IMAGE_EXTENSIONS) {
        StyleToken::Image
    } else if is_in(SOURCE_EXTENSIONS) {
        StyleToken::Source
    } else if is_in(DOCUMENT_EXTENSIONS) {
        StyleToken::Document
    } else {
        StyleToken::Plain
    }
}
