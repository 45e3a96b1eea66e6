mod file_list;
mod gesture;
mod matcher;
mod pane;
mod projection;
mod scroll;
mod selection;
mod types;

pub use file_list::{FileList, SnapshotUpdate};
pub use gesture::{CursorMove, DEFAULT_MARGIN_ROWS, GestureController};
pub use matcher::{FilterKind, Matcher, NameFilter, build_filter};
pub use pane::{Activation, Pane, RefreshOutcome, RefreshTicket};
pub use projection::{ViewRow, filter_rows, project, sort_entries};
pub use scroll::{ScrollGeometry, scroll_into_view};
pub use selection::Selection;
pub use types::{Entry, SORT_KEYS, SortKey, StyleToken, extension_of, style_token};
