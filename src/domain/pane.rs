use super::{
    CursorMove, Entry, FileList, FilterKind, GestureController, Matcher, ScrollGeometry,
    SnapshotUpdate, SortKey, build_filter, scroll_into_view,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

const HEADER_ROWS: usize = 1;

/// Handle for one directory read. The pane only accepts the result of the most
/// recent ticket issued for its current directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RefreshTicket {
    pub generation: u64,
    pub dir: PathBuf,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefreshOutcome {
    Loaded,
    Resynced,
    Applied { added: usize },
    Unchanged,
    Deferred,
    Stale,
    Failed,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Activation {
    EnterDirectory(PathBuf),
    OpenFile(PathBuf),
}

#[derive(Clone, Debug)]
pub struct Pane {
    dir: PathBuf,
    list: FileList,
    gesture: GestureController,
    scroll_offset: usize,
    viewport_rows: usize,
    load_error: Option<String>,
    filter_text: String,
    filter_kind: FilterKind,
    issued: u64,
    applied: u64,
    epoch: u64,
    pending: Option<(u64, Vec<Entry>)>,
    loaded: bool,
    resync: bool,
    focus_target: Option<String>,
}

impl Pane {
    pub fn new(dir: PathBuf, sort_key: SortKey, margin_rows: usize) -> Self {
        Self {
            dir,
            list: FileList::new(sort_key),
            gesture: GestureController::new(margin_rows),
            scroll_offset: 0,
            viewport_rows: 1,
            load_error: None,
            filter_text: String::new(),
            filter_kind: FilterKind::default(),
            issued: 0,
            applied: 0,
            epoch: 1,
            pending: None,
            loaded: false,
            resync: false,
            focus_target: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn list(&self) -> &FileList {
        &self.list
    }

    pub fn gesture(&self) -> &GestureController {
        &self.gesture
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn filter_kind(&self) -> FilterKind {
        self.filter_kind
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.pending.is_some()
    }

    pub fn selected_names(&self) -> Vec<String> {
        self.list.selected_names()
    }

    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
        self.reveal_cursor();
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket {
            generation: self.issued,
            dir: self.dir.clone(),
        }
    }

    /// Requests a read whose result replaces the snapshot without treating
    /// unseen names as new, e.g. after the reader's visibility rules changed.
    pub fn begin_resync(&mut self) -> RefreshTicket {
        self.resync = true;
        self.begin_refresh()
    }

    /// Switches to `dir`, dropping selection, filter, and any in-flight reads.
    /// `focus` names the entry the cursor should land on once loaded.
    pub fn navigate(&mut self, dir: PathBuf, focus: Option<String>) -> RefreshTicket {
        debug!(from = %self.dir.display(), to = %dir.display(), "navigate");
        self.dir = dir;
        self.epoch = self.issued + 1;
        self.pending = None;
        self.loaded = false;
        self.resync = false;
        self.load_error = None;
        self.focus_target = focus;
        self.filter_text.clear();
        self.gesture.cancel();
        self.list.set_filter(None);
        self.list.load(Vec::new(), None);
        self.scroll_offset = 0;
        self.begin_refresh()
    }

    pub fn navigate_parent(&mut self) -> Option<RefreshTicket> {
        let parent = self.dir.parent()?.to_path_buf();
        let focus = self
            .dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        Some(self.navigate(parent, focus))
    }

    /// Feeds the result of a directory read. Results older than anything
    /// already applied, or issued before the last navigation, are dropped.
    pub fn apply_refresh(
        &mut self,
        generation: u64,
        result: Result<Vec<Entry>, String>,
    ) -> RefreshOutcome {
        let superseded_by_pending = self
            .pending
            .as_ref()
            .is_some_and(|(pending, _)| *pending >= generation);
        if generation < self.epoch || generation <= self.applied || superseded_by_pending {
            trace!(generation, applied = self.applied, "stale refresh dropped");
            return RefreshOutcome::Stale;
        }

        match result {
            Err(message) => {
                warn!(dir = %self.dir.display(), error = %message, "directory read failed");
                self.applied = generation;
                self.pending = None;
                self.loaded = false;
                self.resync = false;
                self.load_error = Some(message);
                self.gesture.cancel();
                self.list.load(Vec::new(), None);
                self.scroll_offset = 0;
                RefreshOutcome::Failed
            }
            Ok(entries) if self.loaded && self.gesture.is_dragging() => {
                trace!(generation, "refresh deferred until gesture ends");
                self.pending = Some((generation, entries));
                RefreshOutcome::Deferred
            }
            Ok(entries) => self.apply_entries(generation, entries),
        }
    }

    /// Replaces the snapshot directly, as if a read had just completed.
    pub fn refresh(&mut self, entries: Vec<Entry>) -> RefreshOutcome {
        let ticket = self.begin_refresh();
        self.apply_refresh(ticket.generation, Ok(entries))
    }

    fn apply_entries(&mut self, generation: u64, entries: Vec<Entry>) -> RefreshOutcome {
        self.applied = generation;
        self.load_error = None;
        let outcome = if self.loaded && self.resync {
            self.resync = false;
            self.list.setup_entries(entries, None);
            RefreshOutcome::Resynced
        } else if self.loaded {
            match self.list.update_entries(entries) {
                SnapshotUpdate::Unchanged => RefreshOutcome::Unchanged,
                SnapshotUpdate::Reconciled { added } => RefreshOutcome::Applied { added },
            }
        } else {
            let focus = self.focus_target.take();
            self.list.load(entries, focus.as_deref());
            self.loaded = true;
            self.resync = false;
            RefreshOutcome::Loaded
        };
        if outcome != RefreshOutcome::Unchanged {
            self.reveal_cursor();
        }
        debug!(dir = %self.dir.display(), generation, ?outcome, "refresh applied");
        outcome
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) {
        debug!(?sort_key, "sort key changed");
        self.list.set_sort_key(sort_key);
        self.reveal_cursor();
    }

    pub fn set_filter(&mut self, filter: Option<Arc<dyn Matcher>>) {
        self.list.set_filter(filter);
        self.reveal_cursor();
    }

    /// Rebuilds the filter from raw text; empty text removes it.
    pub fn set_filter_text(&mut self, kind: FilterKind, text: &str) {
        self.filter_kind = kind;
        self.filter_text = text.to_string();
        let filter = build_filter(kind, text).map(|filter| Arc::new(filter) as Arc<dyn Matcher>);
        self.set_filter(filter);
    }

    pub fn activate_cursor_entry(&self) -> Option<Activation> {
        let entry = self.list.cursor_entry()?;
        let path = self.dir.join(&entry.name);
        Some(if entry.is_dir {
            Activation::EnterDirectory(path)
        } else {
            Activation::OpenFile(path)
        })
    }

    /// Row index under a pointer `rows_from_top` rows below the header. Points
    /// past the last row map to `len`.
    pub fn row_at(&self, rows_from_top: usize) -> usize {
        (self.scroll_offset + rows_from_top).min(self.list.len())
    }

    pub fn pointer_down(&mut self, index: usize, shift: bool, ctrl: bool, primary_only: bool) {
        self.gesture
            .pointer_down(&mut self.list, index, shift, ctrl, primary_only);
        self.reveal_cursor();
    }

    pub fn pointer_move(&mut self, index: usize, primary_held: bool) {
        self.gesture
            .pointer_move(&mut self.list, index, primary_held);
        self.reveal_cursor();
    }

    /// Ends the gesture and applies a refresh that arrived during it.
    pub fn pointer_up(&mut self, index: usize) -> Option<RefreshOutcome> {
        self.gesture.pointer_up(&mut self.list, index);
        self.reveal_cursor();
        let (generation, entries) = self.pending.take()?;
        Some(self.apply_entries(generation, entries))
    }

    pub fn cancel_gesture(&mut self) -> Option<RefreshOutcome> {
        self.gesture.cancel();
        let (generation, entries) = self.pending.take()?;
        Some(self.apply_entries(generation, entries))
    }

    pub fn move_cursor(&mut self, motion: CursorMove, extend: bool) -> bool {
        let moved = self.gesture.move_cursor(&mut self.list, motion, extend);
        if moved {
            self.reveal_cursor();
        }
        moved
    }

    pub fn page_rows(&self) -> usize {
        self.viewport_rows.saturating_sub(1).max(1)
    }

    pub fn toggle_current(&mut self) {
        self.gesture.toggle_current(&mut self.list);
    }

    pub fn select_only_current(&mut self) {
        self.gesture.select_only_current(&mut self.list);
    }

    pub fn toggle_all(&mut self) {
        self.gesture.toggle_all(&mut self.list);
    }

    pub fn clear_selection(&mut self) {
        self.gesture.clear(&mut self.list);
    }

    fn reveal_cursor(&mut self) {
        let Some(cursor) = self.list.cursor() else {
            self.scroll_offset = 0;
            return;
        };
        let geometry = ScrollGeometry {
            scroll_offset: self.scroll_offset,
            viewport_height: self.viewport_rows + HEADER_ROWS,
            header_height: HEADER_ROWS,
            row_offset: cursor,
            row_height: 1,
            content_height: self.list.len(),
        };
        self.scroll_offset = scroll_into_view(geometry, self.gesture.margin_rows());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<Entry> {
        names
            .iter()
            .map(|name| Entry::file(name, 1, "2024/01/01 00:00:00"))
            .collect()
    }

    fn loaded_pane(names: &[&str]) -> Pane {
        let mut pane = Pane::new(PathBuf::from("/data"), SortKey::Name, 2);
        let ticket = pane.begin_refresh();
        assert_eq!(
            pane.apply_refresh(ticket.generation, Ok(files(names))),
            RefreshOutcome::Loaded
        );
        pane
    }

    fn selected(pane: &Pane) -> Vec<usize> {
        pane.list().selection().iter().collect()
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut pane = loaded_pane(&["a"]);
        let older = pane.begin_refresh();
        let newer = pane.begin_refresh();

        assert_eq!(
            pane.apply_refresh(newer.generation, Ok(files(&["a", "b"]))),
            RefreshOutcome::Applied { added: 1 }
        );
        assert_eq!(
            pane.apply_refresh(older.generation, Ok(files(&["a"]))),
            RefreshOutcome::Stale
        );
        assert_eq!(pane.list().len(), 2);
    }

    #[test]
    fn reads_from_before_navigation_are_discarded() {
        let mut pane = loaded_pane(&["a"]);
        let before = pane.begin_refresh();
        let after = pane.navigate(PathBuf::from("/other"), None);

        assert_eq!(
            pane.apply_refresh(before.generation, Ok(files(&["x"]))),
            RefreshOutcome::Stale
        );
        assert_eq!(
            pane.apply_refresh(after.generation, Ok(files(&["y"]))),
            RefreshOutcome::Loaded
        );
        assert_eq!(pane.list().cursor_entry().map(|e| e.name.as_str()), Some("y"));
    }

    #[test]
    fn range_selection_round_trip() {
        let mut pane = loaded_pane(&["a", "b", "c", "d", "e"]);
        pane.pointer_down(1, false, false, true);
        pane.pointer_move(3, true);
        assert_eq!(pane.pointer_up(3), None);

        assert_eq!(selected(&pane), vec![1, 2, 3]);
        assert_eq!(pane.list().cursor(), Some(3));
    }

    #[test]
    fn refresh_during_drag_is_deferred_until_pointer_up() {
        let mut pane = loaded_pane(&["a", "b", "c"]);
        pane.pointer_down(0, false, false, true);
        pane.pointer_move(1, true);

        let ticket = pane.begin_refresh();
        assert_eq!(
            pane.apply_refresh(ticket.generation, Ok(files(&["a", "b", "c", "d"]))),
            RefreshOutcome::Deferred
        );
        assert_eq!(pane.list().len(), 3);
        assert_eq!(selected(&pane), vec![0, 1]);
        assert!(pane.has_pending_refresh());

        assert_eq!(
            pane.pointer_up(1),
            Some(RefreshOutcome::Applied { added: 1 })
        );
        assert_eq!(selected(&pane), vec![3]);
        assert!(!pane.has_pending_refresh());
    }

    #[test]
    fn newest_deferred_refresh_wins_at_pointer_up() {
        let mut pane = loaded_pane(&["a", "b", "c"]);
        pane.pointer_down(0, false, false, true);

        let first = pane.begin_refresh();
        let second = pane.begin_refresh();
        assert_eq!(
            pane.apply_refresh(second.generation, Ok(files(&["a", "b", "c", "d"]))),
            RefreshOutcome::Deferred
        );
        assert_eq!(
            pane.apply_refresh(first.generation, Ok(files(&["a"]))),
            RefreshOutcome::Stale
        );

        let third = pane.begin_refresh();
        assert_eq!(
            pane.apply_refresh(third.generation, Ok(files(&["a", "b", "c", "e", "f"]))),
            RefreshOutcome::Deferred
        );

        assert_eq!(
            pane.pointer_up(0),
            Some(RefreshOutcome::Applied { added: 2 })
        );
        let names: Vec<&str> = pane
            .list()
            .rows()
            .iter()
            .map(|row| row.entry.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "e", "f"]);
        assert_eq!(selected(&pane), vec![3, 4]);
        assert_eq!(pane.list().cursor(), Some(3));
    }

    #[test]
    fn resync_requested_before_a_load_does_not_outlive_it() {
        let mut pane = loaded_pane(&["a", "b"]);
        let failing = pane.begin_refresh();
        assert_eq!(
            pane.apply_refresh(failing.generation, Err("gone".to_string())),
            RefreshOutcome::Failed
        );
        let resync = pane.begin_resync();
        assert_eq!(
            pane.apply_refresh(resync.generation, Ok(files(&["a", "b"]))),
            RefreshOutcome::Loaded
        );
        assert_eq!(
            pane.refresh(files(&["a", "b", "c"])),
            RefreshOutcome::Applied { added: 1 }
        );
        assert_eq!(selected(&pane), vec![2]);
        assert_eq!(pane.list().cursor(), Some(2));

        let mut fresh = Pane::new(PathBuf::from("/data"), SortKey::Name, 2);
        let resync = fresh.begin_resync();
        assert_eq!(
            fresh.apply_refresh(resync.generation, Ok(files(&["a"]))),
            RefreshOutcome::Loaded
        );
        assert_eq!(
            fresh.refresh(files(&["a", "b"])),
            RefreshOutcome::Applied { added: 1 }
        );
        assert_eq!(selected(&fresh), vec![1]);
    }

    #[test]
    fn navigation_clears_selection_and_filter_and_focuses_target() {
        let mut pane = loaded_pane(&["a", "b"]);
        pane.set_filter_text(FilterKind::Subsequence, "a");
        pane.toggle_all();

        let ticket = pane.navigate(PathBuf::from("/data/sub"), Some("m".to_string()));
        assert_eq!(ticket.dir, PathBuf::from("/data/sub"));
        assert_eq!(pane.filter_text(), "");
        assert!(!pane.list().has_filter());

        pane.apply_refresh(ticket.generation, Ok(files(&["k", "m", "z"])));
        assert!(pane.list().selection().is_empty());
        assert_eq!(pane.list().cursor(), Some(1));
    }

    #[test]
    fn parent_navigation_targets_directory_just_left() {
        let mut pane = Pane::new(PathBuf::from("/data/sub"), SortKey::Name, 2);
        let ticket = pane.navigate_parent().expect("parent");
        assert_eq!(ticket.dir, PathBuf::from("/data"));

        let entries = vec![
            Entry::dir("alpha", ""),
            Entry::dir("sub", ""),
            Entry::file("zeta", 1, ""),
        ];
        pane.apply_refresh(ticket.generation, Ok(entries));
        assert_eq!(pane.list().cursor(), Some(1));
        assert!(Pane::new(PathBuf::from("/"), SortKey::Name, 2)
            .navigate_parent()
            .is_none());
    }

    #[test]
    fn read_failure_is_visible_and_next_success_loads_fresh() {
        let mut pane = loaded_pane(&["a", "b"]);
        pane.toggle_all();

        let failing = pane.begin_refresh();
        assert_eq!(
            pane.apply_refresh(failing.generation, Err("permission denied".to_string())),
            RefreshOutcome::Failed
        );
        assert_eq!(pane.load_error(), Some("permission denied"));
        assert!(pane.list().is_empty());

        let retry = pane.begin_refresh();
        assert_eq!(
            pane.apply_refresh(retry.generation, Ok(files(&["a", "b"]))),
            RefreshOutcome::Loaded
        );
        assert_eq!(pane.load_error(), None);
        assert!(pane.list().selection().is_empty());
    }

    #[test]
    fn identical_poll_is_unchanged() {
        let mut pane = loaded_pane(&["a", "b"]);
        pane.select_only_current();
        assert_eq!(pane.refresh(files(&["b", "a"])), RefreshOutcome::Unchanged);
        assert_eq!(selected(&pane), vec![0]);
    }

    #[test]
    fn resync_keeps_selection_and_skips_auto_select() {
        let mut pane = loaded_pane(&["b", "c"]);
        pane.move_cursor(CursorMove::Down, false);
        pane.select_only_current();

        let ticket = pane.begin_resync();
        assert_eq!(
            pane.apply_refresh(ticket.generation, Ok(files(&[".a", "b", "c"]))),
            RefreshOutcome::Resynced
        );
        assert_eq!(selected(&pane), vec![2]);
        assert_eq!(pane.list().cursor_entry().map(|e| e.name.as_str()), Some("c"));

        assert_eq!(
            pane.refresh(files(&[".a", "b", "c", "d"])),
            RefreshOutcome::Applied { added: 1 }
        );
    }

    #[test]
    fn activation_distinguishes_directories_and_files() {
        let mut pane = Pane::new(PathBuf::from("/data"), SortKey::Name, 2);
        pane.refresh(vec![Entry::dir("docs", ""), Entry::file("readme.md", 3, "")]);

        assert_eq!(
            pane.activate_cursor_entry(),
            Some(Activation::EnterDirectory(PathBuf::from("/data/docs")))
        );
        pane.move_cursor(CursorMove::Down, false);
        assert_eq!(
            pane.activate_cursor_entry(),
            Some(Activation::OpenFile(PathBuf::from("/data/readme.md")))
        );
        assert_eq!(pane.selected_names(), vec!["readme.md".to_string()]);
    }

    #[test]
    fn keyboard_moves_scroll_cursor_into_view() {
        let names: Vec<String> = (0..50).map(|index| format!("f{index:02}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut pane = loaded_pane(&refs);
        pane.set_viewport_rows(10);

        pane.move_cursor(CursorMove::PageDown(pane.page_rows()), false);
        assert_eq!(pane.list().cursor(), Some(9));
        assert_eq!(pane.scroll_offset(), 2);

        pane.move_cursor(CursorMove::Bottom, false);
        assert_eq!(pane.scroll_offset(), 40);
        assert_eq!(pane.row_at(3), 43);
        assert_eq!(pane.row_at(30), 50);
    }

    #[test]
    fn filter_text_builds_matcher_and_keeps_kind() {
        let mut pane = loaded_pane(&["alpha", "beta", "gamma"]);
        pane.set_filter_text(FilterKind::Regex, "^(beta|gamma)$");
        assert_eq!(pane.list().len(), 2);
        assert_eq!(pane.filter_kind(), FilterKind::Regex);

        pane.set_filter_text(FilterKind::Regex, "");
        assert_eq!(pane.list().len(), 3);
    }
}
