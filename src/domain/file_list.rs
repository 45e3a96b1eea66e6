use super::{Entry, Matcher, Selection, SortKey, ViewRow, filter_rows, sort_entries};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SnapshotUpdate {
    Unchanged,
    Reconciled { added: usize },
}

/// View state of one file list: the canonical snapshot, its full display order,
/// the filtered rows actually rendered, and the selection/cursor over those rows.
///
/// Selection and cursor are indices into `rows`. Every operation that rebuilds
/// `rows` remaps them by entry name before returning, so both always satisfy
/// `index < rows.len()` (the cursor is `0` when there are no rows).
#[derive(Clone, Debug, Default)]
pub struct FileList {
    snapshot: Vec<Entry>,
    ordered: Vec<Entry>,
    rows: Vec<ViewRow>,
    sort_key: SortKey,
    filter: Option<Arc<dyn Matcher>>,
    selection: Selection,
    cursor: usize,
}

impl FileList {
    pub fn new(sort_key: SortKey) -> Self {
        Self {
            sort_key,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Entries in the canonical snapshot, filtered or not.
    pub fn total_len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn filtered_out(&self) -> usize {
        self.snapshot.len().saturating_sub(self.rows.len())
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.contains(index)
    }

    pub fn cursor(&self) -> Option<usize> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.cursor)
        }
    }

    pub fn cursor_entry(&self) -> Option<&Entry> {
        self.rows.get(self.cursor).map(|row| &row.entry)
    }

    /// Names the user is acting on: the selection, or the cursor entry when
    /// nothing is selected.
    pub fn selected_names(&self) -> Vec<String> {
        if self.selection.is_empty() {
            return self
                .cursor_entry()
                .map(|entry| vec![entry.name.clone()])
                .unwrap_or_default();
        }
        self.selection
            .iter()
            .filter_map(|index| self.rows.get(index))
            .map(|row| row.entry.name.clone())
            .collect()
    }

    /// Replaces everything with a fresh snapshot: no selection survives, and the
    /// cursor lands on `target` when it is present.
    pub fn load(&mut self, snapshot: Vec<Entry>, target: Option<&str>) {
        self.rows.clear();
        self.selection = Selection::empty();
        self.cursor = 0;
        self.setup_entries(snapshot, target);
    }

    /// Rebuilds the view from `snapshot` under the current sort key and filter,
    /// remapping selection by name and resolving the cursor to `target` (or to
    /// the entry that was under the cursor).
    pub fn setup_entries(&mut self, snapshot: Vec<Entry>, target: Option<&str>) {
        let target = target
            .map(str::to_string)
            .or_else(|| self.cursor_entry().map(|entry| entry.name.clone()));
        let previous_cursor = self.cursor;
        let old_rows = std::mem::take(&mut self.rows);

        self.ordered = sort_entries(&snapshot, self.sort_key);
        self.snapshot = snapshot;
        self.rows = filter_rows(&self.ordered, self.filter.as_deref());
        self.selection = remap_selection(&old_rows, &self.selection, &self.rows);
        self.cursor = resolve_cursor(&self.rows, target.as_deref(), previous_cursor);

        debug!(
            rows = self.rows.len(),
            total = self.snapshot.len(),
            sort_key = ?self.sort_key,
            "file list set up"
        );
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) {
        self.sort_key = sort_key;
        let snapshot = std::mem::take(&mut self.snapshot);
        self.setup_entries(snapshot, None);
    }

    /// Reconciles a replacement snapshot. Rows that already existed keep their
    /// relative order; entries never seen before are appended after them, become
    /// the whole selection, and take the cursor.
    pub fn update_entries(&mut self, snapshot: Vec<Entry>) -> SnapshotUpdate {
        if same_content(&self.snapshot, &snapshot) {
            trace!(entries = snapshot.len(), "snapshot unchanged");
            return SnapshotUpdate::Unchanged;
        }

        let candidate = sort_entries(&snapshot, self.sort_key);
        let (ordered, added_names, first_added) = {
            let prior_positions: HashMap<&str, usize> = self
                .ordered
                .iter()
                .enumerate()
                .map(|(index, entry)| (entry.name.as_str(), index))
                .collect();
            let (mut inherited, added): (Vec<Entry>, Vec<Entry>) = candidate
                .into_iter()
                .partition(|entry| prior_positions.contains_key(entry.name.as_str()));
            inherited.sort_by_key(|entry| prior_positions.get(entry.name.as_str()).copied());

            let added_names: HashSet<String> =
                added.iter().map(|entry| entry.name.clone()).collect();
            let first_added = added.first().map(|entry| entry.name.clone());
            inherited.extend(added);
            (inherited, added_names, first_added)
        };

        let previous_cursor = self.cursor;
        let cursor_name = self.cursor_entry().map(|entry| entry.name.clone());
        let old_rows = std::mem::take(&mut self.rows);

        self.snapshot = snapshot;
        self.ordered = ordered;
        self.rows = filter_rows(&self.ordered, self.filter.as_deref());

        match first_added {
            Some(first_added) => {
                self.selection = Selection::from_indices(
                    self.rows
                        .iter()
                        .enumerate()
                        .filter(|(_, row)| added_names.contains(&row.entry.name))
                        .map(|(index, _)| index),
                );
                self.cursor = self.first_visible_from(&first_added);
            }
            None => {
                self.selection = remap_selection(&old_rows, &self.selection, &self.rows);
                self.cursor = resolve_cursor(&self.rows, cursor_name.as_deref(), previous_cursor);
            }
        }

        debug!(
            rows = self.rows.len(),
            added = added_names.len(),
            selected = self.selection.len(),
            "snapshot reconciled"
        );
        SnapshotUpdate::Reconciled {
            added: added_names.len(),
        }
    }

    /// Applies a new filter over the unchanged entries. The cursor stays on its
    /// entry when it still passes, otherwise moves forward to the next passing
    /// entry in display order, otherwise to the last row.
    pub fn set_filter(&mut self, filter: Option<Arc<dyn Matcher>>) {
        let anchor = self.cursor_entry().map(|entry| entry.name.clone());
        let old_rows = std::mem::take(&mut self.rows);

        self.filter = filter;
        self.rows = filter_rows(&self.ordered, self.filter.as_deref());
        self.selection = remap_selection(&old_rows, &self.selection, &self.rows);
        self.cursor = match anchor {
            Some(name) => self.first_visible_from(&name),
            None => self.first_visible_at(0),
        };

        debug!(
            rows = self.rows.len(),
            filtered_out = self.filtered_out(),
            "filter applied"
        );
    }

    /// Moves the cursor; indices outside the view are ignored.
    pub fn set_cursor(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        self.cursor = index;
        true
    }

    pub fn replace_selection(&mut self, term1: usize, term2: usize) {
        let next = match self.visible_range(term1, term2) {
            Some((start, end)) => Selection::range(start, end),
            None => Selection::empty(),
        };
        self.apply_selection(next);
    }

    pub fn add_selection_range(&mut self, term1: usize, term2: usize) {
        let Some((start, end)) = self.visible_range(term1, term2) else {
            return;
        };
        let next = self.selection.add_range(start, end);
        self.apply_selection(next);
    }

    /// The part of an inclusive range that lies inside the view.
    fn visible_range(&self, term1: usize, term2: usize) -> Option<(usize, usize)> {
        let last = self.rows.len().checked_sub(1)?;
        let (start, end) = (term1.min(term2), term1.max(term2));
        (start <= last).then(|| (start, end.min(last)))
    }

    pub fn toggle_selection(&mut self, index: usize) {
        let next = self.selection.toggle(index);
        self.apply_selection(next);
    }

    pub fn select_only(&mut self, index: usize) {
        self.apply_selection(Selection::only(index));
    }

    pub fn toggle_all(&mut self) {
        let next = self.selection.toggle_all(self.rows.len());
        self.apply_selection(next);
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::empty();
    }

    fn apply_selection(&mut self, selection: Selection) {
        self.selection = selection.purge(self.rows.len());
    }

    fn first_visible_from(&self, name: &str) -> usize {
        let start = self
            .ordered
            .iter()
            .position(|entry| entry.name == name)
            .unwrap_or(0);
        self.first_visible_at(start)
    }

    fn first_visible_at(&self, start: usize) -> usize {
        let row_positions: HashMap<&str, usize> = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| (row.entry.name.as_str(), index))
            .collect();
        self.ordered
            .iter()
            .skip(start)
            .find_map(|entry| row_positions.get(entry.name.as_str()).copied())
            .unwrap_or_else(|| self.rows.len().saturating_sub(1))
    }
}

/// Cursor for a rebuilt view: the row named `target` if present, else the
/// previous index if still in range, else the last row.
pub fn resolve_cursor(rows: &[ViewRow], target: Option<&str>, previous: usize) -> usize {
    if let Some(target) = target {
        if let Some(position) = rows.iter().position(|row| row.entry.name == target) {
            return position;
        }
    }
    if previous < rows.len() {
        return previous;
    }
    rows.len().saturating_sub(1)
}

fn remap_selection(old_rows: &[ViewRow], selection: &Selection, new_rows: &[ViewRow]) -> Selection {
    if selection.is_empty() {
        return Selection::empty();
    }
    let new_positions: HashMap<&str, usize> = new_rows
        .iter()
        .enumerate()
        .map(|(index, row)| (row.entry.name.as_str(), index))
        .collect();
    Selection::from_indices(
        selection
            .iter()
            .filter_map(|index| old_rows.get(index))
            .filter_map(|row| new_positions.get(row.entry.name.as_str()).copied()),
    )
}

fn same_content(left: &[Entry], right: &[Entry]) -> bool {
    left.len() == right.len() && normalized(left) == normalized(right)
}

fn normalized(entries: &[Entry]) -> Vec<&Entry> {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by(|left, right| left.name.cmp(&right.name));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilterKind, NameFilter, build_filter};

    fn files(names: &[&str]) -> Vec<Entry> {
        names
            .iter()
            .map(|name| Entry::file(name, 0, "2024/01/01 00:00:00"))
            .collect()
    }

    fn loaded(names: &[&str]) -> FileList {
        let mut list = FileList::new(SortKey::Name);
        list.load(files(names), None);
        list
    }

    fn row_names(list: &FileList) -> Vec<&str> {
        list.rows()
            .iter()
            .map(|row| row.entry.name.as_str())
            .collect()
    }

    fn selected(list: &FileList) -> Vec<&str> {
        let mut names: Vec<&str> = list
            .selection()
            .iter()
            .map(|index| list.rows()[index].entry.name.as_str())
            .collect();
        names.sort();
        names
    }

    fn cursor_name(list: &FileList) -> Option<&str> {
        list.cursor_entry().map(|entry| entry.name.as_str())
    }

    fn only_names(names: &[&str]) -> Arc<dyn Matcher> {
        let pattern = format!("^({})$", names.join("|"));
        let filter: NameFilter = build_filter(FilterKind::Regex, &pattern).expect("filter");
        Arc::new(filter)
    }

    fn assert_invariants(list: &FileList) {
        for index in list.selection().iter() {
            assert!(index < list.len(), "selection {index} outside {}", list.len());
        }
        match list.cursor() {
            Some(cursor) => assert!(cursor < list.len()),
            None => assert!(list.is_empty()),
        }
    }

    #[test]
    fn load_places_cursor_on_target() {
        let mut list = FileList::new(SortKey::Name);
        list.load(files(&["a", "b", "c"]), Some("b"));
        assert_eq!(cursor_name(&list), Some("b"));
        assert!(list.selection().is_empty());
    }

    #[test]
    fn identical_snapshot_is_a_no_op() {
        let mut list = loaded(&["a", "b", "c"]);
        list.select_only(1);
        list.set_cursor(2);

        let update = list.update_entries(files(&["c", "a", "b"]));
        assert_eq!(update, SnapshotUpdate::Unchanged);
        assert_eq!(row_names(&list), vec!["a", "b", "c"]);
        assert_eq!(selected(&list), vec!["b"]);
        assert_eq!(list.cursor(), Some(2));
    }

    #[test]
    fn new_entries_are_auto_selected_and_take_the_cursor() {
        let mut list = loaded(&["a", "b"]);
        list.select_only(0);

        let update = list.update_entries(files(&["a", "b", "c", "d"]));
        assert_eq!(update, SnapshotUpdate::Reconciled { added: 2 });
        assert_eq!(selected(&list), vec!["c", "d"]);
        assert_eq!(cursor_name(&list), Some("c"));
        assert_invariants(&list);
    }

    #[test]
    fn new_entries_are_appended_after_existing_rows() {
        let mut list = loaded(&["b", "d"]);
        list.update_entries(files(&["a", "b", "c", "d"]));
        assert_eq!(row_names(&list), vec!["b", "d", "a", "c"]);
        assert_eq!(selected(&list), vec!["a", "c"]);
        assert_eq!(cursor_name(&list), Some("a"));
    }

    #[test]
    fn modified_entries_do_not_count_as_new() {
        let mut list = loaded(&["a", "b"]);
        list.select_only(1);
        let mut next = files(&["a", "b"]);
        next[0].size = 42;

        let update = list.update_entries(next);
        assert_eq!(update, SnapshotUpdate::Reconciled { added: 0 });
        assert_eq!(selected(&list), vec!["b"]);
        assert_eq!(list.rows()[0].entry.size, 42);
    }

    #[test]
    fn sort_change_remaps_selection_by_name() {
        let mut list = FileList::new(SortKey::Name);
        list.load(
            vec![
                Entry::file("a", 20, "2024/01/02 00:00:00"),
                Entry::file("b", 30, "2024/01/03 00:00:00"),
                Entry::file("c", 10, "2024/01/01 00:00:00"),
            ],
            None,
        );
        list.replace_selection(0, 0);
        list.add_selection_range(2, 2);
        list.set_cursor(1);

        list.set_sort_key(SortKey::Size);
        assert_eq!(row_names(&list), vec!["c", "a", "b"]);
        assert_eq!(list.selection().iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(selected(&list), vec!["a", "c"]);
        assert_eq!(cursor_name(&list), Some("b"));
    }

    #[test]
    fn reordering_keeps_selection_by_name() {
        let mut list = FileList::new(SortKey::Name);
        list.load(
            vec![
                Entry::file("a", 1, "2024/01/02 00:00:00"),
                Entry::file("b", 1, "2024/01/03 00:00:00"),
                Entry::file("c", 1, "2024/01/01 00:00:00"),
            ],
            None,
        );
        list.select_only(0);
        list.toggle_selection(2);

        list.set_sort_key(SortKey::Date);
        assert_eq!(row_names(&list), vec!["c", "a", "b"]);
        assert_eq!(list.selection().iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(selected(&list), vec!["a", "c"]);
    }

    #[test]
    fn filter_moves_cursor_forward_to_next_match() {
        let mut list = loaded(&["a", "b", "c", "d"]);
        list.set_cursor(2);

        list.set_filter(Some(only_names(&["a", "d"])));
        assert_eq!(row_names(&list), vec!["a", "d"]);
        assert_eq!(cursor_name(&list), Some("d"));
    }

    #[test]
    fn filter_keeps_cursor_on_matching_entry() {
        let mut list = loaded(&["a", "b", "c", "d"]);
        list.set_cursor(2);
        list.set_filter(Some(only_names(&["b", "c"])));
        assert_eq!(cursor_name(&list), Some("c"));
    }

    #[test]
    fn filter_past_last_match_clamps_to_last_row() {
        let mut list = loaded(&["a", "b", "c", "d"]);
        list.set_cursor(3);
        list.set_filter(Some(only_names(&["a", "b"])));
        assert_eq!(cursor_name(&list), Some("b"));
    }

    #[test]
    fn filter_matching_nothing_leaves_no_cursor() {
        let mut list = loaded(&["a", "b"]);
        list.toggle_all();
        list.set_filter(Some(only_names(&["zzz"])));
        assert!(list.is_empty());
        assert_eq!(list.cursor(), None);
        assert!(list.selection().is_empty());
        assert_eq!(list.filtered_out(), 2);
        assert!(list.selected_names().is_empty());
    }

    #[test]
    fn filter_change_never_auto_selects() {
        let mut list = loaded(&["a", "b", "c"]);
        list.set_filter(Some(only_names(&["a"])));
        list.set_filter(None);
        assert!(list.selection().is_empty());
        assert_eq!(row_names(&list), vec!["a", "b", "c"]);
    }

    #[test]
    fn selection_survives_filter_by_name() {
        let mut list = loaded(&["a", "b", "c", "d"]);
        list.replace_selection(1, 3);
        list.set_filter(Some(only_names(&["b", "d"])));
        assert_eq!(selected(&list), vec!["b", "d"]);
        assert_invariants(&list);
    }

    #[test]
    fn disappearing_entries_leave_the_selection() {
        let mut list = loaded(&["a", "b", "c"]);
        list.replace_selection(0, 1);
        list.set_cursor(2);

        list.update_entries(files(&["a", "c"]));
        assert_eq!(selected(&list), vec!["a"]);
        assert_eq!(cursor_name(&list), Some("c"));

        list.update_entries(files(&["c"]));
        assert!(list.selection().is_empty());
        assert_eq!(list.cursor(), Some(0));
    }

    #[test]
    fn vanished_cursor_keeps_numeric_position_or_clamps() {
        let mut list = loaded(&["a", "b", "c"]);
        list.set_cursor(1);
        list.update_entries(files(&["a", "c"]));
        assert_eq!(cursor_name(&list), Some("c"));

        list.update_entries(files(&["a"]));
        assert_eq!(list.cursor(), Some(0));

        list.update_entries(Vec::new());
        assert_eq!(list.cursor(), None);
        assert_invariants(&list);
    }

    #[test]
    fn hidden_new_entry_is_not_selected() {
        let mut list = loaded(&["a", "b"]);
        list.set_filter(Some(only_names(&["a", "b"])));
        list.set_cursor(0);

        list.update_entries(files(&["a", "b", "c"]));
        assert!(list.selection().is_empty());
        assert_eq!(cursor_name(&list), Some("b"));
        assert_eq!(list.total_len(), 3);
    }

    #[test]
    fn selected_names_falls_back_to_cursor() {
        let mut list = loaded(&["a", "b", "c"]);
        list.set_cursor(1);
        assert_eq!(list.selected_names(), vec!["b".to_string()]);

        list.replace_selection(2, 0);
        assert_eq!(list.selected_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn selection_operations_purge_out_of_range_indices() {
        let mut list = loaded(&["a", "b"]);
        list.replace_selection(1, 5);
        assert_eq!(list.selection().iter().collect::<Vec<_>>(), vec![1]);
        list.toggle_selection(7);
        assert_eq!(list.selection().len(), 1);
        list.select_only(2);
        assert!(list.selection().is_empty());
        assert!(!list.set_cursor(2));
    }

    #[test]
    fn huge_range_terms_are_clamped_to_the_view() {
        let mut list = FileList::new(SortKey::Name);
        list.load(files(&["a", "b"]), None);

        list.replace_selection(0, usize::MAX);
        assert_eq!(list.selection().iter().collect::<Vec<_>>(), vec![0, 1]);

        list.replace_selection(usize::MAX - 1, usize::MAX);
        assert!(list.selection().is_empty());

        list.select_only(0);
        list.add_selection_range(usize::MAX, 1);
        assert_eq!(list.selection().iter().collect::<Vec<_>>(), vec![0, 1]);

        let mut empty = FileList::new(SortKey::Name);
        empty.replace_selection(0, usize::MAX);
        empty.add_selection_range(0, usize::MAX);
        assert!(empty.selection().is_empty());
    }

    #[test]
    fn invariants_hold_across_mixed_updates() {
        let universe = ["a", "b", "c", "d", "e", "f", "g"];
        let mut list = loaded(&universe[..3]);
        let mut seed = 7u32;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (seed >> 16) as usize
        };

        for step in 0..200 {
            match next() % 6 {
                0 => {
                    let names: Vec<&str> = universe
                        .iter()
                        .copied()
                        .filter(|_| next() % 2 == 0)
                        .collect();
                    list.update_entries(files(&names));
                }
                1 => list.replace_selection(next() % 9, next() % 9),
                2 => list.toggle_selection(next() % 9),
                3 => {
                    list.set_cursor(next() % 9);
                }
                4 => {
                    let picks: Vec<&str> = universe
                        .iter()
                        .copied()
                        .filter(|_| next() % 3 != 0)
                        .collect();
                    let filter = (step % 4 != 0).then(|| only_names(&picks));
                    list.set_filter(filter);
                }
                _ => list.set_sort_key(if step % 2 == 0 {
                    SortKey::Name
                } else {
                    SortKey::Size
                }),
            }
            assert_invariants(&list);
        }
    }
}
