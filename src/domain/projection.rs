use super::{Entry, Matcher, SortKey};
use std::cmp::Ordering;

/// A row of the rendered view: an entry plus the name positions the active
/// filter matched (empty when there is no filter).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ViewRow {
    pub entry: Entry,
    pub matched: Vec<usize>,
}

/// `sort(filter(entries))`. Sorting is stable, so ties keep snapshot order.
pub fn project(entries: &[Entry], sort_key: SortKey, filter: Option<&dyn Matcher>) -> Vec<ViewRow> {
    let sorted = sort_entries(entries, sort_key);
    filter_rows(&sorted, filter)
}

pub fn sort_entries(entries: &[Entry], sort_key: SortKey) -> Vec<Entry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|left, right| compare_entries(left, right, sort_key));
    sorted
}

/// Keeps only the entries passing `filter`, without reordering.
pub fn filter_rows(ordered: &[Entry], filter: Option<&dyn Matcher>) -> Vec<ViewRow> {
    ordered
        .iter()
        .filter_map(|entry| match filter {
            None => Some(ViewRow {
                entry: entry.clone(),
                matched: Vec::new(),
            }),
            Some(filter) => filter.matched_positions(&entry.name).map(|matched| ViewRow {
                entry: entry.clone(),
                matched,
            }),
        })
        .collect()
}

pub fn compare_entries(left: &Entry, right: &Entry, sort_key: SortKey) -> Ordering {
    match sort_key {
        SortKey::Name => compare_case_insensitive(&left.name, &right.name),
        SortKey::Type => compare_case_insensitive(left.type_label(), right.type_label()),
        SortKey::Size => left.size.cmp(&right.size),
        SortKey::Date => left.modified.cmp(&right.modified),
    }
}

fn compare_case_insensitive(left: &str, right: &str) -> Ordering {
    left.chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase))
}
