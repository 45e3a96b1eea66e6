use std::collections::BTreeSet;

/// Selected rows as indices into the current view. Indices are transient: the
/// owner remaps them by entry name whenever the view changes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Selection {
    indices: BTreeSet<usize>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Inclusive range between two terms, in either order.
    pub fn range(term1: usize, term2: usize) -> Self {
        let (start, end) = ordered(term1, term2);
        Self {
            indices: (start..=end).collect(),
        }
    }

    pub fn only(index: usize) -> Self {
        Self {
            indices: BTreeSet::from([index]),
        }
    }

    pub fn from_indices<I>(indices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        Self {
            indices: indices.into_iter().collect(),
        }
    }

    pub fn add_range(&self, term1: usize, term2: usize) -> Self {
        let (start, end) = ordered(term1, term2);
        let mut indices = self.indices.clone();
        indices.extend(start..=end);
        Self { indices }
    }

    pub fn toggle(&self, index: usize) -> Self {
        let mut indices = self.indices.clone();
        if !indices.remove(&index) {
            indices.insert(index);
        }
        Self { indices }
    }

    /// Clears when every row of a non-empty view is already selected, otherwise
    /// selects all `len` rows.
    pub fn toggle_all(&self, len: usize) -> Self {
        if len == 0 {
            return Self::empty();
        }
        if self.is_all(len) {
            return Self::empty();
        }
        Self::range(0, len - 1)
    }

    /// Drops every member outside `0..valid_len`.
    pub fn purge(&self, valid_len: usize) -> Self {
        Self {
            indices: self.indices.range(..valid_len).copied().collect(),
        }
    }

    pub fn is_all(&self, len: usize) -> bool {
        len > 0 && (0..len).all(|index| self.indices.contains(&index))
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

fn ordered(term1: usize, term2: usize) -> (usize, usize) {
    (term1.min(term2), term1.max(term2))
}
