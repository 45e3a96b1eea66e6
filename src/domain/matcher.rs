use super::Entry;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusion test plus emphasis positions for a filter over entry names.
pub trait Matcher: fmt::Debug + Send + Sync {
    fn matches(&self, entry: &Entry) -> bool {
        self.matched_positions(&entry.name).is_some()
    }

    /// Character indices of `name` that produced the match, or `None` when it
    /// does not match at all.
    fn matched_positions(&self, name: &str) -> Option<Vec<usize>>;
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    Subsequence,
    Regex,
}

impl FilterKind {
    pub fn toggle(self) -> Self {
        match self {
            Self::Subsequence => Self::Regex,
            Self::Regex => Self::Subsequence,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Subsequence => "Match",
            Self::Regex => "Regex",
        }
    }
}

#[derive(Clone, Debug)]
pub enum NameFilter {
    Subsequence {
        needle: Vec<char>,
        case_sensitive: bool,
    },
    Regex {
        regex: Option<Regex>,
    },
}

/// Builds a matcher from raw filter text. Empty text means "no filter".
pub fn build_filter(kind: FilterKind, text: &str) -> Option<NameFilter> {
    if text.is_empty() {
        return None;
    }

    // Smart case: any uppercase character makes the whole filter case-sensitive.
    let case_sensitive = text.chars().any(char::is_uppercase);
    let filter = match kind {
        FilterKind::Subsequence => NameFilter::Subsequence {
            needle: text.chars().collect(),
            case_sensitive,
        },
        FilterKind::Regex => NameFilter::Regex {
            regex: RegexBuilder::new(text)
                .case_insensitive(!case_sensitive)
                .build()
                .ok(),
        },
    };
    Some(filter)
}

impl Matcher for NameFilter {
    fn matched_positions(&self, name: &str) -> Option<Vec<usize>> {
        match self {
            Self::Subsequence {
                needle,
                case_sensitive,
            } => subsequence_positions(needle, name, *case_sensitive),
            Self::Regex { regex } => {
                let regex = regex.as_ref()?;
                let found = regex.find(name)?;
                let start = name[..found.start()].chars().count();
                let len = found.as_str().chars().count();
                Some((start..start + len).collect())
            }
        }
    }
}

fn subsequence_positions(needle: &[char], name: &str, case_sensitive: bool) -> Option<Vec<usize>> {
    let mut positions = Vec::with_capacity(needle.len());
    let mut haystack = name.chars().enumerate();
    for wanted in needle {
        let (index, _) = haystack.find(|(_, ch)| chars_equal(*wanted, *ch, case_sensitive))?;
        positions.push(index);
    }
    Some(positions)
}

fn chars_equal(left: char, right: char, case_sensitive: bool) -> bool {
    if case_sensitive {
        return left == right;
    }
    left == right || left.to_lowercase().eq(right.to_lowercase())
}
