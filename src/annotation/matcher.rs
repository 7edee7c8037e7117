use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::dictionary::{Dictionary, DictionaryEntry};
use crate::ontology::ConceptId;

/// Rule deciding where a term may start and end inside a text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Terms must be delimited by a single space or the ends of the text.
    #[default]
    Space,
    /// Any run of non-alphanumeric characters delimits words, in both the
    /// text and the terms.
    ///
    /// Terms must start and end with an alphanumeric character; others such
    /// as `c++` or `.net` are left out, since stripping their punctuation
    /// would let them match a different word.
    NonAlphanumeric,
}

impl BoundaryMode {
    /// Whether `term` can be matched under this mode.
    #[must_use]
    pub fn accepts(self, term: &str) -> bool {
        match self {
            Self::Space => !term.trim().is_empty(),
            Self::NonAlphanumeric => {
                let mut chars = term.chars();
                chars.next().is_some_and(char::is_alphanumeric)
                    && chars.next_back().map_or(true, char::is_alphanumeric)
            }
        }
    }

    /// Normalizes `text` and wraps it in boundary markers.
    #[must_use]
    pub fn pad(self, text: &str) -> String {
        let lowered = text.to_lowercase();
        match self {
            Self::Space => format!(" {lowered} "),
            Self::NonAlphanumeric => {
                let spaced: String = lowered
                    .chars()
                    .map(|c| if c.is_alphanumeric() { c } else { ' ' })
                    .collect();
                let mut padded = String::with_capacity(spaced.len() + 2);
                padded.push(' ');
                for word in spaced.split_whitespace() {
                    padded.push_str(word);
                    padded.push(' ');
                }
                if padded.len() == 1 {
                    padded.push(' ');
                }
                padded
            }
        }
    }
}

/// Whole-word dictionary matcher.
///
/// Needles are prepared once from the dictionary, longest term first. Matched
/// spans are never consumed, so nested and overlapping terms are all reported.
#[derive(Clone, Debug)]
pub struct Matcher<'a> {
    needles: Vec<(String, &'a DictionaryEntry)>,
    boundary: BoundaryMode,
}

impl<'a> Matcher<'a> {
    #[must_use]
    pub fn new(dictionary: &'a Dictionary, boundary: BoundaryMode) -> Self {
        let needles = dictionary
            .entries()
            .iter()
            .filter(|entry| boundary.accepts(&entry.term))
            .map(|entry| (boundary.pad(&entry.term), entry))
            .collect();
        Self { needles, boundary }
    }

    /// Returns every concept whose term occurs in `text` as a whole word.
    #[must_use]
    pub fn find(&self, text: &str) -> BTreeSet<ConceptId> {
        let mut found = BTreeSet::new();
        if text.trim().is_empty() {
            return found;
        }

        let haystack = self.boundary.pad(text);
        for (needle, entry) in &self.needles {
            if haystack.contains(needle.as_str()) {
                found.extend(entry.concepts.iter().copied());
            }
        }
        found
    }
}

/// Matches `text` against `dictionary` using [`BoundaryMode::Space`].
#[must_use]
pub fn match_text(dictionary: &Dictionary, text: &str) -> BTreeSet<ConceptId> {
    Matcher::new(dictionary, BoundaryMode::Space).find(text)
}
