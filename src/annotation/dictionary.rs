use std::collections::{BTreeMap, BTreeSet};

use crate::ontology::{ConceptId, TermRecord};

/// Normalized term text and every concept it names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub term: String,
    pub concepts: BTreeSet<ConceptId>,
}

/// Term-to-concept lookup table built once per annotation run.
///
/// Keys are lower-cased and never empty. Entries are kept longest-first,
/// ties broken alphabetically, so the build is independent of input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dictionary {
    entries: Vec<DictionaryEntry>,
    /// Position of each key in `entries`.
    index: BTreeMap<String, usize>,
}

impl Dictionary {
    /// Groups the concept identifiers of every term under its normalized text.
    pub fn build(terms: impl IntoIterator<Item = TermRecord>) -> Self {
        let mut grouped: BTreeMap<String, BTreeSet<ConceptId>> = BTreeMap::new();
        for record in terms {
            let key = normalize_term(&record.text);
            if key.is_empty() {
                continue;
            }
            grouped.entry(key).or_default().insert(record.concept);
        }

        let mut entries: Vec<DictionaryEntry> = grouped
            .into_iter()
            .map(|(term, concepts)| DictionaryEntry { term, concepts })
            .collect();
        entries.sort_by(|a, b| {
            b.term
                .chars()
                .count()
                .cmp(&a.term.chars().count())
                .then_with(|| a.term.cmp(&b.term))
        });

        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.term.clone(), position))
            .collect();
        Self { entries, index }
    }

    /// Entries in matching priority order.
    #[must_use]
    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    /// Concepts named by `term`, looked up case-insensitively.
    #[must_use]
    pub fn concepts_for(&self, term: &str) -> Option<&BTreeSet<ConceptId>> {
        let position = *self.index.get(&normalize_term(term))?;
        Some(&self.entries[position].concepts)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lower-cases a term and strips surrounding whitespace.
#[must_use]
pub fn normalize_term(text: &str) -> String {
    text.trim().to_lowercase()
}
