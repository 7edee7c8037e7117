use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{
    model::{AnnotationKey, SemanticAnnotation},
    repositories::AnnotationRepository,
};

/// What to do with a record whose natural key is already stored.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Always write; repeated runs accumulate rows.
    #[default]
    Append,
    /// Write a record only when no record with the same natural key exists.
    Upsert,
}

/// Filters records according to a [`DuplicatePolicy`] for one batch entry point.
#[derive(Debug, Default)]
pub struct DuplicateGuard {
    seen: Option<HashSet<AnnotationKey>>,
    skipped: usize,
}

impl DuplicateGuard {
    /// Loads the stored keys when the policy needs them.
    pub async fn load<R>(policy: DuplicatePolicy, repository: &R) -> Result<Self, R::Error>
    where
        R: AnnotationRepository + ?Sized,
    {
        let seen = match policy {
            DuplicatePolicy::Append => None,
            DuplicatePolicy::Upsert => Some(repository.list_keys().await?.into_iter().collect()),
        };
        Ok(Self { seen, skipped: 0 })
    }

    /// Drops records whose key is already stored or was retained earlier.
    pub fn retain(&mut self, mut records: Vec<SemanticAnnotation>) -> Vec<SemanticAnnotation> {
        let Some(seen) = self.seen.as_mut() else {
            return records;
        };
        let before = records.len();
        records.retain(|record| seen.insert(record.key()));
        self.skipped += before - records.len();
        records
    }

    /// Number of records dropped so far.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        annotation::model::MetadataType,
        ontology::ConceptId,
        workflow::WorkflowId,
    };

    fn direct(concept: i64) -> SemanticAnnotation {
        SemanticAnnotation::direct(
            WorkflowId(1),
            ConceptId(concept),
            MetadataType::Title,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn append_keeps_everything() {
        let mut guard = DuplicateGuard::default();
        let kept = guard.retain(vec![direct(1), direct(1)]);
        assert_eq!(kept.len(), 2);
        assert_eq!(guard.skipped(), 0);
    }

    #[test]
    fn upsert_drops_known_and_repeated_keys() {
        let mut guard = DuplicateGuard {
            seen: Some(HashSet::from([direct(1).key()])),
            skipped: 0,
        };
        let kept = guard.retain(vec![direct(1), direct(2), direct(2)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].concept, ConceptId(2));
        assert_eq!(guard.skipped(), 2);

        assert!(guard.retain(vec![direct(2)]).is_empty());
        assert_eq!(guard.skipped(), 3);
    }
}
