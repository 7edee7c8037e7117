use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;

use super::{seed::Seed, StoreError};
use crate::{
    annotation::{AnnotationKey, AnnotationRepository, ParentLink, SemanticAnnotation},
    ontology::{
        ConceptId, Ontology, OntologyConcept, OntologyError, OntologyId, OntologyStore, TermRecord,
    },
    workflow::{Tag, TagId, Workflow, WorkflowId, WorkflowRepository},
};

#[derive(Default)]
struct State {
    ontologies: BTreeMap<OntologyId, Ontology>,
    workflows: BTreeMap<WorkflowId, Workflow>,
    workflow_tags: BTreeMap<WorkflowId, BTreeMap<TagId, Tag>>,
    annotations: Vec<SemanticAnnotation>,
    insert_calls: usize,
}

impl State {
    fn concepts(&self) -> HashMap<ConceptId, &OntologyConcept> {
        self.ontologies
            .values()
            .flat_map(|ontology| ontology.concepts().iter())
            .map(|(id, concept)| (*id, concept))
            .collect()
    }
}

/// Process local store backing every port, used by tests and fixture runs.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with the content of a seed fixture.
    pub fn from_seed(seed: &Seed) -> Result<Self, StoreError> {
        let store = Self::new();
        for ontology in seed.ontologies()? {
            store.insert_ontology(ontology)?;
        }
        for (workflow, tags) in seed.workflows() {
            store.insert_workflow(workflow, tags);
        }
        Ok(store)
    }

    fn guard(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("in-memory store poisoned")
    }

    /// Adds an ontology. Concept identifiers must be unique across ontologies.
    pub fn insert_ontology(&self, ontology: Ontology) -> Result<(), StoreError> {
        let mut guard = self.guard();
        if guard.ontologies.contains_key(&ontology.id()) {
            return Err(StoreError::DuplicateOntology(ontology.id()));
        }
        let clash = {
            let known = guard.concepts();
            ontology
                .concepts()
                .keys()
                .find(|id| known.contains_key(*id))
                .copied()
        };
        if let Some(id) = clash {
            return Err(OntologyError::DuplicateConcept(id).into());
        }
        guard.ontologies.insert(ontology.id(), ontology);
        Ok(())
    }

    /// Adds or replaces a workflow and its tags.
    pub fn insert_workflow(&self, workflow: Workflow, tags: Vec<Tag>) {
        let mut guard = self.guard();
        let tags = tags.into_iter().map(|tag| (tag.id, tag)).collect();
        guard.workflow_tags.insert(workflow.id, tags);
        guard.workflows.insert(workflow.id, workflow);
    }

    /// Snapshot of the stored annotations in insertion order.
    #[must_use]
    pub fn annotations(&self) -> Vec<SemanticAnnotation> {
        self.guard().annotations.clone()
    }

    /// Number of non-empty insert calls received.
    #[must_use]
    pub fn insert_calls(&self) -> usize {
        self.guard().insert_calls
    }
}

#[async_trait]
impl OntologyStore for InMemoryStore {
    type Error = StoreError;

    async fn list_terms(&self) -> Result<Vec<TermRecord>, Self::Error> {
        let guard = self.guard();
        Ok(guard
            .ontologies
            .values()
            .flat_map(Ontology::terms)
            .filter(|term| !term.text().is_empty())
            .map(|term| TermRecord::new(term.concept(), term.text()))
            .collect())
    }

    async fn resolve_parent_reference(
        &self,
        reference: &str,
    ) -> Result<Option<ConceptId>, Self::Error> {
        let guard = self.guard();
        Ok(guard
            .ontologies
            .values()
            .find_map(|ontology| ontology.concept_by_reference(reference))
            .map(OntologyConcept::id))
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryStore {
    type Error = StoreError;

    async fn list_workflows(&self) -> Result<Vec<Workflow>, Self::Error> {
        Ok(self.guard().workflows.values().cloned().collect())
    }

    async fn list_tags(&self, workflow: WorkflowId) -> Result<Vec<Tag>, Self::Error> {
        let guard = self.guard();
        Ok(guard
            .workflow_tags
            .get(&workflow)
            .map(|tags| tags.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl AnnotationRepository for InMemoryStore {
    type Error = StoreError;

    async fn insert_annotations(&self, records: &[SemanticAnnotation]) -> Result<(), Self::Error> {
        if records.is_empty() {
            return Ok(());
        }
        let mut guard = self.guard();
        guard.insert_calls += 1;
        guard.annotations.extend_from_slice(records);
        Ok(())
    }

    async fn list_with_concept_parent(&self) -> Result<Vec<ParentLink>, Self::Error> {
        let guard = self.guard();
        let concepts = guard.concepts();
        Ok(guard
            .annotations
            .iter()
            .filter_map(|annotation| {
                let concept = concepts.get(&annotation.concept)?;
                Some(ParentLink {
                    parent: concept.parent().map(|parent| parent.as_str().to_owned()),
                    workflow: annotation.workflow,
                    metadata_item: annotation.metadata_item,
                    metadata_type: annotation.metadata_type,
                })
            })
            .collect())
    }

    async fn list_keys(&self) -> Result<Vec<AnnotationKey>, Self::Error> {
        Ok(self
            .guard()
            .annotations
            .iter()
            .map(SemanticAnnotation::key)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        annotation::MetadataType,
        ontology::{Iri, OntologyTerm},
    };

    fn iri(text: &str) -> Iri {
        Iri::new(text).expect("valid iri")
    }

    fn ontology(id: i64, concepts: &[(i64, &str, Option<&str>, &str)]) -> Ontology {
        let mut ontology = Ontology::new(OntologyId(id), format!("O{id}"));
        for (concept, concept_iri, parent, term) in concepts {
            let mut entry = OntologyConcept::new(ConceptId(*concept), OntologyId(id), iri(concept_iri));
            if let Some(parent) = parent {
                entry = entry.with_parent(iri(parent));
            }
            ontology.add_concept(entry).expect("concept");
            ontology
                .add_term(OntologyTerm::new(ConceptId(*concept), *term))
                .expect("term");
        }
        ontology
    }

    #[tokio::test]
    async fn lists_non_empty_terms_only() {
        let store = InMemoryStore::new();
        store
            .insert_ontology(ontology(
                1,
                &[
                    (1, "https://example.org/a", None, "alpha"),
                    (2, "https://example.org/b", None, ""),
                ],
            ))
            .expect("ontology");

        let terms = store.list_terms().await.expect("terms");
        assert_eq!(terms, vec![TermRecord::new(ConceptId(1), "alpha")]);
    }

    #[tokio::test]
    async fn resolves_parents_across_ontologies() {
        let store = InMemoryStore::new();
        store
            .insert_ontology(ontology(1, &[(1, "https://example.org/root", None, "root")]))
            .expect("first");
        store
            .insert_ontology(ontology(
                2,
                &[(2, "https://other.org/child", Some("https://example.org/root"), "child")],
            ))
            .expect("second");

        let resolved = store
            .resolve_parent_reference("https://example.org/root")
            .await
            .expect("lookup");
        assert_eq!(resolved, Some(ConceptId(1)));
        let missing = store
            .resolve_parent_reference("https://example.org/none")
            .await
            .expect("lookup");
        assert_eq!(missing, None);
    }

    #[test]
    fn rejects_concept_ids_used_by_another_ontology() {
        let store = InMemoryStore::new();
        store
            .insert_ontology(ontology(1, &[(1, "https://example.org/a", None, "a")]))
            .expect("first");
        let err = store
            .insert_ontology(ontology(2, &[(1, "https://example.org/b", None, "b")]))
            .expect_err("duplicate concept id");
        assert!(matches!(err, StoreError::Domain(OntologyError::DuplicateConcept(_))));

        let err = store
            .insert_ontology(Ontology::new(OntologyId(1), "again"))
            .expect_err("duplicate ontology");
        assert!(matches!(err, StoreError::DuplicateOntology(OntologyId(1))));
    }

    #[tokio::test]
    async fn tags_are_listed_once_by_identifier() {
        let store = InMemoryStore::new();
        store.insert_workflow(
            Workflow::new(WorkflowId(1), "t", "d"),
            vec![
                Tag::new(TagId(9), "zeta"),
                Tag::new(TagId(2), "beta"),
                Tag::new(TagId(9), "zeta"),
            ],
        );
        let tags = store.list_tags(WorkflowId(1)).await.expect("tags");
        assert_eq!(tags, vec![Tag::new(TagId(2), "beta"), Tag::new(TagId(9), "zeta")]);
        assert!(store.list_tags(WorkflowId(2)).await.expect("tags").is_empty());
    }

    #[tokio::test]
    async fn parent_links_skip_unknown_concepts() {
        let store = InMemoryStore::new();
        store
            .insert_ontology(ontology(
                1,
                &[
                    (1, "https://example.org/root", None, "root"),
                    (2, "https://example.org/leaf", Some("https://example.org/root"), "leaf"),
                ],
            ))
            .expect("ontology");
        let now = Utc::now();
        store
            .insert_annotations(&[
                SemanticAnnotation::direct(WorkflowId(1), ConceptId(2), MetadataType::Title, None, now),
                SemanticAnnotation::direct(WorkflowId(1), ConceptId(1), MetadataType::Title, None, now),
                SemanticAnnotation::direct(WorkflowId(1), ConceptId(99), MetadataType::Title, None, now),
            ])
            .await
            .expect("insert");
        store.insert_annotations(&[]).await.expect("empty insert");

        let links = store.list_with_concept_parent().await.expect("links");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].parent.as_deref(), Some("https://example.org/root"));
        assert_eq!(links[1].parent, None);
        assert_eq!(store.insert_calls(), 1);
        assert_eq!(store.list_keys().await.expect("keys").len(), 3);
    }
}
