use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::value_objects::{ConceptId, Iri, OntologyId};

/// Ontology concept: a node of the hierarchy independent of its wording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OntologyConcept {
    id: ConceptId,
    ontology: OntologyId,
    iri: Iri,
    parent: Option<Iri>,
    label: Option<String>,
}

impl OntologyConcept {
    /// Creates a root concept owned by the supplied ontology.
    #[must_use]
    pub fn new(id: ConceptId, ontology: OntologyId, iri: Iri) -> Self {
        Self {
            id,
            ontology,
            iri,
            parent: None,
            label: None,
        }
    }

    /// Sets the reference to the parent concept.
    #[must_use]
    pub fn with_parent(mut self, parent: Iri) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets a human friendly label for the concept.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> ConceptId {
        self.id
    }

    #[must_use]
    pub fn ontology(&self) -> OntologyId {
        self.ontology
    }

    #[must_use]
    pub fn iri(&self) -> &Iri {
        &self.iri
    }

    /// Returns the parent reference, absent for roots.
    #[must_use]
    pub fn parent(&self) -> Option<&Iri> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Surface string (label or synonym) naming exactly one concept.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct OntologyTerm {
    concept: ConceptId,
    text: String,
}

impl OntologyTerm {
    #[must_use]
    pub fn new(concept: ConceptId, text: impl Into<String>) -> Self {
        Self {
            concept,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn concept(&self) -> ConceptId {
        self.concept
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Aggregates the concepts and terms of a single controlled vocabulary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ontology {
    id: OntologyId,
    prefix: String,
    label: Option<String>,
    concepts: BTreeMap<ConceptId, OntologyConcept>,
    iris: BTreeSet<Iri>,
    terms: Vec<OntologyTerm>,
}

impl Ontology {
    /// Creates an empty ontology identified by `id` and a short prefix (e.g. `EDAM`).
    #[must_use]
    pub fn new(id: OntologyId, prefix: impl Into<String>) -> Self {
        Self {
            id,
            prefix: prefix.into(),
            label: None,
            concepts: BTreeMap::new(),
            iris: BTreeSet::new(),
            terms: Vec::new(),
        }
    }

    /// Sets a human readable label for the ontology.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Adds a concept, enforcing unique identifiers and IRIs.
    ///
    /// Concepts owned by another ontology are rejected so that the aggregate
    /// stays consistent with its identifier.
    pub fn add_concept(&mut self, concept: OntologyConcept) -> Result<(), OntologyError> {
        if concept.ontology() != self.id {
            return Err(OntologyError::ForeignConcept {
                ontology: self.id,
                concept: concept.id(),
            });
        }
        if self.concepts.contains_key(&concept.id()) {
            return Err(OntologyError::DuplicateConcept(concept.id()));
        }
        if self.iris.contains(concept.iri()) {
            return Err(OntologyError::DuplicateIri(concept.iri().clone()));
        }
        self.iris.insert(concept.iri().clone());
        self.concepts.insert(concept.id(), concept);
        Ok(())
    }

    /// Binds a surface string to a concept of this ontology.
    pub fn add_term(&mut self, term: OntologyTerm) -> Result<(), OntologyError> {
        if !self.concepts.contains_key(&term.concept()) {
            return Err(OntologyError::MissingConcept {
                ontology: self.id,
                concept: term.concept(),
            });
        }
        self.terms.push(term);
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> OntologyId {
        self.id
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Retrieves a concept by identifier.
    #[must_use]
    pub fn concept(&self, id: ConceptId) -> Option<&OntologyConcept> {
        self.concepts.get(&id)
    }

    /// Finds the concept carrying the supplied IRI.
    #[must_use]
    pub fn concept_by_iri(&self, iri: &Iri) -> Option<&OntologyConcept> {
        self.concept_by_reference(iri.as_str())
    }

    /// Finds the concept whose identifier equals `reference` verbatim.
    #[must_use]
    pub fn concept_by_reference(&self, reference: &str) -> Option<&OntologyConcept> {
        if !self.iris.contains(reference) {
            return None;
        }
        self.concepts
            .values()
            .find(|concept| concept.iri().as_str() == reference)
    }

    /// Returns all concepts ordered by identifier.
    #[must_use]
    pub fn concepts(&self) -> &BTreeMap<ConceptId, OntologyConcept> {
        &self.concepts
    }

    /// Returns the terms in insertion order.
    #[must_use]
    pub fn terms(&self) -> &[OntologyTerm] {
        &self.terms
    }
}

/// Errors raised when assembling an ontology aggregate.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OntologyError {
    /// Attempted to add a concept with an existing identifier.
    #[error("concept `{0}` already exists")]
    DuplicateConcept(ConceptId),
    /// Attempted to add a concept with an IRI already in use.
    #[error("concept IRI `{0}` already exists")]
    DuplicateIri(Iri),
    /// The concept declares a different owning ontology.
    #[error("concept `{concept}` does not belong to ontology `{ontology}`")]
    ForeignConcept {
        ontology: OntologyId,
        concept: ConceptId,
    },
    /// A term referenced a concept that is not part of the ontology.
    #[error("concept `{concept}` does not exist in ontology `{ontology}`")]
    MissingConcept {
        ontology: OntologyId,
        concept: ConceptId,
    },
}

#[cfg(test)]
mod tests {
    use super::{Ontology, OntologyConcept, OntologyError, OntologyTerm};
    use crate::ontology::value_objects::{ConceptId, Iri, OntologyId};

    fn iri(text: &str) -> Iri {
        Iri::new(text).expect("valid iri")
    }

    #[test]
    fn concept_parent_is_optional() {
        let root = OntologyConcept::new(ConceptId(1), OntologyId(1), iri("https://example.org/Root"));
        assert!(root.parent().is_none());

        let child = OntologyConcept::new(ConceptId(2), OntologyId(1), iri("https://example.org/Child"))
            .with_parent(iri("https://example.org/Root"))
            .with_label("Child");
        assert_eq!(child.parent(), Some(&iri("https://example.org/Root")));
        assert_eq!(child.label(), Some("Child"));
    }

    #[test]
    fn rejects_duplicate_concepts() {
        let mut ontology = Ontology::new(OntologyId(1), "EX");
        ontology
            .add_concept(OntologyConcept::new(
                ConceptId(1),
                OntologyId(1),
                iri("https://example.org/A"),
            ))
            .expect("concept inserted");

        let err = ontology
            .add_concept(OntologyConcept::new(
                ConceptId(1),
                OntologyId(1),
                iri("https://example.org/B"),
            ))
            .expect_err("duplicate id");
        assert_eq!(err, OntologyError::DuplicateConcept(ConceptId(1)));

        let err = ontology
            .add_concept(OntologyConcept::new(
                ConceptId(2),
                OntologyId(1),
                iri("https://example.org/A"),
            ))
            .expect_err("duplicate iri");
        assert!(matches!(err, OntologyError::DuplicateIri(_)));
    }

    #[test]
    fn rejects_concepts_of_other_ontologies() {
        let mut ontology = Ontology::new(OntologyId(1), "EX");
        let err = ontology
            .add_concept(OntologyConcept::new(
                ConceptId(1),
                OntologyId(2),
                iri("https://example.org/A"),
            ))
            .expect_err("foreign concept");
        assert!(matches!(err, OntologyError::ForeignConcept { .. }));
    }

    #[test]
    fn terms_require_known_concepts() {
        let mut ontology = Ontology::new(OntologyId(1), "EX").with_label("Example");
        let err = ontology
            .add_term(OntologyTerm::new(ConceptId(9), "orphan"))
            .expect_err("missing concept");
        assert!(matches!(err, OntologyError::MissingConcept { .. }));

        ontology
            .add_concept(OntologyConcept::new(
                ConceptId(9),
                OntologyId(1),
                iri("https://example.org/Nine"),
            ))
            .expect("concept inserted");
        ontology
            .add_term(OntologyTerm::new(ConceptId(9), "nine"))
            .expect("term inserted");
        assert_eq!(ontology.terms().len(), 1);
        assert_eq!(
            ontology
                .concept_by_iri(&iri("https://example.org/Nine"))
                .map(OntologyConcept::id),
            Some(ConceptId(9))
        );
    }
}
