use async_trait::async_trait;

use super::value_objects::ConceptId;

/// Row returned by [`OntologyStore::list_terms`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermRecord {
    /// Concept the term names.
    pub concept: ConceptId,
    /// Raw surface string as stored.
    pub text: String,
}

impl TermRecord {
    #[must_use]
    pub fn new(concept: ConceptId, text: impl Into<String>) -> Self {
        Self {
            concept,
            text: text.into(),
        }
    }
}

/// Read-only contract over the ontology concepts and their terms.
#[async_trait]
pub trait OntologyStore {
    /// Associated error type allowing infrastructure specific failures.
    type Error;

    /// Lists every term of every ontology.
    ///
    /// Implementors must leave out terms whose text is empty.
    async fn list_terms(&self) -> Result<Vec<TermRecord>, Self::Error>;

    /// Resolves a parent reference to the concept whose identifier equals it.
    ///
    /// References are compared verbatim and need not be well-formed IRIs.
    /// The lookup spans every ontology in the store. Implementors must return
    /// `Ok(None)` when no concept owns the reference.
    async fn resolve_parent_reference(
        &self,
        reference: &str,
    ) -> Result<Option<ConceptId>, Self::Error>;
}
