//! Ontology domain primitives and the store contract the annotator reads from.
//!
//! Concepts, terms and the aggregate grouping them are pure domain constructs;
//! persistence lives behind [`OntologyStore`].

pub mod entities;
pub mod repositories;
pub mod value_objects;

pub use entities::{Ontology, OntologyConcept, OntologyError, OntologyTerm};
pub use repositories::{OntologyStore, TermRecord};
pub use value_objects::{ConceptId, Iri, IriError, OntologyId};
