//! Semantic annotation of workflow metadata.
//!
//! Ontology terms are compiled into a [`Dictionary`], matched as whole words
//! against workflow titles, descriptions and tags, and persisted through the
//! [`AnnotationRepository`] port. The [`Expander`] then lifts existing
//! annotations one level up the concept hierarchy. [`SemanticAnnotator`]
//! wires these pieces to concrete adapters.

pub mod dictionary;
pub mod expander;
pub mod matcher;
pub mod model;
pub mod policy;
pub mod report;
pub mod repositories;
pub mod service;

pub use dictionary::{normalize_term, Dictionary, DictionaryEntry};
pub use expander::{Expander, Expansion};
pub use matcher::{match_text, BoundaryMode, Matcher};
pub use model::{
    metadata_fields, AnnotationKey, AnnotationType, MetadataField, MetadataType,
    SemanticAnnotation, UnknownVariant,
};
pub use policy::{DuplicateGuard, DuplicatePolicy};
pub use report::{AnnotationReport, ExpansionReport, PipelineReport, RunStatus};
pub use repositories::{AnnotationRepository, ParentLink};
pub use service::{
    AnnotationRepositoryHandle, OntologyStoreHandle, SemanticAnnotator, WorkflowRepositoryHandle,
};
