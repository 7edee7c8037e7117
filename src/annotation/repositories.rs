use async_trait::async_trait;

use super::model::{AnnotationKey, MetadataType, SemanticAnnotation};
use crate::workflow::{TagId, WorkflowId};

/// Existing annotation joined with the parent reference of its concept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParentLink {
    /// Parent reference of the annotated concept as stored, absent for roots.
    pub parent: Option<String>,
    pub workflow: WorkflowId,
    pub metadata_item: Option<TagId>,
    pub metadata_type: MetadataType,
}

/// Contract describing persistence of semantic annotations.
#[async_trait]
pub trait AnnotationRepository {
    /// Associated error type allowing infrastructure specific failures.
    type Error;

    /// Appends the supplied records.
    ///
    /// Implementors must accept an empty slice. A single record and a batch
    /// are semantically equivalent; adapters may pick the cheapest statement.
    async fn insert_annotations(&self, records: &[SemanticAnnotation]) -> Result<(), Self::Error>;

    /// Lists every stored annotation together with its concept's parent
    /// reference. Annotations pointing at unknown concepts are left out.
    async fn list_with_concept_parent(&self) -> Result<Vec<ParentLink>, Self::Error>;

    /// Lists the natural keys of every stored annotation.
    async fn list_keys(&self) -> Result<Vec<AnnotationKey>, Self::Error>;
}
