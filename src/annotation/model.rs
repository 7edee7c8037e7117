use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ontology::ConceptId,
    workflow::{Tag, TagId, Workflow, WorkflowId},
};

/// Workflow field that produced an annotation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataType {
    Title,
    Description,
    Tags,
}

impl MetadataType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Tags => "tags",
        }
    }
}

impl Display for MetadataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetadataType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "description" => Ok(Self::Description),
            "tags" => Ok(Self::Tags),
            other => Err(UnknownVariant::new("metadata type", other)),
        }
    }
}

/// How an annotation was derived.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnnotationType {
    /// One of the concept's terms occurred literally in the workflow text.
    Direct,
    /// The concept is the parent of an already annotated concept.
    Generalization,
}

impl AnnotationType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "Direct",
            Self::Generalization => "Generalization",
        }
    }
}

impl Display for AnnotationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Direct" => Ok(Self::Direct),
            "Generalization" => Ok(Self::Generalization),
            other => Err(UnknownVariant::new("annotation type", other)),
        }
    }
}

/// Raised when a stored enum column holds an unexpected value.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Annotation record attaching an ontology concept to a workflow.
///
/// Records are immutable once written; repeated runs accumulate new rows
/// unless the upsert policy is selected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticAnnotation {
    pub workflow: WorkflowId,
    pub concept: ConceptId,
    pub annotation_type: AnnotationType,
    /// Hierarchy hops from the originally matched concept, `0` for direct matches.
    pub distance: u32,
    /// Tag that produced the match, set only for [`MetadataType::Tags`].
    pub metadata_item: Option<TagId>,
    pub metadata_type: MetadataType,
    pub created_at: DateTime<Utc>,
}

impl SemanticAnnotation {
    /// Builds a direct annotation produced by the text matcher.
    #[must_use]
    pub fn direct(
        workflow: WorkflowId,
        concept: ConceptId,
        metadata_type: MetadataType,
        metadata_item: Option<TagId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            workflow,
            concept,
            annotation_type: AnnotationType::Direct,
            distance: 0,
            metadata_item,
            metadata_type,
            created_at,
        }
    }

    /// Builds a generalization one hierarchy level above the source annotation.
    #[must_use]
    pub fn generalization(
        workflow: WorkflowId,
        concept: ConceptId,
        metadata_type: MetadataType,
        metadata_item: Option<TagId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            workflow,
            concept,
            annotation_type: AnnotationType::Generalization,
            distance: 1,
            metadata_item,
            metadata_type,
            created_at,
        }
    }

    /// Returns the natural key used by the upsert policy.
    #[must_use]
    pub fn key(&self) -> AnnotationKey {
        AnnotationKey {
            workflow: self.workflow,
            concept: self.concept,
            annotation_type: self.annotation_type,
            metadata_type: self.metadata_type,
            metadata_item: self.metadata_item,
        }
    }
}

/// Natural key of a [`SemanticAnnotation`], ignoring its timestamp.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationKey {
    pub workflow: WorkflowId,
    pub concept: ConceptId,
    pub annotation_type: AnnotationType,
    pub metadata_type: MetadataType,
    pub metadata_item: Option<TagId>,
}

/// Single text value of a workflow scanned by the matcher.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MetadataField<'a> {
    pub metadata_type: MetadataType,
    pub item: Option<TagId>,
    pub text: &'a str,
}

/// Lists the scanned fields of a workflow: title, description, then one
/// entry per tag carrying the tag identifier.
#[must_use]
pub fn metadata_fields<'a>(workflow: &'a Workflow, tags: &'a [Tag]) -> Vec<MetadataField<'a>> {
    let mut fields = Vec::with_capacity(2 + tags.len());
    fields.push(MetadataField {
        metadata_type: MetadataType::Title,
        item: None,
        text: &workflow.title,
    });
    fields.push(MetadataField {
        metadata_type: MetadataType::Description,
        item: None,
        text: &workflow.description,
    });
    fields.extend(tags.iter().map(|tag| MetadataField {
        metadata_type: MetadataType::Tags,
        item: Some(tag.id),
        text: &tag.name,
    }));
    fields
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn stored_names_roundtrip_through_from_str() {
        for kind in [MetadataType::Title, MetadataType::Description, MetadataType::Tags] {
            assert_eq!(kind.as_str().parse::<MetadataType>(), Ok(kind));
        }
        assert_eq!("Generalization".parse(), Ok(AnnotationType::Generalization));
        assert!("generalization".parse::<AnnotationType>().is_err());
    }

    #[test]
    fn generalization_is_one_hop() {
        let now = Utc::now();
        let record = SemanticAnnotation::generalization(
            WorkflowId(1),
            ConceptId(5),
            MetadataType::Tags,
            Some(TagId(7)),
            now,
        );
        assert_eq!(record.distance, 1);
        assert_eq!(record.annotation_type, AnnotationType::Generalization);
        assert_eq!(record.key().metadata_item, Some(TagId(7)));
    }

    #[test]
    fn fields_follow_title_description_tags_order() {
        let workflow = Workflow::new(WorkflowId(3), "Title", "Description");
        let tags = vec![Tag::new(TagId(1), "alpha"), Tag::new(TagId(2), "beta")];
        let fields = metadata_fields(&workflow, &tags);

        let kinds: Vec<_> = fields.iter().map(|f| (f.metadata_type, f.item)).collect();
        assert_eq!(
            kinds,
            vec![
                (MetadataType::Title, None),
                (MetadataType::Description, None),
                (MetadataType::Tags, Some(TagId(1))),
                (MetadataType::Tags, Some(TagId(2))),
            ]
        );
        assert_eq!(fields[3].text, "beta");
    }
}
