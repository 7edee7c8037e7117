use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use super::StoreError;
use crate::{
    ontology::{ConceptId, Iri, Ontology, OntologyConcept, OntologyId, OntologyTerm},
    workflow::{Tag, Workflow, WorkflowId},
};

/// Fixture describing ontologies and workflows to load into a store.
///
/// ```yaml
/// ontologies:
///   - id: 1
///     prefix: EDAM
///     concepts:
///       - id: 10
///         iri: http://edamontology.org/topic_3170
///         parent: http://edamontology.org/topic_3168
///         terms: [RNA sequencing, RNA-Seq]
/// workflows:
///   - id: 1
///     title: RNA sequencing pipeline
///     tags:
///       - { id: 4, name: transcriptomics }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub ontologies: Vec<OntologySeed>,
    #[serde(default)]
    pub workflows: Vec<WorkflowSeed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OntologySeed {
    pub id: OntologyId,
    pub prefix: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub concepts: Vec<ConceptSeed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConceptSeed {
    pub id: ConceptId,
    pub iri: Iri,
    #[serde(default)]
    pub parent: Option<Iri>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowSeed {
    pub id: WorkflowId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Seed {
    /// Reads a fixture, parsed as JSON for `.json` files and YAML otherwise.
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::SeedIo {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|err| err.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|err| err.to_string())
        };
        parsed.map_err(|message| StoreError::SeedFormat {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parses a YAML fixture held in memory.
    pub fn from_yaml(content: &str) -> Result<Self, StoreError> {
        serde_yaml::from_str(content).map_err(|err| StoreError::SeedFormat {
            path: PathBuf::from("<inline>"),
            message: err.to_string(),
        })
    }

    /// Builds validated ontology aggregates.
    pub fn ontologies(&self) -> Result<Vec<Ontology>, StoreError> {
        self.ontologies
            .iter()
            .map(|seed| {
                let mut ontology = Ontology::new(seed.id, seed.prefix.clone());
                if let Some(label) = &seed.label {
                    ontology = ontology.with_label(label.clone());
                }
                for concept_seed in &seed.concepts {
                    let mut concept =
                        OntologyConcept::new(concept_seed.id, seed.id, concept_seed.iri.clone());
                    if let Some(parent) = &concept_seed.parent {
                        concept = concept.with_parent(parent.clone());
                    }
                    if let Some(label) = &concept_seed.label {
                        concept = concept.with_label(label.clone());
                    }
                    ontology.add_concept(concept)?;
                    for term in &concept_seed.terms {
                        ontology.add_term(OntologyTerm::new(concept_seed.id, term.clone()))?;
                    }
                }
                Ok(ontology)
            })
            .collect()
    }

    /// Returns each workflow with its tags.
    #[must_use]
    pub fn workflows(&self) -> Vec<(Workflow, Vec<Tag>)> {
        self.workflows
            .iter()
            .map(|seed| {
                (
                    Workflow::new(seed.id, seed.title.clone(), seed.description.clone()),
                    seed.tags.clone(),
                )
            })
            .collect()
    }
}
