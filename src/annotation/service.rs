use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::{
    dictionary::Dictionary,
    expander::Expander,
    matcher::Matcher,
    model::{metadata_fields, SemanticAnnotation},
    policy::DuplicateGuard,
    report::{AnnotationReport, ExpansionReport, PipelineReport, RunStatus},
    repositories::AnnotationRepository,
};
use crate::{
    config::{AnnotatorSettings, StoreSettings},
    ontology::OntologyStore,
    store::{InMemoryStore, Seed, StoreError},
    workflow::WorkflowRepository,
    Result,
};

/// Type alias simplifying ontology store trait object usage inside the service.
pub type OntologyStoreHandle = dyn OntologyStore<Error = StoreError> + Send + Sync + 'static;
/// Type alias simplifying workflow repository trait object usage inside the service.
pub type WorkflowRepositoryHandle =
    dyn WorkflowRepository<Error = StoreError> + Send + Sync + 'static;
/// Type alias simplifying annotation repository trait object usage inside the service.
pub type AnnotationRepositoryHandle =
    dyn AnnotationRepository<Error = StoreError> + Send + Sync + 'static;

/// Batch entry points annotating every workflow and generalizing the results.
#[derive(Clone)]
pub struct SemanticAnnotator {
    ontology: Arc<OntologyStoreHandle>,
    workflows: Arc<WorkflowRepositoryHandle>,
    annotations: Arc<AnnotationRepositoryHandle>,
    settings: AnnotatorSettings,
}

impl SemanticAnnotator {
    /// Creates a new [`SemanticAnnotator`] from trait object handles.
    pub fn new(
        ontology: Arc<OntologyStoreHandle>,
        workflows: Arc<WorkflowRepositoryHandle>,
        annotations: Arc<AnnotationRepositoryHandle>,
        settings: AnnotatorSettings,
    ) -> Self {
        Self {
            ontology,
            workflows,
            annotations,
            settings,
        }
    }

    /// Wires every port to a single store value.
    pub fn with_store<S>(store: Arc<S>, settings: AnnotatorSettings) -> Self
    where
        S: OntologyStore<Error = StoreError>
            + WorkflowRepository<Error = StoreError>
            + AnnotationRepository<Error = StoreError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(store.clone(), store.clone(), store, settings)
    }

    /// Builds an annotator from configuration settings.
    ///
    /// # Errors
    ///
    /// Fails when the seed fixture cannot be loaded, the database cannot be
    /// reached, or the configured backend is not compiled in.
    pub async fn from_config(store: &StoreSettings, settings: AnnotatorSettings) -> Result<Self> {
        match store {
            StoreSettings::InMemory { seed } => {
                let store = match seed {
                    Some(path) => InMemoryStore::from_seed(&Seed::from_path(path)?)?,
                    None => InMemoryStore::new(),
                };
                Ok(Self::with_store(Arc::new(store), settings))
            }
            #[cfg(feature = "with-db")]
            StoreSettings::Sqlite {
                uri,
                create_schema,
                max_batch_rows,
            } => {
                let store = crate::store::SqliteStore::connect(uri)
                    .await?
                    .with_max_batch_rows(*max_batch_rows);
                if *create_schema {
                    store.ensure_schema().await?;
                }
                Ok(Self::with_store(Arc::new(store), settings))
            }
            #[cfg(not(feature = "with-db"))]
            StoreSettings::Sqlite { .. } => Err(StoreError::Unsupported("sqlite").into()),
        }
    }

    /// Returns a clone of the ontology store handle.
    pub fn ontology(&self) -> Arc<OntologyStoreHandle> {
        Arc::clone(&self.ontology)
    }

    /// Returns a clone of the workflow repository handle.
    pub fn workflows(&self) -> Arc<WorkflowRepositoryHandle> {
        Arc::clone(&self.workflows)
    }

    /// Returns a clone of the annotation repository handle.
    pub fn annotations(&self) -> Arc<AnnotationRepositoryHandle> {
        Arc::clone(&self.annotations)
    }

    /// Returns the active annotator settings.
    pub fn settings(&self) -> &AnnotatorSettings {
        &self.settings
    }

    /// Matches the term dictionary against every workflow's title,
    /// description and tags and writes one direct annotation per match.
    ///
    /// The dictionary is rebuilt on every call. Records of a workflow field
    /// are written together; a field without matches issues no write.
    ///
    /// # Errors
    ///
    /// Any store failure aborts the pass. Records written before the
    /// failure are kept.
    pub async fn annotate(&self) -> Result<AnnotationReport> {
        let dictionary = Dictionary::build(self.ontology.list_terms().await?);
        let matcher = Matcher::new(&dictionary, self.settings.boundary);
        let mut guard = DuplicateGuard::load(self.settings.duplicates, &*self.annotations).await?;
        let created_at = Utc::now();

        info!(
            dictionary_terms = dictionary.len(),
            boundary = ?self.settings.boundary,
            duplicates = ?self.settings.duplicates,
            "annotation_run_started"
        );

        let mut report = AnnotationReport {
            status: RunStatus::Ok,
            dictionary_terms: dictionary.len(),
            ..AnnotationReport::default()
        };

        for workflow in self.workflows.list_workflows().await? {
            let tags = self.workflows.list_tags(workflow.id).await?;
            let mut written = 0;

            for field in metadata_fields(&workflow, &tags) {
                report.fields_scanned += 1;
                let records = matcher
                    .find(field.text)
                    .into_iter()
                    .map(|concept| {
                        SemanticAnnotation::direct(
                            workflow.id,
                            concept,
                            field.metadata_type,
                            field.item,
                            created_at,
                        )
                    })
                    .collect();
                let records = guard.retain(records);
                if records.is_empty() {
                    continue;
                }
                self.annotations.insert_annotations(&records).await?;
                written += records.len();
            }

            debug!(workflow = %workflow.id, tags = tags.len(), written, "workflow_annotated");
            report.workflows_processed += 1;
            report.annotations_written += written;
        }

        report.duplicates_skipped = guard.skipped();
        info!(
            workflows = report.workflows_processed,
            written = report.annotations_written,
            duplicates_skipped = report.duplicates_skipped,
            "annotation_run_finished"
        );
        Ok(report)
    }

    /// Performs one generalization hop over every stored annotation.
    ///
    /// Each annotation whose concept has a resolvable parent yields a
    /// generalization record on that parent with `distance = 1`.
    ///
    /// # Errors
    ///
    /// Any store failure aborts the hop before anything is written.
    pub async fn expand(&self) -> Result<ExpansionReport> {
        let links = self.annotations.list_with_concept_parent().await?;
        let expansion = Expander::new(&*self.ontology)
            .expand(&links, Utc::now())
            .await?;
        let mut guard = DuplicateGuard::load(self.settings.duplicates, &*self.annotations).await?;

        for reference in &expansion.unresolved {
            debug!(reference = %reference, "expansion_parent_unresolved");
        }

        let records = guard.retain(expansion.annotations);
        self.annotations.insert_annotations(&records).await?;

        let report = ExpansionReport {
            status: RunStatus::Ok,
            annotations_read: links.len(),
            roots_skipped: expansion.roots_skipped,
            annotations_written: records.len(),
            duplicates_skipped: guard.skipped(),
            unresolved_references: expansion.unresolved.into_iter().collect(),
        };
        info!(
            read = report.annotations_read,
            written = report.annotations_written,
            roots_skipped = report.roots_skipped,
            unresolved = report.unresolved_references.len(),
            "expansion_hop_finished"
        );
        Ok(report)
    }

    /// Annotates, then expands once per configured generalization level.
    ///
    /// # Errors
    ///
    /// Stops at the first failing stage.
    pub async fn run(&self) -> Result<PipelineReport> {
        let annotation = self.annotate().await?;
        let mut expansions = Vec::new();
        for _ in 0..self.settings.generalization_levels {
            expansions.push(self.expand().await?);
        }
        Ok(PipelineReport {
            status: RunStatus::Ok,
            annotation,
            expansions,
        })
    }
}
