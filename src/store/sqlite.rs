//! SQLite adapter over the relational annotation layout.
//!
//! | table                 | columns                                                        |
//! |-----------------------|----------------------------------------------------------------|
//! | `ontology`            | `id`, `prefix`, `label`                                        |
//! | `ontology_concept`    | `id`, `id_ontology`, `iri`, `iri_parent`, `label`              |
//! | `ontology_term`       | `id`, `id_ontology_concept`, `string`                          |
//! | `workflow`            | `id`, `title`, `description`                                   |
//! | `tag` / `tag_wf`      | `id`, `name` / `id_workflow`, `id_tag`                         |
//! | `semantic_annotation` | `id_workflow`, `id_ontology_concept`, `annotation_type`, ...   |

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row, Sqlite, SqlitePool,
};
use super::{seed::Seed, StoreError};
use crate::{
    annotation::{
        AnnotationKey, AnnotationRepository, AnnotationType, MetadataType, ParentLink,
        SemanticAnnotation,
    },
    ontology::{ConceptId, Iri, Ontology, OntologyStore, TermRecord},
    workflow::{Tag, TagId, Workflow, WorkflowId, WorkflowRepository},
};

const DEFAULT_BATCH_ROWS: usize = 100;

const SCHEMA: &[&str] = &[
    r"CREATE TABLE IF NOT EXISTS ontology (
        id INTEGER PRIMARY KEY,
        prefix TEXT NOT NULL,
        label TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS ontology_concept (
        id INTEGER PRIMARY KEY,
        id_ontology INTEGER NOT NULL REFERENCES ontology (id),
        iri TEXT NOT NULL,
        iri_parent TEXT,
        label TEXT
    )",
    "CREATE INDEX IF NOT EXISTS ontology_concept_iri ON ontology_concept (iri)",
    r"CREATE TABLE IF NOT EXISTS ontology_term (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        id_ontology_concept INTEGER NOT NULL REFERENCES ontology_concept (id),
        string TEXT NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS workflow (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    )",
    r"CREATE TABLE IF NOT EXISTS tag (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS tag_wf (
        id_workflow INTEGER NOT NULL REFERENCES workflow (id),
        id_tag INTEGER NOT NULL REFERENCES tag (id),
        PRIMARY KEY (id_workflow, id_tag)
    )",
    r"CREATE TABLE IF NOT EXISTS semantic_annotation (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        id_workflow INTEGER NOT NULL,
        id_ontology_concept INTEGER NOT NULL,
        annotation_type TEXT NOT NULL,
        distance INTEGER NOT NULL,
        id_metadata INTEGER,
        metadata_type TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
];

const INSERT_ANNOTATION_COLUMNS: &str = "INSERT INTO semantic_annotation \
    (id_workflow, id_ontology_concept, annotation_type, distance, id_metadata, metadata_type, created_at) ";

/// Store backed by a SQLite connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    max_batch_rows: usize,
}

impl SqliteStore {
    /// Opens a pool for `uri`, creating the database file when missing.
    ///
    /// In-memory databases are pinned to a single long lived connection so
    /// that every query sees the same data.
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(uri)?.create_if_missing(true);
        let in_memory = uri.contains(":memory:") || uri.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };
        let pool = pool_options.connect_with(options).await?;
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            max_batch_rows: DEFAULT_BATCH_ROWS,
        }
    }

    /// Caps the number of rows per multi-row insert statement.
    #[must_use]
    pub fn with_max_batch_rows(mut self, rows: usize) -> Self {
        self.max_batch_rows = rows.max(1);
        self
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the tables when they do not exist yet.
    ///
    /// Meant for local runs and tests; existing tables are left untouched.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Writes an ontology with its concepts and terms in one transaction.
    pub async fn insert_ontology(&self, ontology: &Ontology) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO ontology (id, prefix, label) VALUES (?, ?, ?)")
            .bind(ontology.id().0)
            .bind(ontology.prefix())
            .bind(ontology.label())
            .execute(&mut *tx)
            .await?;

        for concept in ontology.concepts().values() {
            sqlx::query(
                "INSERT INTO ontology_concept (id, id_ontology, iri, iri_parent, label) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(concept.id().0)
            .bind(concept.ontology().0)
            .bind(concept.iri().as_str())
            .bind(concept.parent().map(Iri::as_str))
            .bind(concept.label())
            .execute(&mut *tx)
            .await?;
        }

        for term in ontology.terms() {
            sqlx::query("INSERT INTO ontology_term (id_ontology_concept, string) VALUES (?, ?)")
                .bind(term.concept().0)
                .bind(term.text())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Writes a workflow and links its tags, creating unknown tags.
    pub async fn insert_workflow(&self, workflow: &Workflow, tags: &[Tag]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO workflow (id, title, description) VALUES (?, ?, ?)")
            .bind(workflow.id.0)
            .bind(&workflow.title)
            .bind(&workflow.description)
            .execute(&mut *tx)
            .await?;

        for tag in tags {
            sqlx::query("INSERT OR IGNORE INTO tag (id, name) VALUES (?, ?)")
                .bind(tag.id.0)
                .bind(&tag.name)
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT OR IGNORE INTO tag_wf (id_workflow, id_tag) VALUES (?, ?)")
                .bind(workflow.id.0)
                .bind(tag.id.0)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Loads every ontology and workflow of a seed fixture.
    pub async fn import_seed(&self, seed: &Seed) -> Result<(), StoreError> {
        for ontology in seed.ontologies()? {
            self.insert_ontology(&ontology).await?;
        }
        for (workflow, tags) in seed.workflows() {
            self.insert_workflow(&workflow, &tags).await?;
        }
        Ok(())
    }

    /// Reads back every stored annotation in insertion order.
    pub async fn list_annotations(&self) -> Result<Vec<SemanticAnnotation>, StoreError> {
        let rows = sqlx::query(
            "SELECT id_workflow, id_ontology_concept, annotation_type, distance, id_metadata, \
             metadata_type, created_at FROM semantic_annotation ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                let key = decode_key(row)?;
                let distance: i64 = row.try_get("distance")?;
                let created_at: DateTime<Utc> = row.try_get("created_at")?;
                Ok(SemanticAnnotation {
                    workflow: key.workflow,
                    concept: key.concept,
                    annotation_type: key.annotation_type,
                    distance: u32::try_from(distance)
                        .map_err(|err| StoreError::corrupt("distance", err))?,
                    metadata_item: key.metadata_item,
                    metadata_type: key.metadata_type,
                    created_at,
                })
            })
            .collect()
    }

    async fn insert_one(&self, record: &SemanticAnnotation) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "{INSERT_ANNOTATION_COLUMNS}VALUES (?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(record.workflow.0)
        .bind(record.concept.0)
        .bind(record.annotation_type.as_str())
        .bind(i64::from(record.distance))
        .bind(record.metadata_item.map(|tag| tag.0))
        .bind(record.metadata_type.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_batch(&self, records: &[SemanticAnnotation]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for chunk in records.chunks(self.max_batch_rows) {
            let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(INSERT_ANNOTATION_COLUMNS);
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(record.workflow.0)
                    .push_bind(record.concept.0)
                    .push_bind(record.annotation_type.as_str())
                    .push_bind(i64::from(record.distance))
                    .push_bind(record.metadata_item.map(|tag| tag.0))
                    .push_bind(record.metadata_type.as_str())
                    .push_bind(record.created_at);
            });
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

fn parse_column<T>(column: &'static str, value: &str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: ToString,
{
    value
        .parse()
        .map_err(|err: T::Err| StoreError::corrupt(column, err))
}

fn decode_key(row: &SqliteRow) -> Result<AnnotationKey, StoreError> {
    let annotation_type: String = row.try_get("annotation_type")?;
    let metadata_type: String = row.try_get("metadata_type")?;
    let metadata_item: Option<i64> = row.try_get("id_metadata")?;
    Ok(AnnotationKey {
        workflow: WorkflowId(row.try_get("id_workflow")?),
        concept: ConceptId(row.try_get("id_ontology_concept")?),
        annotation_type: parse_column::<AnnotationType>("annotation_type", &annotation_type)?,
        metadata_type: parse_column::<MetadataType>("metadata_type", &metadata_type)?,
        metadata_item: metadata_item.map(TagId),
    })
}

#[async_trait]
impl OntologyStore for SqliteStore {
    type Error = StoreError;

    async fn list_terms(&self) -> Result<Vec<TermRecord>, Self::Error> {
        let rows = sqlx::query(
            "SELECT id_ontology_concept, string FROM ontology_term \
             WHERE string != '' ORDER BY LENGTH(string) DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                Ok(TermRecord::new(
                    ConceptId(row.try_get("id_ontology_concept")?),
                    row.try_get::<String, _>("string")?,
                ))
            })
            .collect()
    }

    async fn resolve_parent_reference(
        &self,
        reference: &str,
    ) -> Result<Option<ConceptId>, Self::Error> {
        let row = sqlx::query("SELECT id FROM ontology_concept WHERE iri = ? LIMIT 1")
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row
            .map(|r| r.try_get::<i64, _>("id"))
            .transpose()?
            .map(ConceptId))
    }
}

#[async_trait]
impl WorkflowRepository for SqliteStore {
    type Error = StoreError;

    async fn list_workflows(&self) -> Result<Vec<Workflow>, Self::Error> {
        let rows = sqlx::query("SELECT id, title, description FROM workflow ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                Ok(Workflow {
                    id: WorkflowId(row.try_get("id")?),
                    title: row.try_get("title")?,
                    description: row.try_get("description")?,
                })
            })
            .collect()
    }

    async fn list_tags(&self, workflow: WorkflowId) -> Result<Vec<Tag>, Self::Error> {
        let rows = sqlx::query(
            "SELECT DISTINCT tag.id AS id, tag.name AS name FROM tag_wf \
             JOIN tag ON tag_wf.id_tag = tag.id \
             WHERE tag_wf.id_workflow = ? ORDER BY tag.id",
        )
        .bind(workflow.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<_, StoreError> {
                Ok(Tag {
                    id: TagId(row.try_get("id")?),
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl AnnotationRepository for SqliteStore {
    type Error = StoreError;

    async fn insert_annotations(&self, records: &[SemanticAnnotation]) -> Result<(), Self::Error> {
        match records {
            [] => Ok(()),
            [record] => self.insert_one(record).await,
            _ => self.insert_batch(records).await,
        }
    }

    async fn list_with_concept_parent(&self) -> Result<Vec<ParentLink>, Self::Error> {
        let rows = sqlx::query(
            "SELECT ontology_concept.iri_parent AS iri_parent, \
             semantic_annotation.id_workflow AS id_workflow, \
             semantic_annotation.id_metadata AS id_metadata, \
             semantic_annotation.metadata_type AS metadata_type \
             FROM semantic_annotation \
             JOIN ontology_concept ON ontology_concept.id = semantic_annotation.id_ontology_concept \
             ORDER BY semantic_annotation.id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut links = Vec::with_capacity(rows.len());
        for row in &rows {
            let parent: Option<String> = row.try_get("iri_parent")?;
            let metadata_type: String = row.try_get("metadata_type")?;
            let metadata_item: Option<i64> = row.try_get("id_metadata")?;
            links.push(ParentLink {
                parent,
                workflow: WorkflowId(row.try_get("id_workflow")?),
                metadata_item: metadata_item.map(TagId),
                metadata_type: parse_column("metadata_type", &metadata_type)?,
            });
        }
        Ok(links)
    }

    async fn list_keys(&self) -> Result<Vec<AnnotationKey>, Self::Error> {
        let rows = sqlx::query(
            "SELECT id_workflow, id_ontology_concept, annotation_type, id_metadata, metadata_type \
             FROM semantic_annotation",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        let store = SqliteStore::connect("sqlite::memory:")
            .await
            .expect("connect")
            .with_max_batch_rows(2);
        store.ensure_schema().await.expect("schema");
        store
    }

    fn direct(concept: i64, metadata_type: MetadataType, item: Option<i64>) -> SemanticAnnotation {
        SemanticAnnotation::direct(
            WorkflowId(1),
            ConceptId(concept),
            metadata_type,
            item.map(TagId),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn schema_creation_is_repeatable() {
        let store = store().await;
        store.ensure_schema().await.expect("second run");
    }

    #[tokio::test]
    async fn batches_span_several_statements() {
        let store = store().await;
        let records = vec![
            direct(1, MetadataType::Title, None),
            direct(2, MetadataType::Description, None),
            direct(3, MetadataType::Tags, Some(8)),
            direct(4, MetadataType::Tags, Some(9)),
            direct(5, MetadataType::Title, None),
        ];
        store.insert_annotations(&records).await.expect("batch");
        store
            .insert_annotations(&[direct(6, MetadataType::Title, None)])
            .await
            .expect("single");
        store.insert_annotations(&[]).await.expect("empty");

        let stored = store.list_annotations().await.expect("list");
        assert_eq!(stored.len(), 6);
        assert_eq!(stored[2].metadata_item, Some(TagId(8)));
        assert_eq!(stored[2].metadata_type, MetadataType::Tags);
        assert_eq!(stored[5].concept, ConceptId(6));
        assert!(stored.iter().all(|record| record.distance == 0));

        let keys = store.list_keys().await.expect("keys");
        assert_eq!(keys.len(), 6);
    }

    #[tokio::test]
    async fn unknown_enum_values_surface_as_corruption() {
        let store = store().await;
        sqlx::query(&format!(
            "{INSERT_ANNOTATION_COLUMNS}VALUES (1, 1, 'Direct', 0, NULL, 'abstract', '2024-01-01T00:00:00Z')"
        ))
        .execute(store.pool())
        .await
        .expect("raw insert");

        let err = store.list_keys().await.expect_err("corrupt row");
        assert!(matches!(err, StoreError::Corrupt { column: "metadata_type", .. }));
    }
}
