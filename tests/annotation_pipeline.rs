use std::{
    fs,
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use semantic_annotator::{
    annotation::{AnnotationType, DuplicatePolicy, MetadataType, RunStatus, SemanticAnnotator},
    config::{AnnotatorSettings, Config, StoreSettings},
    store::{InMemoryStore, Seed},
    workflow::{TagId, WorkflowId},
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn seeded_store() -> Arc<InMemoryStore> {
    let seed = Seed::from_path(&fixture("edam.yaml")).expect("seed fixture");
    Arc::new(InMemoryStore::from_seed(&seed).expect("seeded store"))
}

#[tokio::test]
async fn annotates_fixture_workflows() {
    let store = seeded_store();
    let annotator = SemanticAnnotator::with_store(store.clone(), AnnotatorSettings::default());

    let report = annotator.annotate().await.expect("annotate");
    assert_eq!(report.status, RunStatus::Ok);
    assert_eq!(report.workflows_processed, 3);
    // 3 workflows: title + description each, plus 3 tags
    assert_eq!(report.fields_scanned, 9);
    assert_eq!(report.annotations_written, 5);

    let written: Vec<_> = store
        .annotations()
        .into_iter()
        .map(|record| {
            (
                record.workflow,
                record.metadata_type,
                record.metadata_item,
                record.concept.0,
            )
        })
        .collect();
    assert_eq!(
        written,
        vec![
            (WorkflowId(1), MetadataType::Title, None, 4),
            (WorkflowId(1), MetadataType::Description, None, 4),
            (WorkflowId(1), MetadataType::Tags, Some(TagId(5)), 3),
            (WorkflowId(2), MetadataType::Title, None, 2),
            (WorkflowId(2), MetadataType::Tags, Some(TagId(6)), 2),
        ]
    );
}

#[tokio::test]
async fn pipeline_appends_repeated_hops() {
    let store = seeded_store();
    let settings = AnnotatorSettings {
        generalization_levels: 2,
        ..AnnotatorSettings::default()
    };
    let report = SemanticAnnotator::with_store(store.clone(), settings)
        .run()
        .await
        .expect("run");

    assert_eq!(report.expansions.len(), 2);
    assert_eq!(report.expansions[0].annotations_read, 5);
    assert_eq!(report.expansions[0].annotations_written, 5);
    assert_eq!(report.expansions[0].roots_skipped, 0);
    assert_eq!(report.expansions[1].annotations_read, 10);
    assert_eq!(report.expansions[1].annotations_written, 7);
    assert_eq!(report.expansions[1].roots_skipped, 3);
    assert_eq!(report.annotations_written(), 17);
    assert_eq!(store.annotations().len(), 17);

    let generalized = store
        .annotations()
        .into_iter()
        .filter(|record| record.annotation_type == AnnotationType::Generalization)
        .collect::<Vec<_>>();
    assert_eq!(generalized.len(), 12);
    assert!(generalized.iter().all(|record| record.distance == 1));
}

#[tokio::test]
async fn upsert_pipeline_writes_each_key_once() {
    let store = seeded_store();
    let settings = AnnotatorSettings {
        duplicates: DuplicatePolicy::Upsert,
        generalization_levels: 2,
        ..AnnotatorSettings::default()
    };
    let annotator = SemanticAnnotator::with_store(store.clone(), settings);

    let first = annotator.run().await.expect("first run");
    assert_eq!(first.expansions[1].annotations_written, 2);
    assert_eq!(first.expansions[1].duplicates_skipped, 5);
    assert_eq!(first.annotations_written(), 12);

    let second = annotator.run().await.expect("second run");
    assert_eq!(second.annotations_written(), 0);
    assert_eq!(store.annotations().len(), 12);
}

#[tokio::test]
async fn builds_from_config_file() {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock")
        .as_nanos();
    let config_path = std::env::temp_dir().join(format!("semantic-annotator-{unique}.yaml"));
    fs::write(
        &config_path,
        format!(
            "store:\n  kind: in_memory\n  seed: {}\nannotator:\n  generalization_levels: 1\n",
            fixture("edam.yaml").display()
        ),
    )
    .expect("config file");

    let config = Config::from_file(&config_path).expect("config");
    assert!(matches!(config.store, StoreSettings::InMemory { seed: Some(_) }));

    let annotator = SemanticAnnotator::from_config(&config.store, config.annotator)
        .await
        .expect("annotator");
    let report = annotator.run().await.expect("run");
    assert_eq!(report.annotation.annotations_written, 5);
    assert_eq!(report.expansions.len(), 1);

    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["status"], "OK");
    assert_eq!(json["expansions"][0]["status"], "OK");

    fs::remove_file(config_path).expect("cleanup");
}
