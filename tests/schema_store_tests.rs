//! Stores loaded from JSON documents and merged through composed nodes.

use std::fs;
use std::sync::Arc;
use vdbfold::metadata::loader::{load_store_from_file, save_store_to_file};
use vdbfold::metadata::SchemaStore;
use vdbfold::testing::{NodeBuilder, TestFixtures};
use vdbfold::VdbError;

const PARTS: &str = r#"{
    "schemas": [
        {
            "name": "parts",
            "uuid": "6f1b7f0a-31c3-4b8e-9a57-0c1d2e3f4a5b",
            "tables": [
                {
                    "name": "inventory",
                    "uuid": "0d9c8b7a-6f5e-4d3c-2b1a-001122334455",
                    "columns": [{"name": "sku", "uuid": "aa00bb11-cc22-dd33-ee44-ff5566778899", "data_type": "string"}]
                }
            ],
            "procedures": [
                {"name": "restock", "uuid": "11111111-2222-3333-4444-555555555555", "virtual": true, "query_plan": "begin end"}
            ]
        }
    ],
    "resources": [{"path": "/parts.ddl", "visible": true}]
}"#;

#[test]
fn loaded_stores_compose_through_nodes() {
    vdbfold::logging::init_for_tests();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parts.json");
    fs::write(&path, PARTS).unwrap();

    let child = NodeBuilder::new(TestFixtures::vdb("parts", 1, &["parts"]))
        .store(load_store_from_file(&path).unwrap())
        .build()
        .unwrap();
    let parent = TestFixtures::node("orders", &["orders"]).unwrap();
    parent.add_child(Arc::new(child)).unwrap();
    parent.mark_load_finished().unwrap();

    let view = parent.merged_view();
    let metadata = view.metadata();
    let table = metadata.table("PARTS.inventory").unwrap();
    assert_eq!(table.columns[0].meta.name, "sku");
    assert_eq!(
        metadata.procedure("parts.restock").unwrap().query_plan.as_deref(),
        Some("begin end")
    );
    assert!(metadata.is_resource_visible("/parts.ddl"));
    assert_eq!(metadata.schemas().count(), 2);
}

#[test]
fn identical_documents_from_two_imports_merge_cleanly() {
    vdbfold::logging::init_for_tests();
    let first = NodeBuilder::new(TestFixtures::vdb("a", 1, &["ma"]))
        .store(SchemaStore::from_json(PARTS).unwrap())
        .build()
        .unwrap();
    let second = NodeBuilder::new(TestFixtures::vdb("b", 1, &["mb"]))
        .store(SchemaStore::from_json(PARTS).unwrap())
        .build()
        .unwrap();

    let parent = TestFixtures::node("top", &["mt"]).unwrap();
    parent.add_child(Arc::new(first)).unwrap();
    parent.add_child(Arc::new(second)).unwrap();
    parent.mark_load_finished().unwrap();

    let view = parent.merged_view();
    assert_eq!(view.store().schema("parts").unwrap().tables().count(), 1);
    assert_eq!(view.model_names(), vec!["mt", "ma", "mb"]);
}

#[test]
fn duplicate_table_in_document_is_rejected() {
    let json = r#"{"schemas": [{"name": "pm1", "tables": [{"name": "g1"}, {"name": "G1"}]}]}"#;
    match SchemaStore::from_json(json) {
        Err(VdbError::Serialization(_)) | Err(VdbError::Collision(_)) => {}
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[test]
fn saved_store_reloads_equal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");
    let store = SchemaStore::from_json(PARTS).unwrap();

    save_store_to_file(&store, &path).unwrap();
    assert_eq!(load_store_from_file(&path).unwrap(), store);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_store_from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, VdbError::Io(_)));
}
