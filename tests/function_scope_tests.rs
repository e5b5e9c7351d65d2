//! Scoping of user-defined functions across composed VDBs.

use std::sync::Arc;
use vdbfold::metadata::{FunctionMethod, Schema, SchemaStore, Table};
use vdbfold::testing::{string_function, NodeBuilder, TestFixtures};
use vdbfold::vdb::StaticConnectorManager;
use vdbfold::{ConnectorRegistry, FunctionRegistry, RecordKind, VdbError, SYSTEM_SCOPE};

fn store_with_function(schema: &str, function: &str) -> SchemaStore {
    SchemaStore::new()
        .with_schema(
            Schema::new(schema)
                .with_table(Table::physical("t"))
                .unwrap()
                .with_function(string_function(function))
                .unwrap(),
        )
        .unwrap()
}

#[test]
fn identical_functions_from_two_sources_are_kept_once() {
    vdbfold::logging::init_for_tests();
    let mut registry = FunctionRegistry::new();
    registry.add_functions("a", vec![Arc::new(string_function("f"))]).unwrap();
    registry.add_functions("A", vec![Arc::new(string_function("f"))]).unwrap();
    assert_eq!(registry.function_count(), 1);
}

#[test]
fn functions_resolve_only_in_their_own_scope() {
    vdbfold::logging::init_for_tests();
    let parent = NodeBuilder::new(TestFixtures::vdb("n", 1, &["a"]))
        .store(store_with_function("a", "fa"))
        .build()
        .unwrap();
    let child = NodeBuilder::new(TestFixtures::vdb("c", 1, &["b"]))
        .store(store_with_function("b", "fb"))
        .build()
        .unwrap();
    parent.add_child(Arc::new(child)).unwrap();
    parent.mark_load_finished().unwrap();

    let view = parent.merged_view();
    let metadata = view.metadata();
    assert!(metadata.function_tree("a").unwrap().find("fb").is_empty());
    assert_eq!(metadata.function_tree("B").unwrap().find("fb").len(), 1);
    assert!(metadata.resolve_functions("a", "fb").is_empty());
    assert_eq!(metadata.resolve_functions("b", "fb").len(), 1);
    assert_eq!(view.udf().functions("a").count(), 1);
}

#[test]
fn global_functions_are_visible_from_every_scope() {
    vdbfold::logging::init_for_tests();
    let connectors = ConnectorRegistry::new()
        .with_manager(Arc::new(StaticConnectorManager::new("src", "oracle").with_function(string_function("soundex"))));
    let node = NodeBuilder::new(TestFixtures::vdb("n", 1, &["a"]))
        .store(store_with_function("a", "fa"))
        .connectors(connectors)
        .build()
        .unwrap();
    node.mark_load_finished().unwrap();

    let metadata = node.merged_view().metadata().clone();
    assert_eq!(metadata.resolve_functions("a", "soundex").len(), 1);
    assert_eq!(metadata.resolve_functions("a", "upper").len(), 1);
    assert_eq!(metadata.function_tree(SYSTEM_SCOPE).unwrap().len(), 1);
    assert_eq!(metadata.system_functions().len(), 2);
}

#[test]
fn scopes_without_functions_get_no_tree() {
    vdbfold::logging::init_for_tests();
    let node = TestFixtures::node("n", &["empty"]).unwrap();
    node.mark_load_finished().unwrap();

    let view = node.merged_view();
    assert!(view.udf().scopes().any(|s| s == "empty"));
    assert!(view.metadata().function_tree("empty").is_none());
    assert_eq!(view.metadata().scopes().count(), 0);
}

#[test]
fn own_udf_registry_is_kept_with_its_scopes() {
    vdbfold::logging::init_for_tests();
    let mut udf = FunctionRegistry::new();
    udf.add_functions("vm1", vec![Arc::new(string_function("mask"))]).unwrap();
    let node = NodeBuilder::new(TestFixtures::vdb("n", 1, &["pm1"]))
        .udf(udf)
        .build()
        .unwrap();

    let metadata = node.merged_view().metadata().clone();
    assert_eq!(metadata.resolve_functions("vm1", "mask").len(), 1);
    assert!(metadata.resolve_functions("pm1", "mask").is_empty());
}

#[test]
fn additional_store_functions_join_the_facade_only() {
    vdbfold::logging::init_for_tests();
    let node = NodeBuilder::new(TestFixtures::vdb("n", 1, &["pm1"]))
        .store(TestFixtures::store(&["pm1"]))
        .additional_store(store_with_function("sysadmin", "refresh_matview"))
        .build()
        .unwrap();
    node.mark_load_finished().unwrap();

    let view = node.merged_view();
    assert_eq!(view.metadata().resolve_functions("sysadmin", "refresh_matview").len(), 1);
    assert!(view.udf().functions("sysadmin").next().is_none());
    assert!(view.metadata().table("sysadmin.t").is_some());
    assert!(view.store().schema("sysadmin").is_none());
}

#[test]
fn conflicting_function_signatures_are_rejected() {
    vdbfold::logging::init_for_tests();
    let parent = NodeBuilder::new(TestFixtures::vdb("n", 1, &["a"]))
        .store(store_with_function("a", "f"))
        .build()
        .unwrap();
    parent.mark_load_finished().unwrap();

    // Same signature, different return type.
    let schema = Schema::new("a")
        .with_function(FunctionMethod::new("f", vec!["string".into()], "integer"))
        .unwrap();
    let child = NodeBuilder::new(TestFixtures::vdb("c", 1, &["other"]))
        .store(SchemaStore::new().with_schema(schema).unwrap())
        .build()
        .unwrap();
    let err = parent.add_child(Arc::new(child)).unwrap_err();
    match err {
        VdbError::Collision(collision) => assert_eq!(collision.kind, RecordKind::Function),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(parent.merged_view().model_names(), vec!["a"]);
}
