//! Shared fixtures for composing VDBs in tests
//!
//! Builders for the common shapes of tables, schemas, models, VDBs and
//! connectors, so tests only spell out what they actually exercise.

use crate::composite::CompositeVdb;
use crate::error::VdbResult;
use crate::function::{FunctionRegistry, FunctionTree, SYSTEM_SCOPE};
use crate::metadata::{Column, FunctionMethod, Schema, SchemaStore, Table};
use crate::vdb::{ConnectorRegistry, Model, StaticConnectorManager, VdbDefinition};
use std::sync::Arc;

/// Consolidated fixture factory
pub struct TestFixtures;

impl TestFixtures {
    /// A physical table with a string `id` column
    pub fn table(name: &str) -> Table {
        Table::physical(name).with_column(Column::new("id", "string"))
    }

    /// A schema holding one table per name
    ///
    /// Panics on a repeated table name.
    pub fn schema(name: &str, tables: &[&str]) -> Schema {
        let mut schema = Schema::new(name);
        for table in tables {
            schema
                .add_table(Self::table(table))
                .expect("Fixture table names must be unique");
        }
        schema
    }

    /// A store holding one single-table schema per name
    ///
    /// Panics on a repeated schema name.
    pub fn store(schemas: &[&str]) -> SchemaStore {
        let mut store = SchemaStore::new();
        for name in schemas {
            store
                .add_schema(Self::schema(name, &["t"]))
                .expect("Fixture schema names must be unique");
        }
        store
    }

    /// A VDB with one physical model per name, all backed by source `src`
    ///
    /// A repeated name yields an identical model and is kept once.
    pub fn vdb(name: &str, version: u32, models: &[&str]) -> VdbDefinition {
        let mut vdb = VdbDefinition::new(name, version);
        for model in models {
            vdb.add_model(Arc::new(physical_model(model, "src")))
                .expect("Fixture model names must be unique");
        }
        vdb
    }

    /// A node for `name` whose models each have a matching single-table schema
    pub fn node(name: &str, models: &[&str]) -> VdbResult<CompositeVdb> {
        NodeBuilder::new(Self::vdb(name, 1, models))
            .store(Self::store(models))
            .build()
    }
}

/// A physical model bound to one source
pub fn physical_model(name: &str, source: &str) -> Model {
    Model::physical(name, source)
}

/// A connector for `source` with no push-down functions
pub fn static_connector(source: &str) -> Arc<StaticConnectorManager> {
    Arc::new(StaticConnectorManager::new(source, "loopback"))
}

/// A function taking one string and returning a string
pub fn string_function(name: &str) -> FunctionMethod {
    FunctionMethod::new(name, vec!["string".into()], "string")
}

/// Built-in functions of the system scope
pub fn system_functions() -> Arc<FunctionTree> {
    Arc::new(FunctionTree::new(
        SYSTEM_SCOPE,
        vec![
            Arc::new(FunctionMethod::new("concat", vec!["string".into(), "string".into()], "string")),
            Arc::new(FunctionMethod::new("upper", vec!["string".into()], "string")),
        ],
    ))
}

/// Step-by-step construction of a [`CompositeVdb`]
pub struct NodeBuilder {
    base: Arc<VdbDefinition>,
    store: SchemaStore,
    udf: Option<FunctionRegistry>,
    connectors: ConnectorRegistry,
    additional_stores: Vec<SchemaStore>,
}

impl NodeBuilder {
    pub fn new(base: VdbDefinition) -> Self {
        Self::from_arc(Arc::new(base))
    }

    pub fn from_arc(base: Arc<VdbDefinition>) -> Self {
        Self {
            base,
            store: SchemaStore::new(),
            udf: None,
            connectors: ConnectorRegistry::new(),
            additional_stores: Vec::new(),
        }
    }

    pub fn store(mut self, store: SchemaStore) -> Self {
        self.store = store;
        self
    }

    pub fn udf(mut self, udf: FunctionRegistry) -> Self {
        self.udf = Some(udf);
        self
    }

    pub fn connector(mut self, source: &str) -> Self {
        self.connectors.add_manager(static_connector(source));
        self
    }

    pub fn connectors(mut self, connectors: ConnectorRegistry) -> Self {
        self.connectors = connectors;
        self
    }

    pub fn additional_store(mut self, store: SchemaStore) -> Self {
        self.additional_stores.push(store);
        self
    }

    pub fn build(self) -> VdbResult<CompositeVdb> {
        CompositeVdb::new(
            self.base,
            self.store,
            self.udf,
            system_functions(),
            self.connectors,
            self.additional_stores,
        )
    }
}
