use super::merge::{assemble_metadata, merge_definitions, merge_functions, merge_stores, merge_visibility};
use super::view::MergedView;
use crate::config::CompositionConfig;
use crate::enrichment::{enrich_schema, EnrichmentSummary};
use crate::error::{VdbError, VdbResult};
use crate::function::{FunctionRegistry, FunctionTree};
use crate::metadata::{SchemaStore, VisibilityMap};
use crate::vdb::{ConnectorRegistry, VdbDefinition, VdbKey};
use indexmap::IndexMap;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Everything a rebuild reads, guarded by the node's mutation lock.
struct NodeState {
    base: Arc<VdbDefinition>,
    store: Arc<SchemaStore>,
    udf: Option<Arc<FunctionRegistry>>,
    connectors: Arc<ConnectorRegistry>,
    visibility: Arc<VisibilityMap>,
    additional_stores: Vec<Arc<SchemaStore>>,
    children: IndexMap<VdbKey, Arc<CompositeVdb>>,
    load_finished: bool,
}

/// A deployed VDB together with the VDBs it imports.
///
/// The node owns its base definition, schema store, functions and
/// connectors, and holds its imported VDBs as children. Once loading has
/// finished every structural change rebuilds a [`MergedView`] composing the
/// node with the published views of its children. Readers get the last
/// published view from [`CompositeVdb::merged_view`] without waiting on a
/// rebuild in progress.
///
/// A parent reads only the published views of its children, so a child
/// that changes after the parent's last rebuild is picked up by the parent's
/// next rebuild (see [`CompositeVdb::refresh`]).
pub struct CompositeVdb {
    key: VdbKey,
    system_functions: Arc<FunctionTree>,
    config: CompositionConfig,
    state: Mutex<NodeState>,
    published: RwLock<Arc<MergedView>>,
}

impl CompositeVdb {
    /// Creates a node whose view is the unmerged base VDB.
    ///
    /// Fails if the node's own functions, schema functions and connector
    /// push-down functions define one signature with conflicting content.
    pub fn new(
        base: Arc<VdbDefinition>,
        store: SchemaStore,
        udf: Option<FunctionRegistry>,
        system_functions: Arc<FunctionTree>,
        connectors: ConnectorRegistry,
        additional_stores: Vec<SchemaStore>,
    ) -> VdbResult<Self> {
        let visibility = store.resources().cloned().unwrap_or_default();
        let state = NodeState {
            base,
            store: Arc::new(store),
            udf: udf.map(Arc::new),
            connectors: Arc::new(connectors),
            visibility: Arc::new(visibility),
            additional_stores: additional_stores.into_iter().map(Arc::new).collect(),
            children: IndexMap::new(),
            load_finished: false,
        };
        let key = state.base.key();
        let view = compose(&state, &state.store, &system_functions)?;
        debug!("Created composite VDB {}", key);

        Ok(Self {
            key,
            system_functions,
            config: CompositionConfig::default(),
            state: Mutex::new(state),
            published: RwLock::new(Arc::new(view)),
        })
    }

    pub fn with_config(mut self, config: CompositionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn key(&self) -> &VdbKey {
        &self.key
    }

    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    /// The last published view.
    pub fn merged_view(&self) -> Arc<MergedView> {
        Arc::clone(&self.published.read())
    }

    /// The node's own definition, without imported models.
    pub fn base(&self) -> Arc<VdbDefinition> {
        Arc::clone(&self.state.lock().base)
    }

    pub fn is_load_finished(&self) -> bool {
        self.state.lock().load_finished
    }

    pub fn has_child(&self, key: &VdbKey) -> bool {
        self.state.lock().children.contains_key(key)
    }

    pub fn child_keys(&self) -> Vec<VdbKey> {
        self.state.lock().children.keys().cloned().collect()
    }

    /// Imports `child`, replacing any child with the same key.
    ///
    /// After loading has finished the view is rebuilt; if that fails the
    /// import is undone and the previous view stays published.
    pub fn add_child(&self, child: Arc<CompositeVdb>) -> VdbResult<()> {
        let mut state = self.state.lock();
        let key = child.key().clone();
        let (index, previous) = state.children.insert_full(key.clone(), child);
        debug!("Added child {} to {}", key, self.key);

        if !state.load_finished {
            return Ok(());
        }
        if let Err(e) = self.rebuild(&state) {
            warn!("Rejected child {} of {}: {}", key, self.key, e);
            match previous {
                Some(previous) => {
                    state.children[index] = previous;
                }
                None => {
                    state.children.shift_remove(&key);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Drops the child with `key`; unknown keys are ignored.
    pub fn remove_child(&self, key: &VdbKey) -> VdbResult<()> {
        let mut state = self.state.lock();
        let Some((index, removed_key, removed)) = state.children.shift_remove_full(key) else {
            return Ok(());
        };
        debug!("Removed child {} from {}", removed_key, self.key);

        if !state.load_finished {
            return Ok(());
        }
        if let Err(e) = self.rebuild(&state) {
            warn!("Could not remove child {} from {}: {}", removed_key, self.key, e);
            state.children.shift_insert(index, removed_key, removed);
            return Err(e);
        }
        Ok(())
    }

    /// Signals that the node and its imports are loaded.
    ///
    /// The first successful call enriches the node's own models (unless
    /// disabled in the configuration) and publishes the first merged view.
    /// Later calls do nothing. On failure the node stays unfinished and the
    /// call may be retried.
    pub fn mark_load_finished(&self) -> VdbResult<()> {
        let mut state = self.state.lock();
        if state.load_finished {
            return Ok(());
        }

        let store = if self.config.enrich_on_load {
            self.enrich(&state)?
        } else {
            Arc::clone(&state.store)
        };
        let view = compose(&state, &store, &self.system_functions)?;
        state.store = store;
        state.load_finished = true;
        self.publish(view);
        info!("Composite VDB {} finished loading", self.key);
        Ok(())
    }

    /// Rebuilds from the children's current views; no-op before loading
    /// has finished.
    pub fn refresh(&self) -> VdbResult<()> {
        let state = self.state.lock();
        if !state.load_finished {
            return Ok(());
        }
        self.rebuild(&state)
    }

    fn rebuild(&self, state: &NodeState) -> VdbResult<()> {
        let view = compose(state, &state.store, &self.system_functions)?;
        self.publish(view);
        Ok(())
    }

    fn publish(&self, view: MergedView) {
        info!(
            "Published view of {}: {} models, {} schemas, {} functions",
            self.key,
            view.vdb.models().len(),
            view.store.len(),
            view.udf.function_count()
        );
        *self.published.write() = Arc::new(view);
    }

    /// Applies each own model's repository overrides to a copy of the store.
    fn enrich(&self, state: &NodeState) -> VdbResult<Arc<SchemaStore>> {
        let mut store = Arc::clone(&state.store);
        for model in state.base.models() {
            let Some(enricher) = model.provider.as_ref().and_then(|p| p.as_enricher()) else {
                continue;
            };
            let Some(schema) = Arc::make_mut(&mut store).schema_mut(&model.name) else {
                debug!("Model {} of {} has no schema to enrich", model.name, self.key);
                continue;
            };
            let summary: EnrichmentSummary = enrich_schema(enricher, &state.base.name, state.base.version, schema)
                .map_err(|source| {
                    warn!("Enrichment of model {} in {} failed: {}", model.name, self.key, source);
                    VdbError::Provider {
                        vdb: self.key.to_string(),
                        source,
                    }
                })?;
            debug!("Enriched model {} of {}: {:?}", model.name, self.key, summary);
        }
        Ok(store)
    }
}

impl std::fmt::Debug for CompositeVdb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeVdb")
            .field("key", &self.key)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Composes `state` (with `store` in place of its own) and the children's
/// published views.
fn compose(state: &NodeState, store: &Arc<SchemaStore>, system_functions: &Arc<FunctionTree>) -> VdbResult<MergedView> {
    let children: Vec<Arc<MergedView>> = state.children.values().map(|c| c.merged_view()).collect();

    let (vdb, connectors) = merge_definitions(&state.base, &state.connectors, &children)?;
    let merged_store = merge_stores(store, &children)?;
    let visibility = merge_visibility(&state.visibility, &children);
    let udf = merge_functions(
        state.udf.as_ref(),
        store,
        &state.connectors,
        &children,
        system_functions.scope(),
    )?;
    let metadata = assemble_metadata(
        &vdb,
        &merged_store,
        &visibility,
        &udf,
        &state.additional_stores,
        system_functions,
    )?;

    Ok(MergedView {
        vdb,
        connectors,
        store: merged_store,
        visibility,
        udf,
        metadata: Arc::new(metadata),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::InMemoryRepository;
    use crate::metadata::{Resource, Schema, Table};
    use crate::testing::{physical_model, system_functions};
    use crate::vdb::{Model, StaticConnectorManager};

    fn node(name: &str, model: &str) -> CompositeVdb {
        let base = VdbDefinition::new(name, 1).with_model(physical_model(model, "src")).unwrap();
        let store = SchemaStore::new()
            .with_schema(Schema::new(model).with_table(Table::physical("t")).unwrap())
            .unwrap();
        CompositeVdb::new(
            Arc::new(base),
            store,
            None,
            system_functions(),
            ConnectorRegistry::new(),
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn children_are_not_merged_before_load_finishes() {
        let parent = node("parent", "m1");
        let child = Arc::new(node("child", "m2"));
        parent.add_child(child).unwrap();
        assert_eq!(parent.merged_view().model_names(), vec!["m1"]);

        parent.mark_load_finished().unwrap();
        assert_eq!(parent.merged_view().model_names(), vec!["m1", "m2"]);
    }

    #[test]
    fn failed_add_is_rolled_back() {
        let parent = node("parent", "m1");
        parent.mark_load_finished().unwrap();
        let before = parent.merged_view();

        let conflicting = VdbDefinition::new("other", 1)
            .with_model(Model::virtual_model("m1"))
            .unwrap();
        let child = CompositeVdb::new(
            Arc::new(conflicting),
            SchemaStore::new(),
            None,
            system_functions(),
            ConnectorRegistry::new(),
            Vec::new(),
        )
        .unwrap();

        let err = parent.add_child(Arc::new(child)).unwrap_err();
        assert!(matches!(err, VdbError::Collision(_)));
        assert!(!parent.has_child(&VdbKey::new("other", 1)));
        assert!(Arc::ptr_eq(&before, &parent.merged_view()));
    }

    #[test]
    fn removing_unknown_child_does_not_rebuild() {
        let parent = node("parent", "m1");
        parent.mark_load_finished().unwrap();
        let before = parent.merged_view();
        parent.remove_child(&VdbKey::new("nobody", 3)).unwrap();
        assert!(Arc::ptr_eq(&before, &parent.merged_view()));
    }

    #[test]
    fn provider_failure_leaves_node_unfinished() {
        let repository = Arc::new(InMemoryRepository::new());
        repository.fail_on("table_stats");
        let base = VdbDefinition::new("v", 1)
            .with_model(physical_model("m1", "src").with_provider(repository.clone()))
            .unwrap();
        let store = SchemaStore::new()
            .with_schema(Schema::new("m1").with_table(Table::physical("t")).unwrap())
            .unwrap();
        let vdb = CompositeVdb::new(
            Arc::new(base),
            store,
            None,
            system_functions(),
            ConnectorRegistry::new(),
            Vec::new(),
        )
        .unwrap();

        assert!(matches!(vdb.mark_load_finished(), Err(VdbError::Provider { .. })));
        assert!(!vdb.is_load_finished());

        repository.clear_failures();
        vdb.mark_load_finished().unwrap();
        assert!(vdb.is_load_finished());
    }

    #[test]
    fn connector_functions_land_in_system_scope() {
        let base = VdbDefinition::new("v", 1).with_model(physical_model("m1", "src")).unwrap();
        let connectors = ConnectorRegistry::new().with_manager(Arc::new(
            StaticConnectorManager::new("src", "oracle").with_function(crate::metadata::FunctionMethod::new(
                "trunc",
                vec!["date".into()],
                "date",
            )),
        ));
        let vdb = CompositeVdb::new(
            Arc::new(base),
            SchemaStore::new().with_resources({
                let mut map = VisibilityMap::new();
                map.insert(Resource::new("/m1.ddl", true));
                map
            }),
            None,
            system_functions(),
            connectors,
            Vec::new(),
        )
        .unwrap();

        let view = vdb.merged_view();
        assert_eq!(view.metadata().resolve_functions("m1", "trunc").len(), 1);
        assert!(view.metadata().is_resource_visible("/m1.ddl"));
    }
}
