//! Read-only metadata view consumed by query-time lookup.

use crate::function::FunctionTree;
use crate::metadata::{CompositeStore, FunctionMethod, Procedure, Resource, Schema, Table, VisibilityMap};
use crate::vdb::VdbDefinition;
use indexmap::IndexMap;
use std::sync::Arc;

/// The composed metadata of a VDB and everything it imports.
///
/// Built once per rebuild and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct UnifiedMetadata {
    vdb: Arc<VdbDefinition>,
    store: CompositeStore,
    visibility: Arc<VisibilityMap>,
    system_functions: Arc<FunctionTree>,
    function_trees: IndexMap<String, Arc<FunctionTree>>,
}

impl UnifiedMetadata {
    pub fn new(
        vdb: Arc<VdbDefinition>,
        store: CompositeStore,
        visibility: Arc<VisibilityMap>,
        system_functions: Arc<FunctionTree>,
        function_trees: Vec<FunctionTree>,
    ) -> Self {
        let function_trees = function_trees
            .into_iter()
            .map(|tree| (tree.scope().to_lowercase(), Arc::new(tree)))
            .collect();
        Self {
            vdb,
            store,
            visibility,
            system_functions,
            function_trees,
        }
    }

    pub fn vdb(&self) -> &Arc<VdbDefinition> {
        &self.vdb
    }

    pub fn store(&self) -> &CompositeStore {
        &self.store
    }

    pub fn schema(&self, name: &str) -> Option<&Arc<Schema>> {
        self.store.schema(name)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.store.schemas()
    }

    pub fn table(&self, qualified_name: &str) -> Option<&Arc<Table>> {
        self.store.table(qualified_name)
    }

    pub fn procedure(&self, qualified_name: &str) -> Option<&Arc<Procedure>> {
        self.store.procedure(qualified_name)
    }

    pub fn visibility(&self) -> &Arc<VisibilityMap> {
        &self.visibility
    }

    pub fn resource(&self, path: &str) -> Option<&Resource> {
        self.visibility.get(path)
    }

    /// Unknown paths are not visible.
    pub fn is_resource_visible(&self, path: &str) -> bool {
        self.visibility.get(path).is_some_and(|r| r.visible)
    }

    pub fn system_functions(&self) -> &Arc<FunctionTree> {
        &self.system_functions
    }

    /// The lookup tree of a user-defined function scope, if it has functions.
    pub fn function_tree(&self, scope: &str) -> Option<&Arc<FunctionTree>> {
        self.function_trees.get(&scope.to_lowercase())
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.function_trees.values().map(|t| t.scope())
    }

    /// Functions named `name` visible from `scope`.
    ///
    /// The scope's own functions come first, then the global ones: functions
    /// registered under the system scope, then built-in system functions.
    pub fn resolve_functions(&self, scope: &str, name: &str) -> Vec<Arc<FunctionMethod>> {
        let system_scope = self.system_functions.scope();
        let mut found: Vec<Arc<FunctionMethod>> = Vec::new();
        if !scope.eq_ignore_ascii_case(system_scope) {
            if let Some(tree) = self.function_tree(scope) {
                found.extend(tree.find(name).iter().cloned());
            }
        }
        if let Some(tree) = self.function_tree(system_scope) {
            found.extend(tree.find(name).iter().cloned());
        }
        found.extend(self.system_functions.find(name).iter().cloned());
        found
    }
}
