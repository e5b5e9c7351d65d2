use crate::facade::UnifiedMetadata;
use crate::function::FunctionRegistry;
use crate::metadata::{SchemaStore, VisibilityMap};
use crate::vdb::{ConnectorRegistry, VdbDefinition};
use std::sync::Arc;

/// A published, immutable snapshot of a node's composed metadata.
///
/// Parents merge the snapshots of their children, so everything a parent
/// needs is kept here: the definition with all imported models and data
/// policies, the connector registry, the merged store, visibility map and
/// function registry, and the facade built from them.
#[derive(Debug, Clone)]
pub struct MergedView {
    pub(crate) vdb: Arc<VdbDefinition>,
    pub(crate) connectors: Arc<ConnectorRegistry>,
    pub(crate) store: Arc<SchemaStore>,
    pub(crate) visibility: Arc<VisibilityMap>,
    pub(crate) udf: Arc<FunctionRegistry>,
    pub(crate) metadata: Arc<UnifiedMetadata>,
}

impl MergedView {
    pub fn vdb(&self) -> &Arc<VdbDefinition> {
        &self.vdb
    }

    pub fn connectors(&self) -> &Arc<ConnectorRegistry> {
        &self.connectors
    }

    pub fn store(&self) -> &Arc<SchemaStore> {
        &self.store
    }

    pub fn visibility(&self) -> &Arc<VisibilityMap> {
        &self.visibility
    }

    pub fn udf(&self) -> &Arc<FunctionRegistry> {
        &self.udf
    }

    pub fn metadata(&self) -> &Arc<UnifiedMetadata> {
        &self.metadata
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.vdb.model_names()
    }
}
