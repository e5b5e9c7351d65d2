//! The individual merge steps of a rebuild.
//!
//! Each step reads this node's own parts and the published snapshots of its
//! children and produces fresh instances; nothing passed in is modified.

use super::view::MergedView;
use crate::error::VdbResult;
use crate::facade::UnifiedMetadata;
use crate::function::{FunctionRegistry, FunctionTree};
use crate::metadata::{CompositeStore, SchemaStore, VisibilityMap};
use crate::vdb::{ConnectorRegistry, VdbDefinition};
use std::sync::Arc;

/// Unions models, data policies and connectors: own first, then each child
/// in order. The first connector registered under a source name wins.
pub(crate) fn merge_definitions(
    base: &Arc<VdbDefinition>,
    connectors: &Arc<ConnectorRegistry>,
    children: &[Arc<MergedView>],
) -> VdbResult<(Arc<VdbDefinition>, Arc<ConnectorRegistry>)> {
    if children.is_empty() {
        return Ok((Arc::clone(base), Arc::clone(connectors)));
    }

    let mut merged = base.shell();
    for model in base.models() {
        merged.add_model(Arc::clone(model))?;
    }
    for policy in base.data_policies() {
        merged.add_data_policy(Arc::clone(policy))?;
    }

    let mut merged_connectors = ConnectorRegistry::new();
    merged_connectors.extend_missing(connectors);

    for child in children {
        for model in child.vdb.models() {
            merged.add_model(Arc::clone(model))?;
        }
        for policy in child.vdb.data_policies() {
            merged.add_data_policy(Arc::clone(policy))?;
        }
        merged_connectors.extend_missing(&child.connectors);
    }
    Ok((Arc::new(merged), Arc::new(merged_connectors)))
}

/// Own store merged with every child's published store.
pub(crate) fn merge_stores(store: &Arc<SchemaStore>, children: &[Arc<MergedView>]) -> VdbResult<Arc<SchemaStore>> {
    if children.is_empty() {
        return Ok(Arc::clone(store));
    }
    let mut merged = SchemaStore::new();
    merged.merge(store)?;
    for child in children {
        merged.merge(&child.store)?;
    }
    Ok(Arc::new(merged))
}

/// Own entries then each child's; a later entry replaces an earlier one at
/// the same path.
pub(crate) fn merge_visibility(visibility: &Arc<VisibilityMap>, children: &[Arc<MergedView>]) -> Arc<VisibilityMap> {
    if children.is_empty() {
        return Arc::clone(visibility);
    }
    let mut merged = VisibilityMap::clone(visibility);
    for child in children {
        merged.extend_from(&child.visibility);
    }
    Arc::new(merged)
}

/// Own functions, own schema functions scoped by schema, connector push-down
/// functions under the system scope, then each child's merged functions.
///
/// In the system scope the first registered signature wins, matching the
/// connector union: a child's push-down function shadowed by one already
/// present is dropped rather than reported as a collision.
pub(crate) fn merge_functions(
    udf: Option<&Arc<FunctionRegistry>>,
    store: &SchemaStore,
    connectors: &ConnectorRegistry,
    children: &[Arc<MergedView>],
    system_scope: &str,
) -> VdbResult<Arc<FunctionRegistry>> {
    let mut merged = FunctionRegistry::new();
    if let Some(udf) = udf {
        merged.add_registry(udf)?;
    }
    for schema in store.schemas() {
        merged.add_functions(schema.name(), schema.functions().cloned())?;
    }
    for manager in connectors.managers() {
        merged.add_functions(system_scope, manager.push_down_functions().into_iter().map(Arc::new))?;
    }
    for child in children {
        merged.add_registry_shadowing(&child.udf, system_scope)?;
    }
    Ok(Arc::new(merged))
}

/// Builds the facade over the merged parts.
///
/// Additional stores join the composite store after the merged one and
/// contribute their schema functions to the facade's lookup trees only.
pub(crate) fn assemble_metadata(
    vdb: &Arc<VdbDefinition>,
    store: &Arc<SchemaStore>,
    visibility: &Arc<VisibilityMap>,
    udf: &FunctionRegistry,
    additional_stores: &[Arc<SchemaStore>],
    system_functions: &Arc<FunctionTree>,
) -> VdbResult<UnifiedMetadata> {
    let mut composite = CompositeStore::new(Arc::clone(store));
    for additional in additional_stores {
        composite.add_member(Arc::clone(additional));
    }

    let trees = if additional_stores.is_empty() {
        udf.build_trees()
    } else {
        let mut facade_udf = udf.clone();
        for schema in additional_stores
            .iter()
            .flat_map(|s| s.schemas())
            .filter(|s| s.has_functions())
        {
            facade_udf.add_functions(schema.name(), schema.functions().cloned())?;
        }
        facade_udf.build_trees()
    };
    Ok(UnifiedMetadata::new(
        Arc::clone(vdb),
        composite,
        Arc::clone(visibility),
        Arc::clone(system_functions),
        trees,
    ))
}
