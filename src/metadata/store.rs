use super::record::canonical_key;
use super::resource::VisibilityMap;
use super::schema::Schema;
use crate::error::VdbResult;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Registry of named schemas loaded for one VDB.
///
/// Schemas are shared by `Arc`, so cloning a store or merging it into
/// another is cheap and never copies records. A store produced by the index
/// loader may also carry the VDB's resource entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoreDocument", into = "StoreDocument")]
pub struct SchemaStore {
    schemas: IndexMap<String, Arc<Schema>>,
    resources: Option<VisibilityMap>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(mut self, resources: VisibilityMap) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Adds a schema; a same-named schema already present is deep-merged.
    pub fn add_schema(&mut self, schema: Schema) -> VdbResult<()> {
        self.merge_schema(Arc::new(schema))
    }

    pub fn with_schema(mut self, schema: Schema) -> VdbResult<Self> {
        self.add_schema(schema)?;
        Ok(self)
    }

    pub fn schema(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(&canonical_key(name))
    }

    /// Mutable access to a schema, detaching it from other holders first.
    pub fn schema_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.schemas.get_mut(&canonical_key(name)).map(Arc::make_mut)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.schemas.values()
    }

    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.values().map(|s| s.name())
    }

    pub fn resources(&self) -> Option<&VisibilityMap> {
        self.resources.as_ref()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Merges every schema of `other` into this store.
    ///
    /// Schemas not yet present are adopted by reference; same-named schemas
    /// are merged at the table, procedure and function level, and a
    /// conflicting same-kind record is reported as a collision. Merging the
    /// same source twice is not supported. On error this store may be
    /// partially merged and should be discarded.
    pub fn merge(&mut self, other: &SchemaStore) -> VdbResult<()> {
        for schema in other.schemas.values() {
            self.merge_schema(Arc::clone(schema))?;
        }
        Ok(())
    }

    fn merge_schema(&mut self, schema: Arc<Schema>) -> VdbResult<()> {
        let key = canonical_key(schema.name());
        match self.schemas.get_mut(&key) {
            None => {
                self.schemas.insert(key, schema);
            }
            Some(existing) if Arc::ptr_eq(existing, &schema) => {
                debug!("Schema '{}' already shared by this store", schema.name());
            }
            Some(existing) => {
                debug!("Deep-merging schema '{}'", schema.name());
                Arc::make_mut(existing).merge_from(&schema)?;
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> VdbResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> VdbResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Serialized form of a store as produced by the metadata loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub schemas: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<VisibilityMap>,
}

impl TryFrom<StoreDocument> for SchemaStore {
    type Error = crate::error::VdbError;

    fn try_from(doc: StoreDocument) -> Result<Self, Self::Error> {
        let mut store = SchemaStore::new();
        for schema in doc.schemas {
            store.add_schema(schema)?;
        }
        store.resources = doc.resources;
        Ok(store)
    }
}

impl From<SchemaStore> for StoreDocument {
    fn from(store: SchemaStore) -> Self {
        StoreDocument {
            schemas: store.schemas.into_values().map(Arc::unwrap_or_clone).collect(),
            resources: store.resources,
        }
    }
}
