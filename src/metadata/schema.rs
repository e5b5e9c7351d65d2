use super::function::FunctionMethod;
use super::procedure::Procedure;
use super::record::{canonical_key, MetadataRecord, RecordMeta};
use super::table::Table;
use crate::error::{CollisionError, RecordKind};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A namespace of tables, procedures and functions.
///
/// Records are held behind `Arc` so that stores can share them; mutation goes
/// through `Arc::make_mut`, leaving every other holder's copy untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDocument", into = "SchemaDocument")]
pub struct Schema {
    pub meta: RecordMeta,
    pub physical: bool,
    tables: IndexMap<String, Arc<Table>>,
    procedures: IndexMap<String, Arc<Procedure>>,
    functions: IndexMap<String, Arc<FunctionMethod>>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: RecordMeta::new(name),
            physical: true,
            tables: IndexMap::new(),
            procedures: IndexMap::new(),
            functions: IndexMap::new(),
        }
    }

    pub fn virtual_schema(name: impl Into<String>) -> Self {
        let mut schema = Self::new(name);
        schema.physical = false;
        schema
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Adds a table, rejecting a second table with the same name.
    pub fn add_table(&mut self, table: Table) -> Result<(), CollisionError> {
        let key = canonical_key(&table.meta.name);
        if self.tables.contains_key(&key) {
            return Err(CollisionError::new(self.name(), RecordKind::Table, &table.meta.name));
        }
        self.tables.insert(key, Arc::new(table));
        Ok(())
    }

    pub fn add_procedure(&mut self, procedure: Procedure) -> Result<(), CollisionError> {
        let key = canonical_key(&procedure.meta.name);
        if self.procedures.contains_key(&key) {
            return Err(CollisionError::new(self.name(), RecordKind::Procedure, &procedure.meta.name));
        }
        self.procedures.insert(key, Arc::new(procedure));
        Ok(())
    }

    /// Adds a function; overloads with different parameter types coexist.
    pub fn add_function(&mut self, function: FunctionMethod) -> Result<(), CollisionError> {
        let key = function.signature();
        if self.functions.contains_key(&key) {
            return Err(CollisionError::new(self.name(), RecordKind::Function, key));
        }
        self.functions.insert(key, Arc::new(function));
        Ok(())
    }

    pub fn with_table(mut self, table: Table) -> Result<Self, CollisionError> {
        self.add_table(table)?;
        Ok(self)
    }

    pub fn with_procedure(mut self, procedure: Procedure) -> Result<Self, CollisionError> {
        self.add_procedure(procedure)?;
        Ok(self)
    }

    pub fn with_function(mut self, function: FunctionMethod) -> Result<Self, CollisionError> {
        self.add_function(function)?;
        Ok(self)
    }

    pub fn table(&self, name: &str) -> Option<&Arc<Table>> {
        self.tables.get(&canonical_key(name))
    }

    pub fn procedure(&self, name: &str) -> Option<&Arc<Procedure>> {
        self.procedures.get(&canonical_key(name))
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<Table>> {
        self.tables.values()
    }

    pub fn procedures(&self) -> impl Iterator<Item = &Arc<Procedure>> {
        self.procedures.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Arc<FunctionMethod>> {
        self.functions.values()
    }

    pub fn has_functions(&self) -> bool {
        !self.functions.is_empty()
    }

    pub(crate) fn tables_mut(&mut self) -> impl Iterator<Item = &mut Arc<Table>> {
        self.tables.values_mut()
    }

    pub(crate) fn procedures_mut(&mut self) -> impl Iterator<Item = &mut Arc<Procedure>> {
        self.procedures.values_mut()
    }

    /// Folds another same-named schema's records into this one.
    ///
    /// A record that is the same shared object, or equal in content, is kept
    /// once. Two different records of the same kind under one name are a
    /// collision. On error this schema may be partially merged and should be
    /// discarded.
    pub fn merge_from(&mut self, other: &Schema) -> Result<(), CollisionError> {
        let scope = self.meta.name.clone();
        merge_records(&scope, RecordKind::Table, &mut self.tables, &other.tables, |a, b| a == b)?;
        merge_records(&scope, RecordKind::Procedure, &mut self.procedures, &other.procedures, |a, b| a == b)?;
        merge_records(&scope, RecordKind::Function, &mut self.functions, &other.functions, |a, b| {
            a.same_definition(b)
        })?;
        Ok(())
    }
}

fn merge_records<T: MetadataRecord>(
    scope: &str,
    kind: RecordKind,
    target: &mut IndexMap<String, Arc<T>>,
    source: &IndexMap<String, Arc<T>>,
    same: impl Fn(&T, &T) -> bool,
) -> Result<(), CollisionError> {
    for (key, record) in source {
        match target.get(key) {
            None => {
                target.insert(key.clone(), Arc::clone(record));
            }
            Some(existing) if Arc::ptr_eq(existing, record) || same(existing, record) => {
                debug!("Schema '{}': {} '{}' already present, keeping one copy", scope, kind, record.name());
            }
            Some(_) => return Err(CollisionError::new(scope, kind, record.name())),
        }
    }
    Ok(())
}

impl MetadataRecord for Schema {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

/// Serialized form of a schema: records as lists rather than keyed maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default = "default_physical")]
    pub physical: bool,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub procedures: Vec<Procedure>,
    #[serde(default)]
    pub functions: Vec<FunctionMethod>,
}

fn default_physical() -> bool {
    true
}

impl TryFrom<SchemaDocument> for Schema {
    type Error = CollisionError;

    fn try_from(doc: SchemaDocument) -> Result<Self, Self::Error> {
        let mut schema = Schema {
            meta: doc.meta,
            physical: doc.physical,
            tables: IndexMap::new(),
            procedures: IndexMap::new(),
            functions: IndexMap::new(),
        };
        for table in doc.tables {
            schema.add_table(table)?;
        }
        for procedure in doc.procedures {
            schema.add_procedure(procedure)?;
        }
        for function in doc.functions {
            schema.add_function(function)?;
        }
        Ok(schema)
    }
}

impl From<Schema> for SchemaDocument {
    fn from(schema: Schema) -> Self {
        SchemaDocument {
            meta: schema.meta,
            physical: schema.physical,
            tables: schema.tables.into_values().map(Arc::unwrap_or_clone).collect(),
            procedures: schema.procedures.into_values().map(Arc::unwrap_or_clone).collect(),
            functions: schema.functions.into_values().map(Arc::unwrap_or_clone).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::table::Column;

    fn schema_with(table: Table) -> Schema {
        Schema::new("pm1").with_table(table).unwrap()
    }

    #[test]
    fn table_lookup_is_case_insensitive() {
        let schema = schema_with(Table::physical("G1"));
        assert!(schema.table("g1").is_some());
        assert_eq!(schema.table("g1").unwrap().meta.name, "G1");
    }

    #[test]
    fn duplicate_table_name_is_rejected() {
        let mut schema = schema_with(Table::physical("g1"));
        let err = schema.add_table(Table::physical("G1")).unwrap_err();
        assert_eq!(err.kind, RecordKind::Table);
        assert_eq!(err.scope, "pm1");
    }

    #[test]
    fn merge_adopts_disjoint_records_by_reference() {
        let mut left = schema_with(Table::physical("g1"));
        let right = schema_with(Table::physical("g2"));
        left.merge_from(&right).unwrap();
        assert!(Arc::ptr_eq(left.table("g2").unwrap(), right.table("g2").unwrap()));
        assert_eq!(left.tables().count(), 2);
    }

    #[test]
    fn merge_keeps_shared_record_once() {
        let table = Table::physical("g1").with_column(Column::new("e1", "string"));
        let left = schema_with(table.clone());
        let mut merged = left.clone();
        merged.merge_from(&schema_with(table)).unwrap();
        assert_eq!(merged.tables().count(), 1);
    }

    #[test]
    fn merge_rejects_conflicting_records() {
        let mut left = schema_with(Table::physical("g1"));
        let right = schema_with(Table::physical("g1").with_column(Column::new("e1", "string")));
        let err = left.merge_from(&right).unwrap_err();
        assert_eq!(err.kind, RecordKind::Table);
        assert_eq!(err.name, "g1");
    }

    #[test]
    fn procedures_and_tables_do_not_collide() {
        let mut schema = schema_with(Table::physical("x"));
        assert!(schema.add_procedure(Procedure::physical("x")).is_ok());
    }

    #[test]
    fn document_round_trip_rejects_duplicates() {
        let json = r#"{"name":"pm1","tables":[{"name":"g1"},{"name":"G1"}]}"#;
        assert!(serde_json::from_str::<Schema>(json).is_err());
    }
}
