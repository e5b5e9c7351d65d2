use super::{MetadataEnricher, MetadataRepository, ProviderError, RecordRef};
use crate::metadata::{Column, ColumnStats, Procedure, PropertyBag, Table, TableStats, TriggerEvent};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct Overrides {
    table_stats: HashMap<String, TableStats>,
    column_stats: HashMap<String, ColumnStats>,
    view_definitions: HashMap<String, String>,
    trigger_definitions: HashMap<(String, TriggerEvent), String>,
    trigger_enabled: HashMap<(String, TriggerEvent), bool>,
    procedure_definitions: HashMap<String, String>,
    properties: HashMap<String, PropertyBag>,
}

/// Metadata repository holding overrides in memory, keyed by record uuid.
///
/// Every call is journaled by operation name, and individual operations can
/// be made to fail, which makes the repository usable as a test double as
/// well as a store for runtime overrides.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    overrides: RwLock<Overrides>,
    journal: Mutex<Vec<String>>,
    failing: RwLock<HashSet<String>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_table_stats(&self, uuid: &str, stats: TableStats) {
        self.overrides.write().table_stats.insert(uuid.to_string(), stats);
    }

    pub fn set_column_stats(&self, uuid: &str, stats: ColumnStats) {
        self.overrides.write().column_stats.insert(uuid.to_string(), stats);
    }

    pub fn set_view_definition(&self, uuid: &str, definition: impl Into<String>) {
        self.overrides
            .write()
            .view_definitions
            .insert(uuid.to_string(), definition.into());
    }

    pub fn set_trigger_definition(&self, uuid: &str, event: TriggerEvent, definition: impl Into<String>) {
        self.overrides
            .write()
            .trigger_definitions
            .insert((uuid.to_string(), event), definition.into());
    }

    pub fn set_trigger_enabled(&self, uuid: &str, event: TriggerEvent, enabled: bool) {
        self.overrides
            .write()
            .trigger_enabled
            .insert((uuid.to_string(), event), enabled);
    }

    pub fn set_procedure_definition(&self, uuid: &str, definition: impl Into<String>) {
        self.overrides
            .write()
            .procedure_definitions
            .insert(uuid.to_string(), definition.into());
    }

    pub fn set_properties(&self, uuid: &str, properties: PropertyBag) {
        self.overrides.write().properties.insert(uuid.to_string(), properties);
    }

    /// Makes every later call of `operation` fail.
    pub fn fail_on(&self, operation: &str) {
        self.failing.write().insert(operation.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.write().clear();
    }

    /// Operation names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.journal.lock().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.journal.lock().iter().filter(|c| *c == operation).count()
    }

    fn record_call(&self, operation: &str) -> Result<(), ProviderError> {
        self.journal.lock().push(operation.to_string());
        if self.failing.read().contains(operation) {
            return Err(ProviderError::Unavailable(format!("{} failed", operation)));
        }
        Ok(())
    }
}

impl MetadataRepository for InMemoryRepository {
    fn as_enricher(&self) -> Option<&dyn MetadataEnricher> {
        Some(self)
    }
}

impl MetadataEnricher for InMemoryRepository {
    fn start_load_vdb(&self, _vdb_name: &str, _vdb_version: u32) -> Result<(), ProviderError> {
        self.record_call("start_load_vdb")
    }

    fn end_load_vdb(&self, _vdb_name: &str, _vdb_version: u32) -> Result<(), ProviderError> {
        self.record_call("end_load_vdb")
    }

    fn table_stats(&self, _vdb_name: &str, _vdb_version: u32, table: &Table) -> Result<Option<TableStats>, ProviderError> {
        self.record_call("table_stats")?;
        Ok(self.overrides.read().table_stats.get(&table.meta.uuid).cloned())
    }

    fn column_stats(&self, _vdb_name: &str, _vdb_version: u32, column: &Column) -> Result<Option<ColumnStats>, ProviderError> {
        self.record_call("column_stats")?;
        Ok(self.overrides.read().column_stats.get(&column.meta.uuid).cloned())
    }

    fn view_definition(&self, _vdb_name: &str, _vdb_version: u32, table: &Table) -> Result<Option<String>, ProviderError> {
        self.record_call("view_definition")?;
        Ok(self.overrides.read().view_definitions.get(&table.meta.uuid).cloned())
    }

    fn instead_of_trigger_definition(
        &self,
        _vdb_name: &str,
        _vdb_version: u32,
        table: &Table,
        event: TriggerEvent,
    ) -> Result<Option<String>, ProviderError> {
        self.record_call("instead_of_trigger_definition")?;
        Ok(self
            .overrides
            .read()
            .trigger_definitions
            .get(&(table.meta.uuid.clone(), event))
            .cloned())
    }

    fn instead_of_trigger_enabled(
        &self,
        _vdb_name: &str,
        _vdb_version: u32,
        table: &Table,
        event: TriggerEvent,
    ) -> Result<Option<bool>, ProviderError> {
        self.record_call("instead_of_trigger_enabled")?;
        Ok(self
            .overrides
            .read()
            .trigger_enabled
            .get(&(table.meta.uuid.clone(), event))
            .copied())
    }

    fn procedure_definition(
        &self,
        _vdb_name: &str,
        _vdb_version: u32,
        procedure: &Procedure,
    ) -> Result<Option<String>, ProviderError> {
        self.record_call("procedure_definition")?;
        Ok(self
            .overrides
            .read()
            .procedure_definitions
            .get(&procedure.meta.uuid)
            .cloned())
    }

    fn properties(
        &self,
        _vdb_name: &str,
        _vdb_version: u32,
        record: RecordRef<'_>,
    ) -> Result<Option<PropertyBag>, ProviderError> {
        self.record_call("properties")?;
        Ok(self.overrides.read().properties.get(&record.meta().uuid).cloned())
    }
}
