//! Enrichment of loaded metadata by an external metadata repository.
//!
//! After a VDB's structural metadata is loaded, a repository may layer
//! statistics, view and trigger definitions, procedure plans and property
//! bags onto it. Every lookup may legitimately come back empty; only a
//! genuine provider failure is an error.

pub mod memory;
pub mod pass;

pub use memory::InMemoryRepository;
pub use pass::{enrich_schema, EnrichmentSummary};

use crate::metadata::{
    Column, ColumnStats, Key, MetadataRecord, Procedure, ProcedureParameter, PropertyBag, RecordMeta, Schema, Table,
    TableStats, TriggerEvent,
};

/// Failure reported by a metadata repository.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Repository error: {0}")]
    Other(String),
}

/// A structural record handed to the repository for a property lookup.
#[derive(Debug, Clone, Copy)]
pub enum RecordRef<'a> {
    Schema(&'a Schema),
    Table(&'a Table),
    Column(&'a Column),
    Key(&'a Key),
    Procedure(&'a Procedure),
    Parameter(&'a ProcedureParameter),
}

impl RecordRef<'_> {
    pub fn meta(&self) -> &RecordMeta {
        match self {
            RecordRef::Schema(r) => r.meta(),
            RecordRef::Table(r) => r.meta(),
            RecordRef::Column(r) => r.meta(),
            RecordRef::Key(r) => r.meta(),
            RecordRef::Procedure(r) => r.meta(),
            RecordRef::Parameter(r) => r.meta(),
        }
    }
}

/// Source of a model's metadata.
///
/// Repositories that can also enrich already-loaded metadata expose that
/// capability through [`MetadataRepository::as_enricher`].
pub trait MetadataRepository: Send + Sync {
    fn as_enricher(&self) -> Option<&dyn MetadataEnricher> {
        None
    }
}

/// Supplies overrides for loaded metadata records.
///
/// Every lookup defaults to "no override" so implementations only provide
/// what they store.
pub trait MetadataEnricher: Send + Sync {
    fn start_load_vdb(&self, _vdb_name: &str, _vdb_version: u32) -> Result<(), ProviderError> {
        Ok(())
    }

    fn end_load_vdb(&self, _vdb_name: &str, _vdb_version: u32) -> Result<(), ProviderError> {
        Ok(())
    }

    fn table_stats(&self, _vdb_name: &str, _vdb_version: u32, _table: &Table) -> Result<Option<TableStats>, ProviderError> {
        Ok(None)
    }

    fn column_stats(&self, _vdb_name: &str, _vdb_version: u32, _column: &Column) -> Result<Option<ColumnStats>, ProviderError> {
        Ok(None)
    }

    fn view_definition(&self, _vdb_name: &str, _vdb_version: u32, _table: &Table) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }

    fn instead_of_trigger_definition(
        &self,
        _vdb_name: &str,
        _vdb_version: u32,
        _table: &Table,
        _event: TriggerEvent,
    ) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }

    fn instead_of_trigger_enabled(
        &self,
        _vdb_name: &str,
        _vdb_version: u32,
        _table: &Table,
        _event: TriggerEvent,
    ) -> Result<Option<bool>, ProviderError> {
        Ok(None)
    }

    fn procedure_definition(
        &self,
        _vdb_name: &str,
        _vdb_version: u32,
        _procedure: &Procedure,
    ) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }

    fn properties(
        &self,
        _vdb_name: &str,
        _vdb_version: u32,
        _record: RecordRef<'_>,
    ) -> Result<Option<PropertyBag>, ProviderError> {
        Ok(None)
    }
}
