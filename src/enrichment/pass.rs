use super::{MetadataEnricher, ProviderError, RecordRef};
use crate::metadata::{Procedure, Schema, Table, TriggerEvent};
use log::debug;
use std::sync::Arc;

/// What an enrichment pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub records_visited: usize,
    pub stats_applied: usize,
    pub definitions_applied: usize,
    pub property_bags_applied: usize,
}

/// Applies a repository's overrides to one model's schema.
///
/// Physical tables receive statistics; views receive their select
/// transformation and, when updatable, instead-of trigger definitions and
/// enabled flags; virtual non-function procedures receive their plan; every
/// record may receive a new property bag, which replaces the old one. An
/// empty lookup leaves the record as it was.
///
/// Changed tables and procedures are replaced by fresh copies, so anyone
/// sharing the previous records keeps seeing them unchanged. On a provider
/// error the pass stops without calling `end_load_vdb` and `schema` may hold
/// a subset of the overrides; callers should discard it.
pub fn enrich_schema(
    enricher: &dyn MetadataEnricher,
    vdb_name: &str,
    vdb_version: u32,
    schema: &mut Schema,
) -> Result<EnrichmentSummary, ProviderError> {
    let mut summary = EnrichmentSummary::default();
    enricher.start_load_vdb(vdb_name, vdb_version)?;

    for table in schema.tables_mut() {
        let mut updated = (**table).clone();
        if enrich_table(enricher, vdb_name, vdb_version, &mut updated, &mut summary)? {
            *table = Arc::new(updated);
        }
    }

    for procedure in schema.procedures_mut() {
        if !procedure.is_virtual || procedure.is_function {
            continue;
        }
        if let Some(plan) = enricher.procedure_definition(vdb_name, vdb_version, procedure)? {
            Arc::make_mut(procedure).query_plan = Some(plan);
            summary.definitions_applied += 1;
        }
    }

    apply_properties(enricher, vdb_name, vdb_version, schema, &mut summary)?;

    enricher.end_load_vdb(vdb_name, vdb_version)?;
    debug!(
        "Enriched schema '{}' of {}.{}: {:?}",
        schema.name(),
        vdb_name,
        vdb_version,
        summary
    );
    Ok(summary)
}

fn enrich_table(
    enricher: &dyn MetadataEnricher,
    vdb_name: &str,
    vdb_version: u32,
    table: &mut Table,
    summary: &mut EnrichmentSummary,
) -> Result<bool, ProviderError> {
    let mut changed = false;

    if table.physical {
        if let Some(stats) = enricher.table_stats(vdb_name, vdb_version, table)? {
            table.stats = Some(stats);
            summary.stats_applied += 1;
            changed = true;
        }
        for index in 0..table.columns.len() {
            if let Some(stats) = enricher.column_stats(vdb_name, vdb_version, &table.columns[index])? {
                table.columns[index].stats = Some(stats);
                summary.stats_applied += 1;
                changed = true;
            }
        }
        return Ok(changed);
    }

    if let Some(definition) = enricher.view_definition(vdb_name, vdb_version, table)? {
        table.select_transformation = Some(definition);
        summary.definitions_applied += 1;
        changed = true;
    }
    if table.supports_update {
        for event in TriggerEvent::ALL {
            if let Some(definition) = enricher.instead_of_trigger_definition(vdb_name, vdb_version, table, event)? {
                table.trigger_mut(event).definition = Some(definition);
                summary.definitions_applied += 1;
                changed = true;
            }
            if let Some(enabled) = enricher.instead_of_trigger_enabled(vdb_name, vdb_version, table, event)? {
                table.trigger_mut(event).enabled = enabled;
                changed = true;
            }
        }
    }
    Ok(changed)
}

/// Visits the schema, then each table with its columns and keys, then each
/// procedure with its parameters and result columns.
fn apply_properties(
    enricher: &dyn MetadataEnricher,
    vdb_name: &str,
    vdb_version: u32,
    schema: &mut Schema,
    summary: &mut EnrichmentSummary,
) -> Result<(), ProviderError> {
    summary.records_visited += 1;
    if let Some(bag) = enricher.properties(vdb_name, vdb_version, RecordRef::Schema(schema))? {
        schema.meta.set_properties(bag);
        summary.property_bags_applied += 1;
    }

    for table in schema.tables_mut() {
        let mut updated = (**table).clone();
        let mut applied = 0;
        summary.records_visited += 1 + updated.columns.len() + updated.keys.len();

        if let Some(bag) = enricher.properties(vdb_name, vdb_version, RecordRef::Table(&updated))? {
            updated.meta.set_properties(bag);
            applied += 1;
        }
        for index in 0..updated.columns.len() {
            if let Some(bag) = enricher.properties(vdb_name, vdb_version, RecordRef::Column(&updated.columns[index]))? {
                updated.columns[index].meta.set_properties(bag);
                applied += 1;
            }
        }
        for index in 0..updated.keys.len() {
            if let Some(bag) = enricher.properties(vdb_name, vdb_version, RecordRef::Key(&updated.keys[index]))? {
                updated.keys[index].meta.set_properties(bag);
                applied += 1;
            }
        }
        if applied > 0 {
            *table = Arc::new(updated);
            summary.property_bags_applied += applied;
        }
    }

    for procedure in schema.procedures_mut() {
        let mut updated: Procedure = (**procedure).clone();
        let mut applied = 0;
        let result_columns = updated.result_set.as_ref().map_or(0, |rs| rs.columns.len());
        summary.records_visited += 1 + updated.parameters.len() + result_columns;

        if let Some(bag) = enricher.properties(vdb_name, vdb_version, RecordRef::Procedure(&updated))? {
            updated.meta.set_properties(bag);
            applied += 1;
        }
        for index in 0..updated.parameters.len() {
            if let Some(bag) = enricher.properties(vdb_name, vdb_version, RecordRef::Parameter(&updated.parameters[index]))? {
                updated.parameters[index].meta.set_properties(bag);
                applied += 1;
            }
        }
        if let Some(result_set) = updated.result_set.as_mut() {
            for column in result_set.columns.iter_mut() {
                if let Some(bag) = enricher.properties(vdb_name, vdb_version, RecordRef::Column(column))? {
                    column.meta.set_properties(bag);
                    applied += 1;
                }
            }
        }
        if applied > 0 {
            *procedure = Arc::new(updated);
            summary.property_bags_applied += applied;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::InMemoryRepository;
    use crate::metadata::{Column, PropertyBag, TableStats};

    #[test]
    fn physical_table_gets_stats_and_view_keeps_plan_when_absent() {
        let stats_table = Table::physical("g1").with_column(Column::new("e1", "string"));
        let view = Table::view("v1", "select * from g1");
        let mut schema = Schema::new("pm1")
            .with_table(stats_table.clone())
            .unwrap()
            .with_table(view)
            .unwrap();

        let repo = InMemoryRepository::new();
        repo.set_table_stats(&stats_table.meta.uuid, TableStats { cardinality: Some(42) });

        let before = Arc::clone(schema.table("v1").unwrap());
        let summary = enrich_schema(&repo, "vdb", 1, &mut schema).unwrap();

        assert_eq!(summary.stats_applied, 1);
        assert_eq!(schema.table("g1").unwrap().stats.as_ref().unwrap().cardinality, Some(42));
        // untouched records are not copied
        assert!(Arc::ptr_eq(&before, schema.table("v1").unwrap()));
        assert_eq!(repo.call_count("end_load_vdb"), 1);
    }

    #[test]
    fn result_set_columns_receive_properties() {
        let procedure = Procedure::virtual_procedure("p1", "begin select 1; end")
            .with_result_column(Column::new("x", "integer"));
        let column_uuid = procedure.result_set.as_ref().unwrap().columns[0].meta.uuid.clone();
        let mut schema = Schema::new("vm1").with_procedure(procedure).unwrap();

        let repo = InMemoryRepository::new();
        let mut bag = PropertyBag::new();
        bag.insert("native_type".into(), "int4".into());
        repo.set_properties(&column_uuid, bag);

        let summary = enrich_schema(&repo, "vdb", 1, &mut schema).unwrap();
        assert_eq!(summary.property_bags_applied, 1);
        let column = &schema.procedure("p1").unwrap().result_set.as_ref().unwrap().columns[0];
        assert_eq!(column.meta.property("native_type"), Some("int4"));
    }

    #[test]
    fn failure_skips_end_load() {
        let mut schema = Schema::new("pm1").with_table(Table::physical("g1")).unwrap();
        let repo = InMemoryRepository::new();
        repo.fail_on("table_stats");

        assert!(enrich_schema(&repo, "vdb", 1, &mut schema).is_err());
        assert_eq!(repo.call_count("start_load_vdb"), 1);
        assert_eq!(repo.call_count("end_load_vdb"), 0);
    }
}
