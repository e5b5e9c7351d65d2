use super::procedure::Procedure;
use super::schema::Schema;
use super::store::SchemaStore;
use super::table::Table;
use std::sync::Arc;

/// Read-only view over several member stores.
///
/// Lookups consult the members in order and the first match wins; iteration
/// walks the members lazily without building a combined map.
#[derive(Debug, Clone, Default)]
pub struct CompositeStore {
    members: Vec<Arc<SchemaStore>>,
}

impl CompositeStore {
    pub fn new(primary: Arc<SchemaStore>) -> Self {
        Self { members: vec![primary] }
    }

    pub fn add_member(&mut self, store: Arc<SchemaStore>) {
        self.members.push(store);
    }

    pub fn members(&self) -> &[Arc<SchemaStore>] {
        &self.members
    }

    pub fn schema(&self, name: &str) -> Option<&Arc<Schema>> {
        self.members.iter().find_map(|store| store.schema(name))
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.members.iter().flat_map(|store| store.schemas())
    }

    /// Resolves a `schema.table` name.
    pub fn table(&self, qualified_name: &str) -> Option<&Arc<Table>> {
        let (schema, table) = split_qualified(qualified_name)?;
        self.members
            .iter()
            .filter_map(|store| store.schema(schema))
            .find_map(|s| s.table(table))
    }

    /// Resolves a `schema.procedure` name.
    pub fn procedure(&self, qualified_name: &str) -> Option<&Arc<Procedure>> {
        let (schema, procedure) = split_qualified(qualified_name)?;
        self.members
            .iter()
            .filter_map(|store| store.schema(schema))
            .find_map(|s| s.procedure(procedure))
    }
}

/// Splits on the first dot; record names may themselves contain dots.
fn split_qualified(name: &str) -> Option<(&str, &str)> {
    name.split_once('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(schema: &str, table: &str) -> Arc<SchemaStore> {
        Arc::new(
            SchemaStore::new()
                .with_schema(Schema::new(schema).with_table(Table::physical(table)).unwrap())
                .unwrap(),
        )
    }

    #[test]
    fn lookups_fall_through_members() {
        let mut composite = CompositeStore::new(member("pm1", "g1"));
        composite.add_member(member("sys", "tables"));

        assert!(composite.table("pm1.g1").is_some());
        assert!(composite.table("SYS.Tables").is_some());
        assert!(composite.table("pm1.missing").is_none());
        assert!(composite.table("unqualified").is_none());
        assert_eq!(composite.schemas().count(), 2);
    }

    #[test]
    fn first_member_wins() {
        let mut composite = CompositeStore::new(member("pm1", "g1"));
        composite.add_member(member("pm1", "g2"));
        assert_eq!(composite.schema("pm1").unwrap().tables().count(), 1);
        // shadowed member schemas are still reachable for qualified lookups
        assert!(composite.table("pm1.g2").is_some());
    }
}
