use super::store::SchemaStore;
use crate::error::VdbResult;
use log::info;
use std::fs;
use std::path::Path;

/// Loads a schema store from a JSON document.
///
/// The document lists schemas with their tables, procedures and functions,
/// plus optional resource entries:
///
/// ```json
/// {
///   "schemas": [{ "name": "pm1", "tables": [{ "name": "g1" }] }],
///   "resources": [{ "path": "/pm1.ddl", "visible": true }]
/// }
/// ```
///
/// # Errors
///
/// Returns an error if:
/// * The file cannot be read
/// * The file content is not valid JSON
/// * A schema defines the same record twice
pub fn load_store_from_file<P: AsRef<Path>>(path: P) -> VdbResult<SchemaStore> {
    let content = fs::read_to_string(path.as_ref())?;
    let store = SchemaStore::from_json(&content)?;
    info!(
        "Loaded {} schema(s) from {}",
        store.len(),
        path.as_ref().display()
    );
    Ok(store)
}

/// Writes a schema store as pretty-printed JSON, creating parent directories.
pub fn save_store_to_file<P: AsRef<Path>>(store: &SchemaStore, path: P) -> VdbResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path.as_ref(), store.to_json_pretty()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VdbError;
    use crate::metadata::schema::Schema;
    use crate::metadata::table::Table;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stores").join("vdb1.json");
        let store = SchemaStore::new()
            .with_schema(Schema::new("pm1").with_table(Table::physical("g1")).unwrap())
            .unwrap();

        save_store_to_file(&store, &path).unwrap();
        let loaded = load_store_from_file(&path).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_store_from_file(dir.path().join("absent.json"));
        assert!(matches!(result, Err(VdbError::Io(_))));
    }
}
