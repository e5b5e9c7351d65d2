use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Insertion-ordered extension properties attached to a metadata record.
pub type PropertyBag = IndexMap<String, String>;

/// Identity and property bag shared by every structural metadata record.
///
/// Records are compared by content, uuid included, so two copies of the same
/// loaded record are equal while two independently created records with the
/// same name are not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub name: String,
    #[serde(default = "new_uuid")]
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: PropertyBag,
}

fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

impl RecordMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uuid: new_uuid(),
            annotation: None,
            properties: PropertyBag::new(),
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Replaces the whole property bag.
    pub fn set_properties(&mut self, properties: PropertyBag) {
        self.properties = properties;
    }
}

/// Access to the shared record part of a structural metadata type.
pub trait MetadataRecord {
    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn uuid(&self) -> &str {
        &self.meta().uuid
    }
}

/// Map key for names in SQL namespaces, which resolve case-insensitively.
pub fn canonical_key(name: &str) -> String {
    name.to_lowercase()
}
