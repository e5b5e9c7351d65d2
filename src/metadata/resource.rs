use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A VDB resource entry and whether it is exposed to importing VDBs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub path: String,
    pub visible: bool,
    /// Opaque id of the resource content in the large-object store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_ref: Option<String>,
}

impl Resource {
    pub fn new(path: impl Into<String>, visible: bool) -> Self {
        Self {
            path: path.into(),
            visible,
            content_ref: None,
        }
    }

    pub fn with_content_ref(mut self, content_ref: impl Into<String>) -> Self {
        self.content_ref = Some(content_ref.into());
        self
    }
}

/// Resource path to entry, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Resource>", into = "Vec<Resource>")]
pub struct VisibilityMap {
    entries: IndexMap<String, Resource>,
}

impl VisibilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing any entry already at the same path.
    pub fn insert(&mut self, resource: Resource) {
        self.entries.insert(resource.path.clone(), resource);
    }

    /// Copies every entry of `other` in, later entries winning on a shared path.
    pub fn extend_from(&mut self, other: &VisibilityMap) {
        for resource in other.entries.values() {
            self.insert(resource.clone());
        }
    }

    pub fn get(&self, path: &str) -> Option<&Resource> {
        self.entries.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<Resource>> for VisibilityMap {
    fn from(resources: Vec<Resource>) -> Self {
        let mut map = VisibilityMap::new();
        for resource in resources {
            map.insert(resource);
        }
        map
    }
}

impl From<VisibilityMap> for Vec<Resource> {
    fn from(map: VisibilityMap) -> Self {
        map.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_entry_wins_on_shared_path() {
        let mut own = VisibilityMap::new();
        own.insert(Resource::new("/a.ddl", false));
        own.insert(Resource::new("/b.ddl", true));

        let mut child = VisibilityMap::new();
        child.insert(Resource::new("/a.ddl", true).with_content_ref("lob-7"));

        own.extend_from(&child);
        let a = own.get("/a.ddl").unwrap();
        assert!(a.visible);
        assert_eq!(a.content_ref.as_deref(), Some("lob-7"));
        // position of the first insertion is kept
        assert_eq!(own.iter().next().unwrap().path, "/a.ddl");
        assert_eq!(own.len(), 2);
    }
}
