use crate::metadata::FunctionMethod;
use indexmap::IndexMap;
use log::debug;
use std::fmt;
use std::sync::Arc;

/// Runtime handle to a configured data-source connection.
///
/// Execution is out of scope here; composition only needs the source name
/// and the functions the source can evaluate.
pub trait ConnectorManager: Send + Sync {
    fn source_name(&self) -> &str;

    /// Functions this source evaluates on the engine's behalf.
    fn push_down_functions(&self) -> Vec<FunctionMethod> {
        Vec::new()
    }
}

/// A connector manager with a fixed list of push-down functions.
#[derive(Debug, Clone)]
pub struct StaticConnectorManager {
    source_name: String,
    translator: String,
    functions: Vec<FunctionMethod>,
}

impl StaticConnectorManager {
    pub fn new(source_name: impl Into<String>, translator: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            translator: translator.into(),
            functions: Vec::new(),
        }
    }

    pub fn with_function(mut self, function: FunctionMethod) -> Self {
        self.functions.push(function);
        self
    }

    pub fn translator(&self) -> &str {
        &self.translator
    }
}

impl ConnectorManager for StaticConnectorManager {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn push_down_functions(&self) -> Vec<FunctionMethod> {
        self.functions.clone()
    }
}

/// Source name to connector manager.
///
/// Treated as immutable once handed to a node; merges build new registries
/// that share the manager handles.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    managers: IndexMap<String, Arc<dyn ConnectorManager>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a manager under its source name, replacing any previous one.
    pub fn add_manager(&mut self, manager: Arc<dyn ConnectorManager>) {
        self.managers.insert(manager.source_name().to_string(), manager);
    }

    pub fn with_manager(mut self, manager: Arc<dyn ConnectorManager>) -> Self {
        self.add_manager(manager);
        self
    }

    /// Copies the entries of `other` that are not registered yet.
    pub fn extend_missing(&mut self, other: &ConnectorRegistry) {
        for (name, manager) in &other.managers {
            if self.managers.contains_key(name) {
                debug!("Connector '{}' already registered, keeping the earlier entry", name);
                continue;
            }
            self.managers.insert(name.clone(), Arc::clone(manager));
        }
    }

    pub fn manager(&self, source_name: &str) -> Option<&Arc<dyn ConnectorManager>> {
        self.managers.get(source_name)
    }

    pub fn managers(&self) -> impl Iterator<Item = &Arc<dyn ConnectorManager>> {
        self.managers.values()
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.managers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("sources", &self.managers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_writer_wins_on_extend() {
        let own: Arc<dyn ConnectorManager> = Arc::new(StaticConnectorManager::new("src", "oracle"));
        let child: Arc<dyn ConnectorManager> = Arc::new(StaticConnectorManager::new("src", "h2"));
        let other: Arc<dyn ConnectorManager> = Arc::new(StaticConnectorManager::new("other", "h2"));

        let mut merged = ConnectorRegistry::new().with_manager(Arc::clone(&own));
        merged.extend_missing(&ConnectorRegistry::new().with_manager(child).with_manager(other));

        assert!(Arc::ptr_eq(merged.manager("src").unwrap(), &own));
        assert_eq!(merged.source_names().collect::<Vec<_>>(), vec!["src", "other"]);
    }
}
