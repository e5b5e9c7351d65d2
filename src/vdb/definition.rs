use crate::enrichment::MetadataRepository;
use crate::error::{CollisionError, RecordKind, VdbResult};
use crate::metadata::PropertyBag;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a deployed VDB among its siblings.
///
/// Names compare case-insensitively; the original spelling is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VdbKey {
    name: String,
    version: u32,
}

impl VdbKey {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

impl PartialEq for VdbKey {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for VdbKey {}

impl Hash for VdbKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_lowercase().hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for VdbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VdbStatus {
    #[default]
    Loading,
    Active,
    Failed,
    Removed,
}

/// Which VDB versions a client connection may bind to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    None,
    #[default]
    ByVersion,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    /// Backed by one or more data sources
    Physical,
    /// Defined by transformations over other models
    Virtual,
}

/// A named schema-bearing unit of a VDB.
#[derive(Clone, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub kind: ModelKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub source_names: Vec<String>,
    #[serde(default)]
    pub properties: PropertyBag,
    /// Provider that loaded this model's metadata
    #[serde(skip)]
    pub provider: Option<Arc<dyn MetadataRepository>>,
}

fn default_visible() -> bool {
    true
}

impl Model {
    pub fn physical(name: impl Into<String>, source_name: impl Into<String>) -> Self {
        let mut model = Self::new(name, ModelKind::Physical);
        model.source_names.push(source_name.into());
        model
    }

    pub fn virtual_model(name: impl Into<String>) -> Self {
        Self::new(name, ModelKind::Virtual)
    }

    fn new(name: impl Into<String>, kind: ModelKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            visible: true,
            source_names: Vec::new(),
            properties: PropertyBag::new(),
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn MetadataRepository>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn is_physical(&self) -> bool {
        self.kind == ModelKind::Physical
    }

    /// Content equality; providers must be the same instance.
    pub fn same_definition(&self, other: &Model) -> bool {
        let same_provider = match (&self.provider, &other.provider) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        same_provider
            && self.name.eq_ignore_ascii_case(&other.name)
            && self.kind == other.kind
            && self.description == other.description
            && self.visible == other.visible
            && self.source_names == other.source_names
            && self.properties == other.properties
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("visible", &self.visible)
            .field("source_names", &self.source_names)
            .field("has_provider", &self.provider.is_some())
            .finish()
    }
}

/// Authorization unit carried through composition untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPolicy {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Opaque policy body interpreted by the authorization layer
    #[serde(default)]
    pub definition: serde_json::Value,
}

impl DataPolicy {
    pub fn new(name: impl Into<String>, definition: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            definition,
        }
    }
}

/// A deployed VDB: base attributes, models and data policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VdbDefinition {
    pub name: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: VdbStatus,
    #[serde(default)]
    pub connection_type: ConnectionType,
    #[serde(default)]
    pub properties: PropertyBag,
    #[serde(default)]
    models: Vec<Arc<Model>>,
    #[serde(default)]
    data_policies: Vec<Arc<DataPolicy>>,
}

impl VdbDefinition {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            description: None,
            status: VdbStatus::default(),
            connection_type: ConnectionType::default(),
            properties: PropertyBag::new(),
            models: Vec::new(),
            data_policies: Vec::new(),
        }
    }

    /// A definition carrying only the base attributes of this one.
    pub fn shell(&self) -> Self {
        Self {
            name: self.name.clone(),
            version: self.version,
            description: self.description.clone(),
            status: self.status,
            connection_type: self.connection_type,
            properties: self.properties.clone(),
            models: Vec::new(),
            data_policies: Vec::new(),
        }
    }

    pub fn key(&self) -> VdbKey {
        VdbKey::new(self.name.clone(), self.version)
    }

    pub fn with_model(mut self, model: Model) -> VdbResult<Self> {
        self.add_model(Arc::new(model))?;
        Ok(self)
    }

    pub fn with_data_policy(mut self, policy: DataPolicy) -> VdbResult<Self> {
        self.add_data_policy(Arc::new(policy))?;
        Ok(self)
    }

    /// Adds a model; the same or an identical model is kept once.
    pub fn add_model(&mut self, model: Arc<Model>) -> Result<(), CollisionError> {
        match self.model(&model.name) {
            None => {
                self.models.push(model);
                Ok(())
            }
            Some(existing) if Arc::ptr_eq(existing, &model) || existing.same_definition(&model) => Ok(()),
            Some(_) => Err(CollisionError::new(&self.name, RecordKind::Model, &model.name)),
        }
    }

    /// Adds a data policy; the same or an identical policy is kept once.
    pub fn add_data_policy(&mut self, policy: Arc<DataPolicy>) -> Result<(), CollisionError> {
        match self.data_policy(&policy.name) {
            None => {
                self.data_policies.push(policy);
                Ok(())
            }
            Some(existing) if Arc::ptr_eq(existing, &policy) || **existing == *policy => Ok(()),
            Some(_) => Err(CollisionError::new(&self.name, RecordKind::DataPolicy, &policy.name)),
        }
    }

    pub fn model(&self, name: &str) -> Option<&Arc<Model>> {
        self.models.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn models(&self) -> &[Arc<Model>] {
        &self.models
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn data_policy(&self, name: &str) -> Option<&Arc<DataPolicy>> {
        self.data_policies.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn data_policies(&self) -> &[Arc<DataPolicy>] {
        &self.data_policies
    }

    /// Parses a definition, rejecting duplicate model or policy names.
    pub fn from_json(json: &str) -> VdbResult<Self> {
        let parsed: VdbDefinition = serde_json::from_str(json)?;
        let mut vdb = parsed.shell();
        for model in parsed.models {
            vdb.add_model(model)?;
        }
        for policy in parsed.data_policies {
            vdb.add_data_policy(policy)?;
        }
        Ok(vdb)
    }
}
