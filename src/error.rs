use crate::config::ConfigError;
use crate::enrichment::ProviderError;
use std::fmt;
use std::io;

/// Unified error type for VDB composition.
///
/// Each variant represents a category of failure with enough context to
/// report which VDB, schema or record was involved.
#[derive(Debug, thiserror::Error)]
pub enum VdbError {
    /// Two merged sources define the same record identity with conflicting content
    #[error("Structural collision: {0}")]
    Collision(#[from] CollisionError),

    /// The enrichment provider failed while loading a VDB
    #[error("Metadata provider failure for VDB {vdb}: {source}")]
    Provider {
        vdb: String,
        #[source]
        source: ProviderError,
    },

    /// Errors related to IO operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors related to configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// The kind of record involved in a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Model,
    DataPolicy,
    Table,
    Procedure,
    Function,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::DataPolicy => write!(f, "data policy"),
            Self::Table => write!(f, "table"),
            Self::Procedure => write!(f, "procedure"),
            Self::Function => write!(f, "function"),
        }
    }
}

/// A same-kind name collision between two merged sources.
///
/// `scope` is the namespace the collision happened in: a schema name for
/// tables, procedures and schema functions, a function scope for UDFs, or
/// the VDB name for models and data policies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} '{name}' is defined more than once in '{scope}' with conflicting content")]
pub struct CollisionError {
    pub scope: String,
    pub kind: RecordKind,
    pub name: String,
}

impl CollisionError {
    pub fn new(scope: impl Into<String>, kind: RecordKind, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            kind,
            name: name.into(),
        }
    }
}

/// Result type alias for operations that can result in a VdbError
pub type VdbResult<T> = Result<T, VdbError>;
