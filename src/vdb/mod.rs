//! VDB definitions, models and data-source connectors.

pub mod connector;
pub mod definition;

pub use connector::{ConnectorManager, ConnectorRegistry, StaticConnectorManager};
pub use definition::{ConnectionType, DataPolicy, Model, ModelKind, VdbDefinition, VdbKey, VdbStatus};
