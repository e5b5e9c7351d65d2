//! Structural metadata records and the stores that hold them.

pub mod composite_store;
pub mod function;
pub mod loader;
pub mod procedure;
pub mod record;
pub mod resource;
pub mod schema;
pub mod store;
pub mod table;

pub use composite_store::CompositeStore;
pub use function::{FunctionMethod, PushdownMode};
pub use procedure::{ParameterDirection, Procedure, ProcedureParameter, ResultSet};
pub use record::{MetadataRecord, PropertyBag, RecordMeta};
pub use resource::{Resource, VisibilityMap};
pub use schema::Schema;
pub use store::SchemaStore;
pub use table::{Column, ColumnStats, InsteadOfTrigger, Key, KeyKind, Table, TableStats, TriggerEvent};
