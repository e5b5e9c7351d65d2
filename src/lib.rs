//! # vdbfold
//!
//! Metadata composition for virtual databases (VDBs). A deployed VDB may
//! import other VDBs; this crate merges the importer's own models, schemas,
//! functions, connectors and resource visibility with those of its imports
//! into a single read-only view used by query-time lookup.
//!
//! ## Core Components
//!
//! * `metadata` - structural records and the schema store
//! * `function` - scoped user-defined function registry and lookup trees
//! * `vdb` - VDB definitions, models and connector registries
//! * `enrichment` - overrides layered on loaded metadata by a repository
//! * `composite` - the composite VDB node and its merged views
//! * `facade` - the unified read-only metadata view
//! * `config` / `logging` - composition settings and logger setup
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use vdbfold::testing::{TestFixtures, NodeBuilder};
//!
//! let child = Arc::new(TestFixtures::node("parts", &["pm2"]).unwrap());
//! let parent = NodeBuilder::new(TestFixtures::vdb("orders", 1, &["pm1"]))
//!     .store(TestFixtures::store(&["pm1"]))
//!     .build()
//!     .unwrap();
//!
//! parent.add_child(child).unwrap();
//! parent.mark_load_finished().unwrap();
//! assert_eq!(parent.merged_view().model_names(), vec!["pm1", "pm2"]);
//! assert!(parent.merged_view().metadata().table("pm2.t").is_some());
//! ```

pub mod composite;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod facade;
pub mod function;
pub mod logging;
pub mod metadata;
pub mod testing;
pub mod vdb;

pub use composite::{CompositeVdb, MergedView};
pub use config::{CompositionConfig, ConfigError};
pub use enrichment::{InMemoryRepository, MetadataEnricher, MetadataRepository, ProviderError};
pub use error::{CollisionError, RecordKind, VdbError, VdbResult};
pub use facade::UnifiedMetadata;
pub use function::{FunctionRegistry, FunctionTree, SYSTEM_SCOPE};
pub use metadata::{Schema, SchemaStore};
pub use vdb::{ConnectorManager, ConnectorRegistry, VdbDefinition, VdbKey};
