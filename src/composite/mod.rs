//! Composition of a VDB with the VDBs it imports.

mod merge;
pub mod node;
pub mod view;

pub use node::CompositeVdb;
pub use view::MergedView;
