//! Scoped user-defined function registration and lookup.

pub mod registry;
pub mod tree;

pub use registry::FunctionRegistry;
pub use tree::FunctionTree;

/// Scope of built-in functions and of functions pushed down to sources.
pub const SYSTEM_SCOPE: &str = "SYS";
