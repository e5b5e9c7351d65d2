use crate::metadata::FunctionMethod;
use indexmap::IndexMap;
use std::sync::Arc;

/// Name-indexed lookup structure over the functions of one scope.
#[derive(Debug, Clone)]
pub struct FunctionTree {
    scope: String,
    by_name: IndexMap<String, Vec<Arc<FunctionMethod>>>,
}

impl FunctionTree {
    pub fn new<I>(scope: impl Into<String>, functions: I) -> Self
    where
        I: IntoIterator<Item = Arc<FunctionMethod>>,
    {
        let mut by_name: IndexMap<String, Vec<Arc<FunctionMethod>>> = IndexMap::new();
        for function in functions {
            by_name
                .entry(function.meta.name.to_lowercase())
                .or_default()
                .push(function);
        }
        Self {
            scope: scope.into(),
            by_name,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// All overloads registered under `name`.
    pub fn find(&self, name: &str) -> &[Arc<FunctionMethod>] {
        self.by_name
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The overload matching `parameter_types` exactly.
    pub fn find_exact(&self, name: &str, parameter_types: &[&str]) -> Option<&Arc<FunctionMethod>> {
        self.find(name).iter().find(|f| {
            f.parameter_types.len() == parameter_types.len()
                && f.parameter_types
                    .iter()
                    .zip(parameter_types)
                    .all(|(a, b)| a.eq_ignore_ascii_case(b))
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &Arc<FunctionMethod>> {
        self.by_name.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
