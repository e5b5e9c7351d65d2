use super::tree::FunctionTree;
use crate::error::{CollisionError, RecordKind};
use crate::metadata::FunctionMethod;
use indexmap::IndexMap;
use log::debug;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct ScopeBucket {
    scope: String,
    functions: IndexMap<String, Arc<FunctionMethod>>,
}

/// User-defined functions grouped by scope.
///
/// A scope is a model or schema name, or the system scope for functions
/// contributed by connectors. A function is identified by its scope, name
/// and parameter types.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    scopes: IndexMap<String, ScopeBucket>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends functions into the bucket of `scope`, creating it if needed.
    ///
    /// A function whose signature is already present with the same
    /// definition is kept once; a different definition under the same
    /// signature is a collision and nothing from this call is added.
    pub fn add_functions<I>(&mut self, scope: &str, functions: I) -> Result<(), CollisionError>
    where
        I: IntoIterator<Item = Arc<FunctionMethod>>,
    {
        let bucket = self
            .scopes
            .entry(scope.to_lowercase())
            .or_insert_with(|| ScopeBucket {
                scope: scope.to_string(),
                functions: IndexMap::new(),
            });

        let mut staged: Vec<(String, Arc<FunctionMethod>)> = Vec::new();
        for function in functions {
            let signature = function.signature();
            let existing = bucket
                .functions
                .get(&signature)
                .or_else(|| staged.iter().find(|(s, _)| *s == signature).map(|(_, f)| f));
            match existing {
                None => staged.push((signature, function)),
                Some(existing) if Arc::ptr_eq(existing, &function) || existing.same_definition(&function) => {
                    debug!("Function {} already registered in scope '{}'", signature, scope);
                }
                Some(_) => {
                    return Err(CollisionError::new(&bucket.scope, RecordKind::Function, signature));
                }
            }
        }
        bucket.functions.extend(staged);
        Ok(())
    }

    /// Adds every scope of `other`, keeping each function's scope.
    pub fn add_registry(&mut self, other: &FunctionRegistry) -> Result<(), CollisionError> {
        for bucket in other.scopes.values() {
            self.add_functions(&bucket.scope, bucket.functions.values().cloned())?;
        }
        Ok(())
    }

    /// Like [`FunctionRegistry::add_registry`], except that in
    /// `shadowed_scope` a signature already registered here wins and the
    /// incoming function is skipped, whatever its content.
    pub fn add_registry_shadowing(&mut self, other: &FunctionRegistry, shadowed_scope: &str) -> Result<(), CollisionError> {
        let shadowed_key = shadowed_scope.to_lowercase();
        for (key, bucket) in &other.scopes {
            if *key != shadowed_key {
                self.add_functions(&bucket.scope, bucket.functions.values().cloned())?;
                continue;
            }
            let target = self
                .scopes
                .entry(shadowed_key.clone())
                .or_insert_with(|| ScopeBucket {
                    scope: bucket.scope.clone(),
                    functions: IndexMap::new(),
                });
            for (signature, function) in &bucket.functions {
                if target.functions.contains_key(signature) {
                    debug!("Function {} already registered in scope '{}', keeping the earlier one", signature, target.scope);
                    continue;
                }
                target.functions.insert(signature.clone(), Arc::clone(function));
            }
        }
        Ok(())
    }

    /// Scope names in registration order, empty scopes included.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scopes.values().map(|b| b.scope.as_str())
    }

    pub fn functions(&self, scope: &str) -> impl Iterator<Item = &Arc<FunctionMethod>> {
        self.scopes
            .get(&scope.to_lowercase())
            .into_iter()
            .flat_map(|b| b.functions.values())
    }

    pub fn function_count(&self) -> usize {
        self.scopes.values().map(|b| b.functions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.function_count() == 0
    }

    /// One lookup tree per scope that holds at least one function.
    pub fn build_trees(&self) -> Vec<FunctionTree> {
        self.scopes
            .values()
            .filter(|b| !b.functions.is_empty())
            .map(|b| FunctionTree::new(b.scope.clone(), b.functions.values().cloned()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: &str, return_type: &str) -> Arc<FunctionMethod> {
        Arc::new(FunctionMethod::new(name, vec!["string".into()], return_type))
    }

    #[test]
    fn empty_scopes_get_no_tree() {
        let mut registry = FunctionRegistry::new();
        registry.add_functions("empty", Vec::new()).unwrap();
        registry.add_functions("udf", vec![function("f", "string")]).unwrap();

        assert_eq!(registry.scopes().collect::<Vec<_>>(), vec!["empty", "udf"]);
        let trees = registry.build_trees();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].scope(), "udf");
    }

    #[test]
    fn conflicting_signature_adds_nothing() {
        let mut registry = FunctionRegistry::new();
        registry.add_functions("udf", vec![function("f", "string")]).unwrap();
        let err = registry
            .add_functions("udf", vec![function("g", "string"), function("F", "integer")])
            .unwrap_err();
        assert_eq!(err.kind, RecordKind::Function);
        assert_eq!(registry.function_count(), 1);
    }

    #[test]
    fn same_signature_in_other_scope_is_distinct() {
        let mut registry = FunctionRegistry::new();
        registry.add_functions("a", vec![function("f", "string")]).unwrap();
        registry.add_functions("b", vec![function("f", "integer")]).unwrap();
        assert_eq!(registry.function_count(), 2);
    }

    #[test]
    fn shadowed_scope_keeps_first_definition() {
        let mut parent = FunctionRegistry::new();
        parent.add_functions("SYS", vec![function("trunc", "date")]).unwrap();
        let mut child = FunctionRegistry::new();
        child
            .add_functions("sys", vec![function("trunc", "timestamp"), function("round", "integer")])
            .unwrap();
        child.add_functions("udf", vec![function("f", "string")]).unwrap();

        parent.add_registry_shadowing(&child, "SYS").unwrap();
        let sys: Vec<_> = parent.functions("sys").collect();
        assert_eq!(sys.len(), 2);
        assert_eq!(sys[0].return_type, "date");
        assert_eq!(parent.functions("udf").count(), 1);
    }

    #[test]
    fn shadowing_keeps_other_scopes_strict() {
        let mut parent = FunctionRegistry::new();
        parent.add_functions("udf", vec![function("f", "string")]).unwrap();
        let mut child = FunctionRegistry::new();
        child.add_functions("udf", vec![function("f", "integer")]).unwrap();
        assert!(parent.add_registry_shadowing(&child, "SYS").is_err());
    }

    #[test]
    fn add_registry_keeps_scopes() {
        let mut child = FunctionRegistry::new();
        child.add_functions("child_udf", vec![function("f", "string")]).unwrap();
        let mut parent = FunctionRegistry::new();
        parent.add_functions("udf", vec![function("g", "string")]).unwrap();
        parent.add_registry(&child).unwrap();

        assert_eq!(parent.functions("CHILD_UDF").count(), 1);
        assert_eq!(parent.functions("udf").count(), 1);
    }
}
