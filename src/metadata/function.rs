use super::record::{MetadataRecord, RecordMeta};
use serde::{Deserialize, Serialize};

/// Where a function may be evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushdownMode {
    /// Evaluated by the engine, may also be pushed to a source
    #[default]
    CanPushdown,
    /// Only evaluable by the engine
    CannotPushdown,
    /// Only evaluable by a source
    MustPushdown,
}

/// A user-defined, schema or push-down function signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionMethod {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub parameter_types: Vec<String>,
    pub return_type: String,
    #[serde(default)]
    pub pushdown: PushdownMode,
    #[serde(default = "default_deterministic")]
    pub deterministic: bool,
    /// Opaque invocation target, compiled by the execution layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation: Option<String>,
}

fn default_deterministic() -> bool {
    true
}

impl FunctionMethod {
    pub fn new(name: impl Into<String>, parameter_types: Vec<String>, return_type: impl Into<String>) -> Self {
        Self {
            meta: RecordMeta::new(name),
            parameter_types,
            return_type: return_type.into(),
            pushdown: PushdownMode::default(),
            deterministic: true,
            invocation: None,
        }
    }

    /// A function that only the named source can evaluate.
    pub fn pushdown(name: impl Into<String>, parameter_types: Vec<String>, return_type: impl Into<String>) -> Self {
        let mut function = Self::new(name, parameter_types, return_type);
        function.pushdown = PushdownMode::MustPushdown;
        function
    }

    /// Identity within a scope: lower-cased name plus parameter types.
    pub fn signature(&self) -> String {
        format!(
            "{}({})",
            self.meta.name.to_lowercase(),
            self.parameter_types
                .iter()
                .map(|t| t.to_lowercase())
                .collect::<Vec<_>>()
                .join(",")
        )
    }

    /// Compares everything but the record uuid.
    ///
    /// Push-down functions are produced fresh by every connector manager, so
    /// two sources of the same type report equivalent functions with
    /// different uuids.
    pub fn same_definition(&self, other: &FunctionMethod) -> bool {
        self.signature() == other.signature()
            && self.return_type.eq_ignore_ascii_case(&other.return_type)
            && self.pushdown == other.pushdown
            && self.deterministic == other.deterministic
            && self.invocation == other.invocation
    }
}

impl MetadataRecord for FunctionMethod {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_ignores_case() {
        let f = FunctionMethod::new("Concat2", vec!["STRING".into(), "string".into()], "string");
        assert_eq!(f.signature(), "concat2(string,string)");
    }

    #[test]
    fn same_definition_ignores_uuid() {
        let a = FunctionMethod::pushdown("md5", vec!["string".into()], "string");
        let b = FunctionMethod::pushdown("MD5", vec!["string".into()], "string");
        assert_ne!(a, b);
        assert!(a.same_definition(&b));

        let c = FunctionMethod::new("md5", vec!["string".into()], "string");
        assert!(!a.same_definition(&c));
    }
}
